//! Reaping of background children.
//!
//! Background children are not tracked in the interpreter's memory. The kernel's
//! process table is the set of running jobs, and `waitpid(-1, WNOHANG)` discovers
//! whichever of them have terminated.

use crate::command::Outcome;
use crate::env::Environment;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::io;
use tracing::{debug, warn};

/// Collects every child that has terminated since the last call, without blocking.
///
/// Each one is reported as `Background pid N is done: <outcome>`. The last foreground
/// outcome is left untouched. Returns the reaped children in the order the kernel
/// reported them.
pub fn reap_terminated(env: &mut Environment) -> io::Result<Vec<(Pid, Outcome)>> {
    let mut reaped = Vec::new();
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                if let Some((pid, outcome)) = Outcome::from_wait_status(status) {
                    debug!(%pid, %outcome, "reaped background child");
                    env.report(format_args!("Background pid {pid} is done: {outcome}"))?;
                    reaped.push((pid, outcome));
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => break,
            Err(errno) => {
                warn!("waitpid failed while reaping: {errno}");
                break;
            }
        }
    }
    Ok(reaped)
}

//! Signal dispositions of the interpreter and the foreground-only mode toggle.
//!
//! The interpreter ignores `SIGINT` so an interrupt meant for a foreground child never
//! kills the shell, and catches `SIGTSTP` to flip foreground-only mode. The handler runs
//! at arbitrary points, so the mode lives in a single [`AtomicBool`] and the notice is
//! written with a raw `write(2)`.

use crate::error::ShellError;
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

pub const ENTER_FOREGROUND_ONLY: &str = "\nEntering foreground-only mode (& is now ignored)\n";
pub const EXIT_FOREGROUND_ONLY: &str = "\nExiting foreground-only mode\n";

/// Whether a trailing `&` is currently ignored.
pub fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

/// Flips foreground-only mode, writes the matching notice to standard output and returns
/// the new mode. Safe to call from a signal handler.
pub fn toggle_foreground_only() -> bool {
    let was_on = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    let notice = if was_on {
        EXIT_FOREGROUND_ONLY
    } else {
        ENTER_FOREGROUND_ONLY
    };
    write_raw(libc::STDOUT_FILENO, &[notice.as_bytes()]);
    !was_on
}

extern "C" fn on_suspend(_: libc::c_int) {
    // The interrupted code may be about to read errno.
    let saved = Errno::last_raw();
    toggle_foreground_only();
    Errno::set_raw(saved);
}

/// Installs the interpreter's handlers: `SIGINT` ignored, `SIGTSTP` toggles
/// foreground-only mode. All other signals keep their default behavior.
pub fn install() -> Result<(), ShellError> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // No SA_RESTART: a blocked read or wait returns EINTR and the caller retries.
    let suspend = SigAction::new(
        SigHandler::Handler(on_suspend),
        SaFlags::empty(),
        SigSet::all(),
    );

    for (signal, action) in [(Signal::SIGINT, &ignore), (Signal::SIGTSTP, &suspend)] {
        // SAFETY: `on_suspend` only touches an atomic and calls write(2).
        unsafe { sigaction(signal, action) }
            .map_err(|source| ShellError::Signal { signal, source })?;
    }
    Ok(())
}

/// Sets the dispositions a freshly forked child needs before `execvp`.
///
/// Foreground children get the default `SIGINT` back so the user can interrupt them.
/// Every child ignores `SIGTSTP`; the shell cannot resume a stopped child.
pub(crate) fn reset_for_child(foreground: bool) {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: installing SIG_DFL/SIG_IGN runs no code of ours.
    unsafe {
        if foreground {
            let _ = sigaction(Signal::SIGINT, &default);
        }
        let _ = sigaction(Signal::SIGTSTP, &ignore);
    }
}

/// Writes every part to `fd`, retrying on partial writes and `EINTR`.
///
/// Only calls write(2), so it may run in a signal handler or between `fork` and `exec`.
pub(crate) fn write_raw(fd: RawFd, parts: &[&[u8]]) {
    for part in parts {
        let mut rest = *part;
        while !rest.is_empty() {
            // SAFETY: `rest` is a live, initialized byte slice.
            let written = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
            if written < 0 {
                if Errno::last() == Errno::EINTR {
                    continue;
                }
                return;
            }
            rest = &rest[written as usize..];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_handler_preserves_errno() {
        Errno::set_raw(libc::EAGAIN);
        on_suspend(libc::SIGTSTP);
        on_suspend(libc::SIGTSTP);
        assert_eq!(Errno::last(), Errno::EAGAIN);
        assert!(!foreground_only());
    }
}

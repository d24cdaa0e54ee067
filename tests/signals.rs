//! Signal dispositions driven by real signal deliveries.
//!
//! Kept in its own test binary: installing the handlers changes process-wide signal
//! dispositions. Tests hold `SERIAL` because they flip the global mode, point standard
//! output elsewhere and reap with `waitpid(-1)`.

use jobshell::command::{Flow, Outcome};
use jobshell::io_adapters::MemWriter;
use jobshell::{Interpreter, signal};
use nix::libc;
use nix::sys::signal::{Signal, raise};
use nix::unistd::{close, dup, dup2};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Delivers `SIGTSTP` with standard output pointed at a scratch file and returns the
/// notice the handler wrote.
fn suspend_notice() -> String {
    let mut capture = tempfile::tempfile().unwrap();
    let saved = dup(libc::STDOUT_FILENO).unwrap();
    dup2(capture.as_raw_fd(), libc::STDOUT_FILENO).unwrap();
    let raised = raise(Signal::SIGTSTP);
    dup2(saved, libc::STDOUT_FILENO).unwrap();
    close(saved).unwrap();
    raised.unwrap();

    let mut text = String::new();
    capture.seek(SeekFrom::Start(0)).unwrap();
    capture.read_to_string(&mut text).unwrap();
    text
}

fn interrupting_script(dir: &tempfile::TempDir) -> String {
    let script = dir.path().join("interrupt.sh");
    fs::write(&script, "kill -INT $$\nexit 7\n").unwrap();
    script.to_str().unwrap().to_owned()
}

#[test]
fn suspend_signal_toggles_foreground_only_mode() {
    let _guard = serial();
    signal::install().unwrap();
    assert!(!signal::foreground_only());

    let (out, buf) = MemWriter::with_handle();
    let mut sh = Interpreter::with_output(Box::new(out));
    assert!(sh.parse("sleep 1 &").unwrap().background);

    assert_eq!(suspend_notice(), signal::ENTER_FOREGROUND_ONLY);
    assert!(signal::foreground_only());

    let command = sh.parse("true &").unwrap();
    assert!(!command.background);
    assert_eq!(command.arguments, vec!["true"]);
    sh.execute_line("false &").unwrap();
    assert_eq!(sh.last_foreground(), Outcome::Exited(1));
    assert_eq!(buf.borrow().as_slice(), b"");

    assert_eq!(suspend_notice(), signal::EXIT_FOREGROUND_ONLY);
    assert!(!signal::foreground_only());
    assert!(sh.parse("true &").unwrap().background);

    // SIGINT is ignored by the interpreter itself.
    raise(Signal::SIGINT).unwrap();
    assert_eq!(sh.execute_line("exit").unwrap(), Flow::Exit);
}

#[test]
fn foreground_child_can_be_interrupted() {
    let _guard = serial();
    signal::install().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let script = interrupting_script(&dir);
    let (out, buf) = MemWriter::with_handle();
    let mut sh = Interpreter::with_output(Box::new(out));

    sh.execute_line(&format!("sh {script}")).unwrap();

    assert_eq!(sh.last_foreground(), Outcome::Signaled(2));
    assert_eq!(buf.borrow().as_slice(), b"terminated by signal 2\n");
}

#[test]
fn background_child_keeps_ignoring_interrupts() {
    let _guard = serial();
    signal::install().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let script = interrupting_script(&dir);
    let (out, buf) = MemWriter::with_handle();
    let mut sh = Interpreter::with_output(Box::new(out));

    sh.execute_line(&format!("sh {script} &")).unwrap();
    let notice = String::from_utf8(buf.borrow().clone()).unwrap();
    let pid: i32 = notice
        .trim_end()
        .strip_prefix("background pid is ")
        .unwrap()
        .parse()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let outcome = loop {
        let reaped = sh.reap().unwrap();
        if let Some((_, outcome)) = reaped.into_iter().find(|(p, _)| p.as_raw() == pid) {
            break outcome;
        }
        assert!(Instant::now() < deadline, "background pid {pid} never finished");
        thread::sleep(Duration::from_millis(20));
    };
    assert_eq!(outcome, Outcome::Exited(7));
    assert_eq!(sh.last_foreground(), Outcome::Exited(0));
}

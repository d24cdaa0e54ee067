use crate::command::Outcome;
use nix::unistd::{Pid, getpid};
use std::env as stdenv;
use std::fmt::Display;
use std::io::{self, Write};

/// State owned by one interpreter and threaded through every command it runs.
///
/// The environment contains:
/// - `shell_pid`: the interpreter's own process id, substituted for `$$`.
/// - `last_foreground`: outcome of the most recent foreground child, read by `status`.
/// - an output sink that receives every notice the shell prints.
///
/// The foreground-only flag lives in [`crate::signal`] instead.
pub struct Environment {
    shell_pid: Pid,
    /// Outcome of the last foreground child. Background children never change it.
    pub last_foreground: Outcome,
    out: Box<dyn Write>,
}

impl Environment {
    /// Capture the current process id and report to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Same as [`Environment::new`], but notices go to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            shell_pid: getpid(),
            last_foreground: Outcome::default(),
            out,
        }
    }

    pub fn shell_pid(&self) -> Pid {
        self.shell_pid
    }

    /// Get the value of a process environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        stdenv::var(key).ok()
    }

    /// Write one line of output and flush it.
    pub fn report(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    /// Write `text` without a newline and flush it.
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::command::Outcome;
    use crate::env::Environment;
    use crate::io_adapters::MemWriter;

    #[test]
    fn test_env_reports_are_line_terminated() {
        let (out, buf) = MemWriter::with_handle();
        let mut env = Environment::with_output(Box::new(out));

        env.report("background pid is 7").unwrap();
        env.report(Outcome::Signaled(2)).unwrap();

        assert_eq!(
            String::from_utf8(buf.borrow().clone()).unwrap(),
            "background pid is 7\nterminated by signal 2\n"
        );
    }

    #[test]
    fn test_env_starts_with_clean_status() {
        let env = Environment::new();
        assert_eq!(env.last_foreground, Outcome::Exited(0));
        assert_eq!(env.shell_pid().as_raw() as u32, std::process::id());
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }
}

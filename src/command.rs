use crate::env::Environment;
use crate::parser::Builtin;
use anyhow::Result;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::fmt;

/// Conventional process exit code type used by this crate.
pub type ExitCode = i32;

/// How a child process ended.
///
/// Rendered the same way wherever it is reported: by `status`, by the immediate
/// notice for a signaled foreground child and by the background reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The child called `exit` with this code.
    Exited(ExitCode),
    /// The child was killed by this signal number.
    Signaled(i32),
}

impl Outcome {
    /// Extract the terminated child and its outcome from a wait status.
    ///
    /// Returns `None` for statuses that are not a termination (stopped, continued,
    /// still alive).
    pub fn from_wait_status(status: WaitStatus) -> Option<(Pid, Self)> {
        match status {
            WaitStatus::Exited(pid, code) => Some((pid, Outcome::Exited(code))),
            WaitStatus::Signaled(pid, signal, _) => Some((pid, Outcome::Signaled(signal as i32))),
            _ => None,
        }
    }
}

impl Default for Outcome {
    /// Before any foreground command has run, `status` reports a clean exit.
    fn default() -> Self {
        Outcome::Exited(0)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Exited(code) => write!(f, "exit value {code}"),
            Outcome::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Whether the interpreter loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// `exit` was invoked; the caller must stop reading input.
    Exit,
}

/// One parsed input line.
///
/// Built by [`crate::parser::parse_line`] and consumed by a single execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Program or builtin name followed by its arguments, after `$$` expansion and with
    /// any trailing `&` removed. Never empty.
    pub arguments: Vec<String>,
    /// The unmodified line the arguments came from.
    pub raw_line: String,
    /// Run without waiting. Only ever true when foreground-only mode was off.
    pub background: bool,
    /// Set when `arguments[0]` names a builtin.
    pub builtin: Option<Builtin>,
}

impl Command {
    /// Program or builtin name.
    pub fn name(&self) -> &str {
        &self.arguments[0]
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// An `Err` is fatal to the interpreter; recoverable failures are reported through
    /// `env` and end in `Ok(Flow::Continue)`.
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Flow>;
}

/// Factory that tries to create an executable command from a parsed [`Command`].
///
/// Returns `None` when the factory doesn't recognize the command.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided command line.
    fn try_create(&self, env: &Environment, command: &Command)
    -> Option<Box<dyn ExecutableCommand>>;
}

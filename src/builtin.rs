use crate::command::{Command, CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::parser::Builtin;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Which builtin this type implements.
    const KIND: Builtin;

    /// Executes the command against the interpreter's environment.
    fn execute(self, env: &mut Environment) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Flow> {
        match T::execute(*self, env) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                env.report(format_args!("{e:#}"))?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Usage text or an argument error produced by argh.
struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Flow> {
        env.print(&self.output)?;
        Ok(Flow::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>> {
        if command.builtin != Some(T::KIND) {
            return None;
        }
        let args: Vec<&str> = command.arguments[1..].iter().map(String::as_str).collect();
        Some(match T::from_args(&[T::KIND.name()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { mut output, .. }) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
                Box::new(InvalidArgs { output })
            }
        })
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; only the first one is used. Defaults to $HOME when omitted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    const KIND: Builtin = Builtin::Cd;

    fn execute(self, env: &mut Environment) -> Result<Flow> {
        let target = match self.targets.into_iter().next() {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(env.get_var("HOME").ok_or(ShellError::NoHome)?),
        };

        env::set_current_dir(&target)
            .map_err(|source| ShellError::ChangeDir { path: target, source })?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the exit value or terminating signal of the last foreground command.
pub struct Status {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Status {
    const KIND: Builtin = Builtin::Status;

    fn execute(self, env: &mut Environment) -> Result<Flow> {
        let outcome = env.last_foreground;
        env.report(outcome)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Exit the shell. Background commands keep running.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    const KIND: Builtin = Builtin::Exit;

    fn execute(self, _env: &mut Environment) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}

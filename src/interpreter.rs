use crate::command::{Command, CommandFactory, Flow, Outcome};
use crate::config::Config;
use crate::env::Environment;
use crate::io_adapters::{Input, LineSource};
use crate::{jobs, parser, signal};
use nix::unistd::Pid;
use std::io::Write;
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate: BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A job-control interpreter that runs builtins in-process and everything else as child
/// processes.
///
/// The interpreter owns an [`Environment`] and a list of [`CommandFactory`] objects that
/// are queried, in order, to turn a parsed [`Command`] into something executable. See
/// [`Default`] for the factories included out of the box.
///
/// Example
/// ```no_run
/// use jobshell::Interpreter;
/// use jobshell::command::Flow;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute_line("echo hello $$").unwrap(), Flow::Continue);
/// assert_eq!(sh.execute_line("exit").unwrap(), Flow::Exit);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>, env: Environment) -> Self {
        Self { env, commands }
    }

    /// Default factories, reporting to `out` instead of standard output.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::new(default_factories(), Environment::with_output(out))
    }

    /// Outcome of the most recent foreground command.
    pub fn last_foreground(&self) -> Outcome {
        self.env.last_foreground
    }

    /// Parse a raw line using the current foreground-only mode.
    pub fn parse(&self, raw_line: &str) -> Option<Command> {
        let pid = self.env.shell_pid().to_string();
        parser::parse_line(raw_line, &pid, signal::foreground_only())
    }

    /// Run one parsed command.
    ///
    /// Returns [`Flow::Exit`] when the command was `exit`. An error means the
    /// interpreter cannot go on (no child process could be created).
    pub fn execute(&mut self, command: Command) -> anyhow::Result<Flow> {
        debug!(line = %command.raw_line, background = command.background, "executing");
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, &command) {
                return cmd.execute(&mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", command.name()))
    }

    /// Parse and run one line. Lines with nothing to run are a no-op.
    pub fn execute_line(&mut self, raw_line: &str) -> anyhow::Result<Flow> {
        match self.parse(raw_line) {
            Some(command) => self.execute(command),
            None => Ok(Flow::Continue),
        }
    }

    /// Report and collect background children that have terminated.
    pub fn reap(&mut self) -> anyhow::Result<Vec<(Pid, Outcome)>> {
        Ok(jobs::reap_terminated(&mut self.env)?)
    }

    /// Read-Eval-Print Loop.
    ///
    /// Every cycle first reaps finished background children, then prompts. Blank lines,
    /// comments and over-long lines are skipped. Returns when `exit` runs or input ends.
    pub fn repl(&mut self, source: &mut dyn LineSource, config: &Config) -> anyhow::Result<()> {
        loop {
            self.reap()?;
            let line = match source.next_line(&config.prompt)? {
                Input::Line(line) => line,
                Input::Interrupted => continue,
                Input::EndOfInput => break,
            };

            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if line.chars().count() > config.max_line {
                self.env.report(format_args!(
                    "line too long (limit is {} characters)",
                    config.max_line
                ))?;
                continue;
            }
            let Some(command) = self.parse(&line) else {
                continue;
            };
            if command.arguments.len() > config.max_args {
                self.env.report(format_args!(
                    "too many arguments (limit is {})",
                    config.max_args
                ))?;
                continue;
            }

            if self.execute(command)? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }
}

fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Status>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `cd`, `status`
    /// - external command launcher
    fn default() -> Self {
        Self::new(default_factories(), Environment::new())
    }
}

use crate::command::{Command, CommandFactory, ExecutableCommand, Flow, Outcome};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::redirect::{OpenedRedirect, PreparedRedirect, plan_redirections};
use crate::signal;
use anyhow::Result;
use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::ffi::CString;
use tracing::{debug, warn};

/// Command that is not a builtin.
pub struct ExternalCommand {
    arguments: Vec<String>,
    background: bool,
}

impl ExternalCommand {
    pub fn new(arguments: Vec<String>, background: bool) -> Self {
        Self {
            arguments,
            background,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        command: &Command,
    ) -> Option<Box<dyn ExecutableCommand>> {
        if command.builtin.is_some() {
            return None;
        }
        Some(Box::new(ExternalCommand::new(
            command.arguments.clone(),
            command.background,
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Flow> {
        let setup = match ChildSetup::prepare(&self.arguments, self.background) {
            Ok(setup) => setup,
            Err(e) => {
                env.report(e)?;
                return Ok(Flow::Continue);
            }
        };

        // Nothing buffered may be duplicated into the child.
        env.flush()?;
        match setup.spawn()? {
            Spawned::Background(pid) => {
                debug!(%pid, "started background child");
                env.report(format_args!("background pid is {pid}"))?;
            }
            Spawned::Foreground(pid) => {
                debug!(%pid, "waiting for foreground child");
                match wait_for(pid) {
                    Ok(outcome) => {
                        env.last_foreground = outcome;
                        if let Outcome::Signaled(_) = outcome {
                            env.report(outcome)?;
                        }
                    }
                    Err(e) => {
                        warn!(%pid, "lost foreground child: {e}");
                        env.report(e)?;
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }
}

/// A child that was started successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawned {
    /// The caller must wait for it before reading more input.
    Foreground(Pid),
    /// Left running; reaped later by [`crate::jobs::reap_terminated`].
    Background(Pid),
}

/// Everything a forked child does before it becomes the requested program.
///
/// Built in the parent so that the child only needs async-signal-safe calls: reset
/// signal dispositions, open and bind redirections, `execvp`. Every failure in the
/// child is reported on its standard error and ends the child, never the interpreter.
#[derive(Debug)]
pub struct ChildSetup {
    program: CString,
    argv: Vec<CString>,
    redirects: Vec<PreparedRedirect>,
    background: bool,
}

/// A failure between `fork` and a successful `execvp`.
enum ChildFailure<'a> {
    Open(&'a PreparedRedirect, Errno),
    Bind(&'a str),
    Exec(Errno),
}

impl ChildSetup {
    /// Plans redirections for `arguments` and converts everything to C strings.
    pub fn prepare(arguments: &[String], background: bool) -> Result<Self, ShellError> {
        let plan = plan_redirections(arguments, background)?;
        let redirects = plan.prepare()?;
        let argv = plan
            .arguments
            .iter()
            .map(|arg| CString::new(arg.as_str()).map_err(|_| ShellError::NulByte(arg.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let program = argv.first().cloned().ok_or(ShellError::NoProgram)?;
        Ok(Self {
            program,
            argv,
            redirects,
            background,
        })
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }

    pub fn redirects(&self) -> &[PreparedRedirect] {
        &self.redirects
    }

    /// Forks and runs the setup in the child.
    ///
    /// Fork failure is the only error; it means no process can be created at all.
    pub fn spawn(&self) -> Result<Spawned, ShellError> {
        // SAFETY: the child only performs async-signal-safe calls on data prepared
        // before the fork, then execs or exits.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) if self.background => Ok(Spawned::Background(child)),
            Ok(ForkResult::Parent { child }) => Ok(Spawned::Foreground(child)),
            Ok(ForkResult::Child) => self.run_child(),
            Err(errno) => Err(ShellError::Fork(errno)),
        }
    }

    fn run_child(&self) -> ! {
        signal::reset_for_child(!self.background);
        let code = match self.exec() {
            Ok(never) => match never {},
            Err(failure) => failure.report(self),
        };
        // SAFETY: `_exit` skips atexit handlers and stdio buffers the child shares
        // with the interpreter.
        unsafe { libc::_exit(code) }
    }

    fn exec(&self) -> Result<std::convert::Infallible, ChildFailure<'_>> {
        // Open every file in line order before binding, so a bad file name is reported
        // on the terminal even when another stream is already redirected. A later file
        // for the same stream replaces the earlier one.
        let mut opened: [Option<OpenedRedirect>; 2] = [None, None];
        for redirect in &self.redirects {
            let file = redirect
                .open()
                .map_err(|errno| ChildFailure::Open(redirect, errno))?;
            if let Some(replaced) = opened[redirect.stream().index()].replace(file) {
                replaced.discard();
            }
        }
        for redirect in opened.into_iter().flatten() {
            let stream = redirect.stream();
            redirect
                .bind()
                .map_err(|_| ChildFailure::Bind(stream.bind_failure()))?;
        }
        execvp(&self.program, &self.argv).map_err(ChildFailure::Exec)
    }
}

impl ChildFailure<'_> {
    /// Prints the diagnostic and returns the child's exit status.
    fn report(&self, setup: &ChildSetup) -> i32 {
        let stderr = libc::STDERR_FILENO;
        match self {
            ChildFailure::Open(redirect, errno) => {
                signal::write_raw(
                    stderr,
                    &[
                        redirect.path().to_bytes(),
                        b": ",
                        errno.desc().as_bytes(),
                        b"\n",
                    ],
                );
                1
            }
            ChildFailure::Bind(message) => {
                signal::write_raw(stderr, &[message.as_bytes(), b"\n"]);
                2
            }
            ChildFailure::Exec(errno) => {
                signal::write_raw(
                    stderr,
                    &[
                        setup.program.to_bytes(),
                        b": ",
                        errno.desc().as_bytes(),
                        b"\n",
                    ],
                );
                1
            }
        }
    }
}

/// Blocks until `pid` terminates, retrying when a signal interrupts the wait.
pub fn wait_for(pid: Pid) -> Result<Outcome, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some((_, outcome)) = Outcome::from_wait_status(status) {
                    debug!(%pid, %outcome, "foreground child finished");
                    return Ok(outcome);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ShellError::Wait(errno)),
        }
    }
}

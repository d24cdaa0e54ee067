//! Standard stream redirection for child processes.
//!
//! Planning happens in the interpreter: [`plan_redirections`] finds the `<` and `>`
//! operators, decides where each stream goes and strips the redirection syntax from the
//! program's arguments. Binding happens in the forked child through
//! [`PreparedRedirect::open`] and [`OpenedRedirect::bind`], which only make
//! async-signal-safe calls.

use crate::error::ShellError;
use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::libc;
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};
use std::ffi::{CStr, CString};
use std::os::fd::RawFd;

pub const INPUT_OPERATOR: &str = "<";
pub const OUTPUT_OPERATOR: &str = ">";
/// Where unredirected streams of background commands go.
pub const NULL_DEVICE: &str = "/dev/null";

/// One of the two standard streams a command can redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Input,
    Output,
}

impl Stream {
    fn fileno(self) -> RawFd {
        match self {
            Stream::Input => libc::STDIN_FILENO,
            Stream::Output => libc::STDOUT_FILENO,
        }
    }

    /// Position of the stream in per-stream tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Stream::Input => 0,
            Stream::Output => 1,
        }
    }

    /// Diagnostic printed when `dup2` fails for this stream.
    pub fn bind_failure(self) -> &'static str {
        match self {
            Stream::Input => "cannot redirect input",
            Stream::Output => "cannot redirect output",
        }
    }
}

/// Where a redirected stream is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A file named on the command line.
    File(String),
    /// The null device, substituted for background commands.
    NullDevice,
}

impl Target {
    fn path(&self) -> &str {
        match self {
            Target::File(name) => name,
            Target::NullDevice => NULL_DEVICE,
        }
    }
}

/// One redirection: `stream` is connected to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub stream: Stream,
    pub target: Target,
}

/// Result of redirection planning for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPlan {
    /// Every redirection in the order its file is opened: the line's operators left to
    /// right, then the null device defaults of a background command.
    pub redirects: Vec<Redirect>,
    /// Arguments handed to the program.
    pub arguments: Vec<String>,
}

/// Inspects `arguments` for `< file` and `> file`.
///
/// Either, both or neither may appear, in any order. Every operator is kept, so each
/// named file is opened (and an output file truncated) even when a later operator for
/// the same stream takes its place. Everything from the first redirection operator on
/// is dropped from the program's arguments. A background command gets the null device
/// for every stream it did not redirect itself.
pub fn plan_redirections(
    arguments: &[String],
    background: bool,
) -> Result<RedirectPlan, ShellError> {
    let mut redirects = Vec::new();
    let mut first_operator = None;

    let mut i = 0;
    while i < arguments.len() {
        let operator = arguments[i].as_str();
        let stream = match operator {
            INPUT_OPERATOR => Stream::Input,
            OUTPUT_OPERATOR => Stream::Output,
            _ => {
                i += 1;
                continue;
            }
        };
        let name = arguments
            .get(i + 1)
            .ok_or_else(|| ShellError::MissingRedirectTarget {
                operator: operator.to_owned(),
            })?;
        redirects.push(Redirect {
            stream,
            target: Target::File(name.clone()),
        });
        first_operator.get_or_insert(i);
        i += 2;
    }

    if background {
        for stream in [Stream::Input, Stream::Output] {
            if !redirects.iter().any(|r| r.stream == stream) {
                redirects.push(Redirect {
                    stream,
                    target: Target::NullDevice,
                });
            }
        }
    }

    let end = first_operator.unwrap_or(arguments.len());
    Ok(RedirectPlan {
        redirects,
        arguments: arguments[..end].to_vec(),
    })
}

impl RedirectPlan {
    /// Where `stream` ends up: its last redirection, or `None` when it is inherited.
    pub fn target(&self, stream: Stream) -> Option<&Target> {
        self.redirects
            .iter()
            .rev()
            .find(|r| r.stream == stream)
            .map(|r| &r.target)
    }

    /// Converts the plan into the form a forked child can apply without allocating.
    pub fn prepare(&self) -> Result<Vec<PreparedRedirect>, ShellError> {
        self.redirects
            .iter()
            .map(|Redirect { stream, target }| {
                let path = CString::new(target.path())
                    .map_err(|_| ShellError::NulByte(target.path().to_owned()))?;
                Ok(PreparedRedirect {
                    stream: *stream,
                    path,
                    null_device: *target == Target::NullDevice,
                })
            })
            .collect()
    }
}

/// A redirection ready to be opened in the child.
#[derive(Debug)]
pub struct PreparedRedirect {
    stream: Stream,
    path: CString,
    null_device: bool,
}

/// An opened redirection target, not yet bound to its stream.
#[derive(Debug)]
pub struct OpenedRedirect {
    stream: Stream,
    fd: RawFd,
}

impl PreparedRedirect {
    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn path(&self) -> &CStr {
        &self.path
    }

    /// Opens the target: read-only for input, created and truncated with mode 0644 for
    /// output. The null device is never created or truncated.
    pub fn open(&self) -> Result<OpenedRedirect, Errno> {
        let (flags, mode) = match (self.stream, self.null_device) {
            (Stream::Input, _) => (OFlag::O_RDONLY, Mode::empty()),
            (Stream::Output, true) => (OFlag::O_RDWR, Mode::empty()),
            (Stream::Output, false) => (
                OFlag::O_RDWR | OFlag::O_CREAT | OFlag::O_TRUNC,
                Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            ),
        };
        let fd = open(self.path.as_c_str(), flags, mode)?;
        Ok(OpenedRedirect {
            stream: self.stream,
            fd,
        })
    }
}

impl OpenedRedirect {
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Makes the opened file the child's standard stream and closes the original
    /// descriptor.
    pub fn bind(self) -> Result<(), Errno> {
        let target = self.stream.fileno();
        if self.fd != target {
            dup2(self.fd, target)?;
            let _ = close(self.fd);
        }
        Ok(())
    }

    /// Closes a target that a later redirection of the same stream replaced.
    pub fn discard(self) {
        let _ = close(self.fd);
    }
}

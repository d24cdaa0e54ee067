use nix::errno::Errno;
use nix::sys::signal::Signal;
use std::io;
use std::path::PathBuf;

/// Errors raised in the interpreter process itself.
///
/// Failures inside a forked child never become a `ShellError`: the child reports them
/// and exits, and the parent only sees an ordinary exit status.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// No child could be created. Fatal to the interpreter.
    #[error("fork: {0}")]
    Fork(#[source] Errno),

    #[error("cd: {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cd: HOME not set")]
    NoHome,

    /// A `<` or `>` was the last token, with no file name after it.
    #[error("{operator}: missing file name")]
    MissingRedirectTarget { operator: String },

    /// The line held redirections but no program name.
    #[error("missing command before redirection")]
    NoProgram,

    /// A token cannot be passed to `execvp`.
    #[error("{0}: argument contains a NUL byte")]
    NulByte(String),

    #[error("waitpid: {0}")]
    Wait(#[source] Errno),

    #[error("cannot install handler for {signal:?}: {source}")]
    Signal {
        signal: Signal,
        #[source]
        source: Errno,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

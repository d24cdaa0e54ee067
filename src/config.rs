use argh::FromArgs;

/// Default prompt printed before each line of input.
pub const DEFAULT_PROMPT: &str = ": ";
/// Longest input line accepted, in characters.
pub const DEFAULT_MAX_LINE: usize = 2048;
/// Most arguments accepted in one command.
pub const DEFAULT_MAX_ARGS: usize = 512;

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A small job-control shell.
///
/// Set JOBSHELL_LOG (e.g. JOBSHELL_LOG=debug) to log to standard error.
pub struct Config {
    #[argh(option, default = "DEFAULT_PROMPT.to_owned()")]
    /// prompt printed before each line of input.
    pub prompt: String,

    #[argh(switch)]
    /// read plain lines from standard input instead of using the line editor.
    pub plain: bool,

    #[argh(option, default = "DEFAULT_MAX_LINE")]
    /// longest accepted input line, in characters.
    pub max_line: usize,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// most arguments accepted in one command.
    pub max_args: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            plain: false,
            max_line: DEFAULT_MAX_LINE,
            max_args: DEFAULT_MAX_ARGS,
        }
    }
}

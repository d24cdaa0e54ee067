//! Turns a raw input line into a [`Command`]: tokenization, `$$` expansion, builtin
//! recognition and foreground/background resolution.

use crate::command::Command;
use crate::lexer;
use tracing::trace;

/// Final token requesting background execution.
pub const BACKGROUND_OPERATOR: &str = "&";

/// Commands handled inside the interpreter process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Terminate the interpreter.
    Exit,
    /// Change the interpreter's working directory.
    Cd,
    /// Report the last foreground outcome.
    Status,
}

impl Builtin {
    /// Recognize a builtin by its program name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::Cd => "cd",
            Builtin::Status => "status",
        }
    }
}

/// Result of mode resolution for one token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub builtin: Option<Builtin>,
    pub background: bool,
    /// Input tokens without the trailing background operator.
    pub arguments: Vec<String>,
}

/// Decide builtin vs external and foreground vs background.
///
/// A trailing `&` is always removed. It only selects background execution when
/// `foreground_only` is false.
pub fn resolve(mut arguments: Vec<String>, foreground_only: bool) -> Resolved {
    let mut background = false;
    if arguments.last().is_some_and(|last| last == BACKGROUND_OPERATOR) {
        arguments.pop();
        background = !foreground_only;
    }

    let builtin = arguments.first().and_then(|name| Builtin::from_name(name));
    Resolved {
        builtin,
        background,
        arguments,
    }
}

/// Parses one input line into a [`Command`].
///
/// `pid` replaces every `$$`. Returns `None` when nothing is left to run, e.g. a blank
/// line or a lone `&`.
pub fn parse_line(raw_line: &str, pid: &str, foreground_only: bool) -> Option<Command> {
    let tokens = lexer::tokenize(raw_line, pid);
    let Resolved {
        builtin,
        background,
        arguments,
    } = resolve(tokens, foreground_only);
    if arguments.is_empty() {
        return None;
    }

    trace!(?arguments, background, ?builtin, "parsed line");
    Some(Command {
        arguments,
        raw_line: raw_line.to_owned(),
        background,
        builtin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(line: &str) -> Vec<String> {
        lexer::split_into_tokens(line)
    }

    #[test]
    fn trailing_ampersand_requests_background() {
        let resolved = resolve(words("sleep 5 &"), false);
        assert!(resolved.background);
        assert_eq!(resolved.arguments, words("sleep 5"));
        assert_eq!(resolved.builtin, None);
    }

    #[test]
    fn foreground_only_drops_ampersand_silently() {
        let resolved = resolve(words("sleep 5 &"), true);
        assert!(!resolved.background);
        assert_eq!(resolved.arguments, words("sleep 5"));
    }

    #[test]
    fn ampersand_not_in_last_position_is_an_argument() {
        let resolved = resolve(words("echo & done"), false);
        assert!(!resolved.background);
        assert_eq!(resolved.arguments, words("echo & done"));
    }

    #[test]
    fn ampersand_glued_to_a_word_is_an_argument() {
        let resolved = resolve(words("echo hi&"), false);
        assert!(!resolved.background);
        assert_eq!(resolved.arguments, words("echo hi&"));
    }

    #[test]
    fn recognizes_exactly_three_builtins() {
        assert_eq!(resolve(words("exit"), false).builtin, Some(Builtin::Exit));
        assert_eq!(resolve(words("cd /tmp"), false).builtin, Some(Builtin::Cd));
        assert_eq!(resolve(words("status &"), false).builtin, Some(Builtin::Status));
        assert_eq!(resolve(words("pwd"), false).builtin, None);
        assert_eq!(resolve(words("Exit"), false).builtin, None);
        for builtin in [Builtin::Exit, Builtin::Cd, Builtin::Status] {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
    }

    #[test]
    fn parse_line_expands_and_keeps_raw_line() {
        let command = parse_line("echo hi$$there", "4321", false).unwrap();
        assert_eq!(command.arguments, vec!["echo", "hi4321there"]);
        assert_eq!(command.raw_line, "echo hi$$there");
        assert!(!command.background);
        assert_eq!(command.name(), "echo");
    }

    #[test]
    fn lone_ampersand_is_nothing_to_run() {
        assert_eq!(parse_line("&", "1", false), None);
        assert_eq!(parse_line("   ", "1", false), None);
    }
}

//! A module implementing tokenization and `$$` expansion of a raw input line.

use std::borrow::Cow;

/// Two-character marker replaced by the shell's process id.
pub const PID_MARKER: &str = "$$";

/// Splits the input line into argument tokens on runs of whitespace.
///
/// Quoting and escaping are not recognized; every non-whitespace run is one token.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

/// Replaces every `$$` in `token` with `pid`.
///
/// Markers are matched left to right without overlap, so a run of `2k` dollar signs
/// yields `k` copies of `pid` and an odd trailing `$` is kept as-is. The token is
/// borrowed unchanged when it holds no marker.
pub fn expand_marker<'a>(token: &'a str, pid: &str) -> Cow<'a, str> {
    let markers = token.matches(PID_MARKER).count();
    if markers == 0 {
        return Cow::Borrowed(token);
    }

    let mut expanded =
        String::with_capacity(token.len() - markers * PID_MARKER.len() + markers * pid.len());
    let mut rest = token;
    while let Some(at) = rest.find(PID_MARKER) {
        expanded.push_str(&rest[..at]);
        expanded.push_str(pid);
        rest = &rest[at + PID_MARKER.len()..];
    }
    expanded.push_str(rest);
    Cow::Owned(expanded)
}

/// Splits `line` into tokens and expands `$$` in each of them.
pub fn tokenize(line: &str, pid: &str) -> Vec<String> {
    split_into_tokens(line)
        .iter()
        .map(|token| expand_marker(token, pid).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(
            split_into_tokens("  ls   -la\t/tmp  "),
            vec!["ls", "-la", "/tmp"]
        );
        assert!(split_into_tokens("   ").is_empty());
    }

    #[test]
    fn expands_marker_inside_token() {
        assert_eq!(
            tokenize("echo hi$$there", "4321"),
            vec!["echo", "hi4321there"]
        );
    }

    #[test]
    fn expands_marker_at_end_of_token() {
        assert_eq!(expand_marker("file.$$", "77"), "file.77");
        assert_eq!(expand_marker("$$", "77"), "77");
    }

    #[test]
    fn dollar_runs_expand_pairwise() {
        assert_eq!(expand_marker("$$$$", "12"), "1212");
        assert_eq!(expand_marker("$$$", "12"), "12$");
        assert_eq!(expand_marker("a$$b$$c", "12"), "a12b12c");
        assert_eq!(expand_marker("$", "12"), "$");
    }

    #[test]
    fn replacement_longer_than_marker_is_not_truncated() {
        let pid = "4194304";
        let expanded = expand_marker("x$$y$$z", pid);
        assert_eq!(expanded, format!("x{pid}y{pid}z"));
    }

    #[test]
    fn tokens_without_marker_are_borrowed() {
        assert!(matches!(expand_marker("plain", "1"), Cow::Borrowed("plain")));
    }

    #[test]
    fn expansion_is_idempotent_once_no_marker_remains() {
        let once = expand_marker("tmp.$$.log", "999").into_owned();
        let twice = expand_marker(&once, "999");
        assert_eq!(twice, once);
    }

    #[test]
    fn expansion_keeps_token_count() {
        let line = "cmd $$ a$$ $$b plain";
        assert_eq!(
            tokenize(line, "5").len(),
            split_into_tokens(line).len()
        );
    }
}

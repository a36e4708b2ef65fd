//! Block location inside a sequence of lines

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel line that closes a brace-style block when no `}` line is used
pub const END_OF_BLOCK: &str = "%ENDBLOCK";

/// How the end of a block is recognized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "line")]
pub enum Termination {
    /// First line that is exactly `}` or [`END_OF_BLOCK`]
    Brace,
    /// First blank line
    Blank,
    /// First line equal to the given text (after trimming)
    Until(String),
}

impl Termination {
    fn closes(&self, trimmed: &str) -> bool {
        match self {
            Termination::Brace => trimmed == "}" || trimmed == END_OF_BLOCK,
            Termination::Blank => trimmed.is_empty(),
            Termination::Until(alt) => trimmed == alt.trim(),
        }
    }
}

/// Find the first line containing `marker`
///
/// Matching is a case-insensitive substring test on the trimmed line.
pub fn locate_line<S: AsRef<str>>(lines: &[S], marker: &str) -> Option<usize> {
    let needle = marker.trim().to_lowercase();
    lines
        .iter()
        .position(|line| line.as_ref().trim().to_lowercase().contains(&needle))
}

/// Locate a block as a closed line range `(start, end)`
///
/// `start` is the first line containing `marker`, `end` the first line at or
/// after `start` that satisfies `policy`. Returns `None` when the marker is
/// missing or the block is never closed.
pub fn locate<S: AsRef<str>>(lines: &[S], marker: &str, policy: &Termination) -> Option<(usize, usize)> {
    let start = locate_line(lines, marker)?;
    let end = lines[start..]
        .iter()
        .position(|line| policy.closes(line.as_ref().trim()))?;
    Some((start, start + end))
}

/// Locate a block that must exist
pub fn require<S: AsRef<str>>(lines: &[S], marker: &str, policy: &Termination) -> Result<(usize, usize)> {
    locate(lines, marker, policy).ok_or_else(|| Error::block_not_found(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Vec<&'static str> {
        vec![
            "\\documentclass{article}\n",
            "\\newcommand{\\Title}{\n",
            "    Report\n",
            "}\n",
            "% Margins\n",
            "\\setlength{\\a}{1cm}\n",
            "\n",
            "\\begin{document}\n",
        ]
    }

    #[test]
    fn test_locate_brace() {
        assert_eq!(locate(&doc(), "\\newcommand{\\Title}", &Termination::Brace), Some((1, 3)));
    }

    #[test]
    fn test_locate_blank() {
        assert_eq!(locate(&doc(), "% margins", &Termination::Blank), Some((4, 6)));
    }

    #[test]
    fn test_locate_alt_terminator() {
        let lines = vec!["\\iftrue\n", "x\n", "  \\fi  \n", "}\n"];
        assert_eq!(
            locate(&lines, "\\IFTRUE", &Termination::Until("\\fi".into())),
            Some((0, 2))
        );
    }

    #[test]
    fn test_locate_sentinel() {
        let lines = vec!["% BEGIN tables\n", "a\n", "%ENDBLOCK\n"];
        assert_eq!(locate(&lines, "begin tables", &Termination::Brace), Some((0, 2)));
    }

    #[test]
    fn test_locate_missing_marker() {
        assert_eq!(locate(&doc(), "\\nothere", &Termination::Brace), None);
    }

    #[test]
    fn test_locate_unterminated() {
        let lines = vec!["\\def\\x{\n", "value\n"];
        assert_eq!(locate(&lines, "\\def", &Termination::Brace), None);
        assert_eq!(locate(&lines, "\\def", &Termination::Blank), None);
    }

    #[test]
    fn test_terminator_may_be_marker_line() {
        let lines = vec!["a\n", "   \n"];
        assert_eq!(locate(&lines, "", &Termination::Blank), Some((0, 1)));
        let lines = vec!["% end\n", "}\n"];
        assert_eq!(locate(&lines, "}", &Termination::Brace), Some((1, 1)));
    }

    #[test]
    fn test_require_reports_marker() {
        match require(&doc(), "\\missing", &Termination::Brace) {
            Err(Error::BlockNotFound { marker }) => assert_eq!(marker, "\\missing"),
            other => panic!("Expected Error::BlockNotFound, got {:?}", other),
        }
    }
}

//! Licence header discovery and version stamping

use serde::{Deserialize, Serialize};

use crate::lines::{LineStore, split_terminator};
use crate::locate::locate_line;

fn default_license_marker() -> String {
    "License:".to_string()
}

fn default_offset() -> usize {
    3
}

fn default_version_marker() -> String {
    "Version".to_string()
}

/// How the header banner of a source file is found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Text identifying the licence line of the banner
    #[serde(default = "default_license_marker")]
    pub license_marker: String,
    /// Header length counted from the licence line
    #[serde(default = "default_offset")]
    pub offset: usize,
    /// Text identifying the version-stamp line inside the header
    #[serde(default = "default_version_marker")]
    pub version_marker: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            license_marker: default_license_marker(),
            offset: default_offset(),
            version_marker: default_version_marker(),
        }
    }
}

impl HeaderConfig {
    /// Number of header lines, or 0 when the file carries no licence banner
    pub fn size(&self, lines: &[String]) -> usize {
        locate_line(lines, &self.license_marker)
            .map(|at| (at + self.offset).min(lines.len()))
            .unwrap_or(0)
    }

    /// Index of the version-stamp line within the header
    pub fn version_line(&self, lines: &[String]) -> Option<usize> {
        let size = self.size(lines);
        locate_line(&lines[..size], &self.version_marker)
    }

    /// Rewrite the version-stamp line as `<label>: <version> (<date>)`
    ///
    /// Everything up to the first `:` is kept; without a `:` the whole line
    /// body is treated as the label. Returns `false` when the file has no
    /// version line.
    pub fn stamp_version(&self, store: &mut LineStore, version: &str, date: &str) -> bool {
        let Some(at) = self.version_line(store.lines()) else {
            return false;
        };

        let mut lines = std::mem::take(store).into_lines();
        let (body, terminator) = split_terminator(&lines[at]);
        let label = match body.find(':') {
            Some(colon) => &body[..colon],
            None => body.trim_end(),
        };
        let stamped = format!("{}: {} ({}){}", label, version, date, terminator);
        lines[at] = stamped;
        store.set_lines(lines);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "\
% ==========================
% Report template
% Version: 0.9.0 (2025-01-01)
% License: MIT
%   Copyright (c) authors
% ==========================
\\documentclass{article}
";

    #[test]
    fn test_header_size_from_license_line() {
        let store = LineStore::parse(BANNER);
        let cfg = HeaderConfig::default();
        assert_eq!(cfg.size(store.lines()), 6);
    }

    #[test]
    fn test_header_size_without_banner() {
        let store = LineStore::parse("\\documentclass{article}\n");
        assert_eq!(HeaderConfig::default().size(store.lines()), 0);
    }

    #[test]
    fn test_header_size_clamped() {
        let store = LineStore::parse("% License: MIT\n");
        assert_eq!(HeaderConfig::default().size(store.lines()), 1);
    }

    #[test]
    fn test_stamp_version() {
        let mut store = LineStore::parse(BANNER);
        let cfg = HeaderConfig::default();

        assert_eq!(cfg.version_line(store.lines()), Some(2));
        assert!(cfg.stamp_version(&mut store, "1.0.1", "2026-10-18"));
        assert_eq!(store.lines()[2], "% Version: 1.0.1 (2026-10-18)\n");
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn test_version_outside_header_is_ignored() {
        let mut store = LineStore::parse("% License: MIT\n%\n%\n% Version: 1\n");
        let cfg = HeaderConfig::default();
        assert_eq!(cfg.version_line(store.lines()), None);
        assert!(!cfg.stamp_version(&mut store, "2", "today"));
    }
}

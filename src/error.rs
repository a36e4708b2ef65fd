//! Error types for texsplice

use std::path::PathBuf;

/// Result type for texsplice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, composing or exporting templates
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Block not found: {marker}")]
    BlockNotFound { marker: String },

    #[error("Stale block range {start}..={end}: store changed (expected {expected}, got {actual})")]
    StaleRange {
        start: usize,
        end: usize,
        expected: String,
        actual: String,
    },

    #[error("Line range {start}..{end} out of bounds (store length: {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Line edits overlap at lines {first:?} and {second:?}")]
    OverlappingEdits {
        first: (usize, usize),
        second: (usize, usize),
    },

    #[error("Deleting block '{marker}' did not remove any line")]
    NoProgress { marker: String },

    #[error("Invalid argument index {index}: arguments are numbered from 1")]
    InvalidArgumentIndex { index: usize },

    #[error("Argument {index} not found, line has {found} argument(s): {line}")]
    ArgumentNotFound {
        index: usize,
        found: usize,
        line: String,
    },

    #[error("Malformed line, unbalanced '{close}' at byte {position}: {line}")]
    MalformedLine {
        line: String,
        close: char,
        position: usize,
    },

    #[error("Missing source file: {name}")]
    MissingSourceFile { name: String },

    #[error("Cyclic inclusion: {}", chain.join(" -> "))]
    CyclicInclusion { chain: Vec<String> },

    #[error("Invalid version token '{token}': {reason}")]
    InvalidVersion { token: String, reason: String },

    #[error("Version {candidate} does not succeed {previous}")]
    VersionOrderViolation { candidate: String, previous: String },

    #[error("Invalid release manifest: {0}")]
    Manifest(String),

    #[error("Typesetter failed: {0}")]
    Typesetter(String),

    #[error("Invalid UTF-8 in file: {}", path.display())]
    InvalidUtf8 { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn block_not_found(marker: impl Into<String>) -> Self {
        Self::BlockNotFound {
            marker: marker.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingSourceFile { name: name.into() }
    }
}

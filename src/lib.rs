// Error types
pub mod error;

// Line stores and file I/O
pub mod lines;

// Block location
pub mod locate;

// Block editing
pub mod edit;

// Macro argument rewriting
pub mod args;

// Per-line directives and nested include markers
pub mod directive;

// Header banner and version stamp
pub mod header;

// Named line stores of one export
pub mod table;

// Include flattening
pub mod compose;

// Version tokens
pub mod version;

// Release manifests and their transforms
pub mod manifest;
pub mod transform;

// External typesetter
pub mod typeset;

// JSON output and statistics log
pub mod json;

// Export pipeline
pub mod export;

// Log subscriber setup
pub mod logging;

// Re-exports
pub use error::{Error, Result};
pub use lines::{LineStore, read_lines, write_lines};
pub use locate::{END_OF_BLOCK, Termination, locate, locate_line};
pub use edit::{
    BatchOutcome, BlockRange, InsertAt, LineEdit,
    delete, extract, insert, replace, find_and_replace, find_and_delete_recursive,
    sort_edits_descending,
};
pub use args::{Segment, replace_argument, replace_argument_with, segments};
pub use directive::{Directive, DirectiveSet, Include, IncludeParams, parse_include, parse_line};
pub use header::HeaderConfig;
pub use table::FileTable;
pub use compose::{ComposeOptions, ComposeSettings, Composer, StripMode};
pub use version::{DevTag, Version, build_hash, ensure_newer, validate};
pub use manifest::{OutputSpec, Release};
pub use transform::Transform;
pub use typeset::{CommandTypesetter, Typesetter, TypesetterConfig};
pub use json::{ExportResponse, StatsEntry, StatsLog, generate_export_id};
pub use export::{ExportReport, ExportRequest, export};

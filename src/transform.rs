//! Declarative block edits a release applies to the base template

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::args;
use crate::edit::{InsertAt, find_and_delete_recursive};
use crate::error::{Error, Result};
use crate::locate::{Termination, locate_line};
use crate::table::FileTable;

fn brace() -> Termination {
    Termination::Brace
}

/// Give every line a terminator
pub fn terminated(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| if l.ends_with('\n') { l.clone() } else { format!("{}\n", l) })
        .collect()
}

/// One edit step of a release
///
/// Each step locates its block against the file as left by the previous
/// step, so steps can be written in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    /// Remove the first block opened by `marker`
    DeleteBlock {
        file: String,
        marker: String,
        #[serde(default = "brace")]
        until: Termination,
        /// Absence of the block is not an error
        #[serde(default)]
        optional: bool,
    },
    /// Remove every block opened by `marker`
    DeleteAll {
        file: String,
        marker: String,
        #[serde(default = "brace")]
        until: Termination,
    },
    /// Replace a block with literal lines
    ReplaceBlock {
        file: String,
        marker: String,
        #[serde(default = "brace")]
        until: Termination,
        lines: Vec<String>,
    },
    /// Replace the block opened by `marker` in `to` with the same block in `from`
    CopyBlock {
        from: String,
        to: String,
        marker: String,
        #[serde(default = "brace")]
        until: Termination,
    },
    /// Insert literal lines before `at`, or before the last line
    InsertLines {
        file: String,
        lines: Vec<String>,
        #[serde(default)]
        at: Option<usize>,
        #[serde(default)]
        blank_first: bool,
    },
    /// Replace the `index`-th argument on the first line containing `marker`
    ReplaceArgument {
        file: String,
        marker: String,
        index: usize,
        value: String,
    },
}

impl Transform {
    /// File this step modifies
    pub fn target(&self) -> &str {
        match self {
            Transform::DeleteBlock { file, .. }
            | Transform::DeleteAll { file, .. }
            | Transform::ReplaceBlock { file, .. }
            | Transform::InsertLines { file, .. }
            | Transform::ReplaceArgument { file, .. } => file,
            Transform::CopyBlock { to, .. } => to,
        }
    }

    /// Apply this step to the table
    pub fn apply(&self, table: &mut FileTable) -> Result<()> {
        match self {
            Transform::DeleteBlock {
                file,
                marker,
                until,
                optional,
            } => {
                let store = table.require_mut(file)?;
                match store.locate_block(marker, until) {
                    Some(range) => {
                        let removed = store.delete_block(range)?;
                        debug!(file = %file, marker = %marker, lines = removed.len(), "deleted block");
                    }
                    None if *optional => debug!(file = %file, marker = %marker, "optional block absent"),
                    None => return Err(Error::block_not_found(marker)),
                }
            }
            Transform::DeleteAll { file, marker, until } => {
                let store = table.require_mut(file)?;
                let (kept, removed) = find_and_delete_recursive(store.lines(), marker, until)?;
                store.set_lines(kept);
                debug!(file = %file, marker = %marker, removed, "deleted all blocks");
            }
            Transform::ReplaceBlock {
                file,
                marker,
                until,
                lines,
            } => {
                let store = table.require_mut(file)?;
                let range = store.require_block(marker, until)?;
                store.replace_block(range, &terminated(lines))?;
            }
            Transform::CopyBlock {
                from,
                to,
                marker,
                until,
            } => {
                let source = table.require(from)?;
                let block = source.extract_block(source.require_block(marker, until)?)?;
                let target = table.require_mut(to)?;
                let range = target.require_block(marker, until)?;
                target.replace_block(range, block.lines())?;
                debug!(from = %from, to = %to, marker = %marker, lines = block.len(), "copied block");
            }
            Transform::InsertLines {
                file,
                lines,
                at,
                blank_first,
            } => {
                let store = table.require_mut(file)?;
                let at = at.map_or(InsertAt::End, InsertAt::Index);
                store.insert_lines(&terminated(lines), at, *blank_first);
            }
            Transform::ReplaceArgument {
                file,
                marker,
                index,
                value,
            } => {
                let store = table.require_mut(file)?;
                let at = locate_line(store.lines(), marker).ok_or_else(|| Error::block_not_found(marker))?;
                let rewritten = args::replace_argument(&store.lines()[at], *index, value)?;
                let mut lines = std::mem::take(store).into_lines();
                lines[at] = rewritten;
                store.set_lines(lines);
            }
        }
        Ok(())
    }
}

/// Apply steps in order, stopping at the first failure
pub fn apply_all(transforms: &[Transform], table: &mut FileTable) -> Result<usize> {
    for (i, transform) in transforms.iter().enumerate() {
        transform.apply(table).inspect_err(|e| {
            warn!(step = i, file = transform.target(), error = %e, "transform failed");
        })?;
    }
    info!(steps = transforms.len(), "applied transforms");
    Ok(transforms.len())
}

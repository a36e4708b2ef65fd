//! Line-range editing primitives
//!
//! The free functions are pure: they take a line slice and return a new
//! vector, leaving the input untouched. Indices are only meaningful against the
//! exact sequence they were computed from; after any delete or insert, ranges
//! located earlier point at the wrong lines. [`BlockRange`] and
//! [`LineStore::apply_edits`] exist to make that mistake hard to commit.

use tracing::debug;

use crate::error::{Error, Result};
use crate::lines::LineStore;
use crate::locate::{self, Termination};

/// Where [`insert`] places new lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    /// Immediately before the given index (clamped to the end)
    Index(usize),
    /// Immediately before the last line, keeping a trailing footer line last
    End,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Closed-interval sublist `[a, b]`
///
/// `b` is clamped to the last line; an empty vector is returned when `a > b`
/// or `a` is past the end.
pub fn extract(lines: &[String], a: usize, b: usize) -> Vec<String> {
    if a > b || a >= lines.len() {
        return Vec::new();
    }
    let b = b.min(lines.len() - 1);
    lines[a..=b].to_vec()
}

/// Remove the closed interval `[a, b]`
///
/// Malformed ranges (`a > b`, or any bound past the end) leave the sequence
/// unchanged.
pub fn delete(lines: &[String], a: usize, b: usize) -> Vec<String> {
    if a > b || b >= lines.len() {
        return lines.to_vec();
    }
    let mut out = Vec::with_capacity(lines.len() - (b - a + 1));
    out.extend_from_slice(&lines[..a]);
    out.extend_from_slice(&lines[b + 1..]);
    out
}

/// Splice `new_lines` into `lines`
///
/// With `blank_first`, a blank line is inserted ahead of the new lines unless
/// the line preceding the insertion point is already blank.
pub fn insert(lines: &[String], new_lines: &[String], at: InsertAt, blank_first: bool) -> Vec<String> {
    let pos = match at {
        InsertAt::Index(i) => i.min(lines.len()),
        InsertAt::End => lines.len().saturating_sub(1),
    };

    let mut out = Vec::with_capacity(lines.len() + new_lines.len() + 1);
    out.extend_from_slice(&lines[..pos]);
    if blank_first && !(pos > 0 && is_blank(&lines[pos - 1])) {
        out.push("\n".to_string());
    }
    out.extend_from_slice(new_lines);
    out.extend_from_slice(&lines[pos..]);
    out
}

/// Replace `[a, b]` with `new_lines`, which start at index `a`
pub fn replace(lines: &[String], new_lines: &[String], a: usize, b: usize) -> Vec<String> {
    insert(&delete(lines, a, b), new_lines, InsertAt::Index(a), false)
}

/// Locate the block opened by `marker` and replace it
pub fn find_and_replace(
    lines: &[String],
    marker: &str,
    new_lines: &[String],
    policy: &Termination,
) -> Result<Vec<String>> {
    let (a, b) = locate::require(lines, marker, policy)?;
    debug!(marker, start = a, end = b, "replacing block");
    Ok(replace(lines, new_lines, a, b))
}

/// Delete every block opened by `marker`
///
/// Returns the new sequence and the number of blocks removed. Each pass
/// relocates against the sequence left by the previous deletion.
pub fn find_and_delete_recursive(
    lines: &[String],
    marker: &str,
    policy: &Termination,
) -> Result<(Vec<String>, usize)> {
    let mut current = lines.to_vec();
    let mut removed = 0;

    while let Some((a, b)) = locate::locate(&current, marker, policy) {
        let next = delete(&current, a, b);
        if next.len() >= current.len() {
            return Err(Error::NoProgress {
                marker: marker.to_string(),
            });
        }
        current = next;
        removed += 1;
    }

    debug!(marker, removed, "deleted blocks");
    Ok((current, removed))
}

/// A located block bound to the snapshot it was found in
///
/// Neither `Clone` nor `Copy`: each range is handed to exactly one editing
/// method, which checks the store checksum before touching any line.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockRange {
    start: usize,
    end: usize,
    checksum: String,
}

impl BlockRange {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of lines covered, markers included
    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// A line-level edit against one snapshot
///
/// `start` is inclusive and `end` exclusive; `start == end` inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: Vec<String>,
}

impl LineEdit {
    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            replacement: Vec::new(),
        }
    }

    pub fn insert(at: usize, lines: Vec<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: lines,
        }
    }

    pub fn replace(start: usize, end: usize, lines: Vec<String>) -> Self {
        Self {
            start,
            end,
            replacement: lines,
        }
    }

    /// Change in line count once applied
    pub fn line_shift(&self) -> i64 {
        self.replacement.len() as i64 - (self.end - self.start) as i64
    }
}

/// Result of applying a batch of line edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of edits applied
    pub applied: usize,
    /// Total change in line count
    pub line_shift: i64,
    /// Checksum of the store after the batch
    pub checksum: String,
}

/// Sort edits bottom-up so applying one never moves the lines of the next
///
/// Ties keep their relative order.
pub fn sort_edits_descending(edits: &[LineEdit]) -> Vec<LineEdit> {
    let mut sorted = edits.to_vec();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));
    sorted
}

impl LineStore {
    fn verify(&self, range: &BlockRange) -> Result<()> {
        let actual = self.checksum();
        if actual != range.checksum {
            return Err(Error::StaleRange {
                start: range.start,
                end: range.end,
                expected: range.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Locate a block and bind the result to this snapshot
    pub fn locate_block(&self, marker: &str, policy: &Termination) -> Option<BlockRange> {
        locate::locate(self.lines(), marker, policy).map(|(start, end)| BlockRange {
            start,
            end,
            checksum: self.checksum(),
        })
    }

    /// Locate a block that must exist
    pub fn require_block(&self, marker: &str, policy: &Termination) -> Result<BlockRange> {
        self.locate_block(marker, policy)
            .ok_or_else(|| Error::block_not_found(marker))
    }

    /// Copy the block's lines out of the store
    pub fn extract_block(&self, range: BlockRange) -> Result<LineStore> {
        self.verify(&range)?;
        Ok(LineStore::from_lines(extract(self.lines(), range.start, range.end)))
    }

    /// Remove the block, returning the removed lines
    pub fn delete_block(&mut self, range: BlockRange) -> Result<LineStore> {
        self.verify(&range)?;
        let removed = extract(self.lines(), range.start, range.end);
        let kept = delete(self.lines(), range.start, range.end);
        self.set_lines(kept);
        Ok(LineStore::from_lines(removed))
    }

    /// Replace the block with new lines
    pub fn replace_block(&mut self, range: BlockRange, new_lines: &[String]) -> Result<()> {
        self.verify(&range)?;
        let next = replace(self.lines(), new_lines, range.start, range.end);
        self.set_lines(next);
        Ok(())
    }

    /// Insert lines; invalidates every range located before the call
    pub fn insert_lines(&mut self, new_lines: &[String], at: InsertAt, blank_first: bool) {
        let next = insert(self.lines(), new_lines, at, blank_first);
        self.set_lines(next);
    }

    /// Apply several edits computed against the same snapshot
    ///
    /// The store must still match `expected_checksum`. Edits are applied from
    /// the highest start downward, so every range refers to the original
    /// snapshot. Overlapping edits, or two edits starting on the same line, are
    /// rejected before anything changes.
    pub fn apply_edits(&mut self, expected_checksum: &str, edits: &[LineEdit]) -> Result<BatchOutcome> {
        let actual = self.checksum();
        if actual != expected_checksum {
            return Err(Error::StaleRange {
                start: edits.iter().map(|e| e.start).min().unwrap_or(0),
                end: edits.iter().map(|e| e.end).max().unwrap_or(0),
                expected: expected_checksum.to_string(),
                actual,
            });
        }

        let sorted = sort_edits_descending(edits);
        for edit in &sorted {
            if edit.start > edit.end || edit.end > self.len() {
                return Err(Error::RangeOutOfBounds {
                    start: edit.start,
                    end: edit.end,
                    len: self.len(),
                });
            }
        }
        for pair in sorted.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if lower.end > upper.start || lower.start == upper.start {
                return Err(Error::OverlappingEdits {
                    first: (lower.start, lower.end),
                    second: (upper.start, upper.end),
                });
            }
        }

        let mut lines = std::mem::take(self).into_lines();
        let mut line_shift = 0i64;
        for edit in &sorted {
            let _removed: Vec<String> = lines
                .splice(edit.start..edit.end, edit.replacement.iter().cloned())
                .collect();
            line_shift += edit.line_shift();
        }
        self.set_lines(lines);

        debug!(applied = sorted.len(), line_shift, "applied line edits");
        Ok(BatchOutcome {
            applied: sorted.len(),
            line_shift,
            checksum: self.checksum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_closed_interval() {
        let l = lines(&["a\n", "b\n", "c\n", "d\n"]);
        assert_eq!(extract(&l, 1, 2), lines(&["b\n", "c\n"]));
        assert_eq!(extract(&l, 2, 99), lines(&["c\n", "d\n"]));
        assert!(extract(&l, 3, 1).is_empty());
    }

    #[test]
    fn test_delete_and_malformed_ranges() {
        let l = lines(&["a\n", "b\n", "c\n"]);
        assert_eq!(delete(&l, 0, 1), lines(&["c\n"]));
        assert_eq!(delete(&l, 2, 1), l);
        assert_eq!(delete(&l, 1, 3), l);
    }

    #[test]
    fn test_insert_at_end_keeps_footer_last() {
        let l = lines(&["\\begin{document}\n", "body\n", "\\end{document}\n"]);
        let out = insert(&l, &lines(&["extra\n"]), InsertAt::End, true);
        assert_eq!(
            out,
            lines(&["\\begin{document}\n", "body\n", "\n", "extra\n", "\\end{document}\n"])
        );
    }

    #[test]
    fn test_insert_blank_first_skips_existing_blank() {
        let l = lines(&["a\n", "\n", "footer\n"]);
        let out = insert(&l, &lines(&["x\n"]), InsertAt::End, true);
        assert_eq!(out, lines(&["a\n", "\n", "x\n", "footer\n"]));
    }

    #[test]
    fn test_insert_index_clamped() {
        let l = lines(&["a\n"]);
        assert_eq!(insert(&l, &lines(&["b\n"]), InsertAt::Index(9), false), lines(&["a\n", "b\n"]));
        assert_eq!(insert(&[], &lines(&["b\n"]), InsertAt::End, false), lines(&["b\n"]));
    }

    #[test]
    fn test_replace() {
        let l = lines(&["a\n", "\\x{\n", "1\n", "}\n", "z\n"]);
        assert_eq!(replace(&l, &lines(&["\\x{2}\n"]), 1, 3), lines(&["a\n", "\\x{2}\n", "z\n"]));
    }

    #[test]
    fn test_find_and_replace_block() {
        let l = lines(&["\\begin{document}\n", "\\Abstract{\n", "  old\n", "}\n", "\\end{document}\n"]);
        let out = find_and_replace(&l, "\\abstract", &lines(&["\\Abstract{new}\n"]), &Termination::Brace).unwrap();
        assert_eq!(
            out,
            lines(&["\\begin{document}\n", "\\Abstract{new}\n", "\\end{document}\n"])
        );
    }

    #[test]
    fn test_find_and_replace_missing_block() {
        let l = lines(&["a\n"]);
        assert!(matches!(
            find_and_replace(&l, "\\nope", &[], &Termination::Brace),
            Err(Error::BlockNotFound { .. })
        ));
    }

    #[test]
    fn test_find_and_delete_recursive() {
        let l = lines(&[
            "% TODO block\n",
            "x\n",
            "\n",
            "keep\n",
            "% todo block\n",
            "y\n",
            "\n",
            "end\n",
        ]);
        let (out, removed) = find_and_delete_recursive(&l, "% TODO", &Termination::Blank).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(out, lines(&["keep\n", "end\n"]));
    }

    #[test]
    fn test_find_and_delete_recursive_absent_is_done() {
        let l = lines(&["a\n"]);
        let (out, removed) = find_and_delete_recursive(&l, "missing", &Termination::Blank).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(out, l);
    }

    #[test]
    fn test_block_range_consumed_once() {
        let mut store = LineStore::parse("a\n\\b{\n1\n}\nc\n");
        let range = store.require_block("\\b{", &Termination::Brace).unwrap();
        assert_eq!((range.start(), range.end(), range.line_count()), (1, 3, 3));

        let removed = store.delete_block(range).unwrap();
        assert_eq!(removed.to_text(), "\\b{\n1\n}\n");
        assert_eq!(store.to_text(), "a\nc\n");
    }

    #[test]
    fn test_block_range_rejected_after_mutation() {
        let mut store = LineStore::parse("a\n\\b{\n}\n");
        let range = store.require_block("\\b{", &Termination::Brace).unwrap();
        store.insert_lines(&lines(&["new\n"]), InsertAt::Index(0), false);

        assert!(matches!(store.replace_block(range, &[]), Err(Error::StaleRange { .. })));
        assert_eq!(store.to_text(), "new\na\n\\b{\n}\n");
    }

    #[test]
    fn test_apply_edits_bottom_up() {
        let mut store = LineStore::parse("0\n1\n2\n3\n4\n");
        let checksum = store.checksum();
        let edits = vec![
            LineEdit::delete(0, 1),
            LineEdit::replace(3, 4, lines(&["three\n", "three bis\n"])),
            LineEdit::insert(5, lines(&["5\n"])),
        ];

        let outcome = store.apply_edits(&checksum, &edits).unwrap();

        assert_eq!(store.to_text(), "1\n2\nthree\nthree bis\n4\n5\n");
        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.line_shift, 1);
        assert_eq!(outcome.checksum, store.checksum());
    }

    #[test]
    fn test_apply_edits_rejects_overlap_and_stale() {
        let mut store = LineStore::parse("0\n1\n2\n");
        let checksum = store.checksum();

        let overlapping = vec![LineEdit::delete(0, 2), LineEdit::delete(1, 3)];
        assert!(matches!(
            store.apply_edits(&checksum, &overlapping),
            Err(Error::OverlappingEdits { .. })
        ));

        let same_start = vec![LineEdit::insert(1, vec![]), LineEdit::delete(1, 2)];
        assert!(matches!(
            store.apply_edits(&checksum, &same_start),
            Err(Error::OverlappingEdits { .. })
        ));

        assert!(matches!(
            store.apply_edits(&checksum, &[LineEdit::delete(2, 9)]),
            Err(Error::RangeOutOfBounds { .. })
        ));

        assert!(matches!(
            store.apply_edits("stale", &[LineEdit::delete(0, 1)]),
            Err(Error::StaleRange { .. })
        ));
        assert_eq!(store.to_text(), "0\n1\n2\n");
    }

    #[test]
    fn test_sort_edits_descending() {
        let edits = vec![LineEdit::delete(1, 2), LineEdit::delete(5, 6), LineEdit::delete(3, 4)];
        let sorted = sort_edits_descending(&edits);
        let starts: Vec<usize> = sorted.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![5, 3, 1]);
    }
}

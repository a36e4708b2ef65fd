use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// A text file held in memory as an ordered sequence of lines
///
/// Every line keeps its own terminator (`\n` or `\r\n`), so concatenating the
/// lines reproduces the original text byte for byte. Only the last line may
/// lack a terminator, and only when the source text did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStore {
    lines: Vec<String>,
}

impl LineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Split text into lines, keeping terminators
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    /// Wrap an already split sequence of lines
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reset the store to an empty sequence
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Replace the whole content with a new sequence
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Whether the last line is blank (whitespace and terminator only)
    pub fn ends_with_blank(&self) -> bool {
        self.last().is_some_and(|l| l.trim().is_empty())
    }

    /// Concatenate the lines back into text
    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    /// BLAKE3 checksum (hex) of the current content
    ///
    /// Two stores with the same text always share a checksum, so it identifies
    /// the snapshot a block range was computed against.
    pub fn checksum(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for line in &self.lines {
            hasher.update(line.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl From<Vec<String>> for LineStore {
    fn from(lines: Vec<String>) -> Self {
        Self::from_lines(lines)
    }
}

impl From<&str> for LineStore {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl<'a> IntoIterator for &'a LineStore {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Split a line into its body and terminator
pub fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Read a UTF-8 text file from disk into a line store
///
/// # Returns
/// * `Ok(LineStore)` - Lines of the file, terminators preserved
/// * `Err(Error::MissingSourceFile)` - No file at `path`
/// * `Err(Error::InvalidUtf8)` - File content is not valid UTF-8
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<LineStore> {
    let path_ref = path.as_ref();

    let bytes = match fs::read(path_ref) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::missing(path_ref.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let content = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
        path: path_ref.to_path_buf(),
    })?;

    Ok(LineStore::parse(&content))
}

/// Write a line store to disk, creating parent directories
pub fn write_lines<P: AsRef<Path>>(path: P, store: &LineStore) -> Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path_ref, store.to_text())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_terminators() {
        let store = LineStore::parse("a\nb\r\nc");
        assert_eq!(store.lines(), &["a\n", "b\r\n", "c"]);
        assert_eq!(store.to_text(), "a\nb\r\nc");
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(LineStore::parse("").is_empty());
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut store = LineStore::parse("x\ny\n");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.to_text(), "");
    }

    #[test]
    fn test_checksum_follows_content() {
        let a = LineStore::parse("one\ntwo\n");
        let b = LineStore::from_lines(vec!["one\n".into(), "two\n".into()]);
        let c = LineStore::parse("one\ntwo\nthree\n");

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum(), blake3::hash(b"one\ntwo\n").to_hex().to_string());
    }

    #[test]
    fn test_split_terminator() {
        assert_eq!(split_terminator("x\r\n"), ("x", "\r\n"));
        assert_eq!(split_terminator("x\n"), ("x", "\n"));
        assert_eq!(split_terminator("x"), ("x", ""));
    }

    #[test]
    fn test_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/doc.tex");
        let store = LineStore::parse("\\section{A}\ntext\n");

        write_lines(&path, &store).unwrap();
        let read = read_lines(&path).unwrap();

        assert_eq!(read, store);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tex");
        fs::write(&path, [0xFF, 0xFE, 0xFD]).unwrap();

        match read_lines(&path) {
            Err(Error::InvalidUtf8 { path: p }) => assert_eq!(p, path),
            other => panic!("Expected Error::InvalidUtf8, got {:?}", other),
        }
    }

    #[test]
    fn test_read_not_found() {
        match read_lines("/nonexistent/path/that/does/not/exist.tex") {
            Err(Error::MissingSourceFile { name }) => assert!(name.contains("nonexistent")),
            other => panic!("Expected Error::MissingSourceFile, got {:?}", other),
        }
    }
}

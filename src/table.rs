//! The per-export table of named line stores

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::lines::{LineStore, read_lines, write_lines};

/// Extension tried when a logical name is referenced without one
pub const DEFAULT_EXTENSION: &str = "tex";

/// Logical file names mapped to their owned line stores
///
/// Names double as paths relative to the base directory, both for loading and
/// for writing outputs.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    base_dir: PathBuf,
    files: BTreeMap<String, LineStore>,
}

impl FileTable {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load `name` from the base directory into its slot
    pub fn load(&mut self, name: &str) -> Result<()> {
        let store = self.read_from_disk(name)?;
        debug!(name, lines = store.len(), "loaded source file");
        self.files.insert(name.to_string(), store);
        Ok(())
    }

    /// Read `name` (or `name.tex`) from the base directory without storing it
    pub fn read_from_disk(&self, name: &str) -> Result<LineStore> {
        self.read_keyed(name).map(|(_, store)| store)
    }

    /// Like [`read_from_disk`](Self::read_from_disk), also returning the
    /// candidate name that matched a file
    pub fn read_keyed(&self, name: &str) -> Result<(String, LineStore)> {
        for candidate in Self::candidates(name) {
            let path = self.base_dir.join(&candidate);
            if path.is_file() {
                trace!(path = %path.display(), "reading from disk");
                return Ok((candidate, read_lines(path)?));
            }
        }
        Err(Error::missing(name))
    }

    pub(crate) fn candidates(name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if Path::new(name).extension().is_none() {
            names.push(format!("{}.{}", name, DEFAULT_EXTENSION));
        }
        names
    }

    pub fn insert(&mut self, name: impl Into<String>, store: LineStore) {
        self.files.insert(name.into(), store);
    }

    /// The key `name` is stored under, trying the default extension too
    pub fn resolve(&self, name: &str) -> Option<&str> {
        Self::candidates(name)
            .iter()
            .find_map(|n| self.files.get_key_value(n))
            .map(|(key, _)| key.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&LineStore> {
        Self::candidates(name).iter().find_map(|n| self.files.get(n))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LineStore> {
        let key = self.resolve(name)?.to_string();
        self.files.get_mut(&key)
    }

    pub fn require(&self, name: &str) -> Result<&LineStore> {
        self.get(name).ok_or_else(|| Error::missing(name))
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut LineStore> {
        self.get_mut(name).ok_or_else(|| Error::missing(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of lines across all slots
    pub fn total_lines(&self) -> usize {
        self.files.values().map(LineStore::len).sum()
    }

    /// Reset every slot to an empty store, keeping the names
    pub fn clear(&mut self) {
        for store in self.files.values_mut() {
            store.clear();
        }
        debug!(slots = self.files.len(), "cleared file table");
    }

    /// Write the store named `name` to `out_dir/name`
    pub fn write(&self, name: &str, out_dir: &Path) -> Result<PathBuf> {
        let store = self.require(name)?;
        let path = out_dir.join(name);
        write_lines(&path, store)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_and_lookup_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/cmd.tex"), "a\nb\n").unwrap();

        let mut table = FileTable::new(dir.path());
        table.load("src/cmd").unwrap();

        assert!(table.contains("src/cmd"));
        assert_eq!(table.require("src/cmd").unwrap().len(), 2);
        assert_eq!(table.total_lines(), 2);
    }

    #[test]
    fn test_get_prefers_exact_name() {
        let mut table = FileTable::default();
        table.insert("main", LineStore::parse("exact\n"));
        table.insert("main.tex", LineStore::parse("with extension\n"));
        assert_eq!(table.require("main").unwrap().to_text(), "exact\n");
        assert_eq!(table.require("main.tex").unwrap().to_text(), "with extension\n");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = FileTable::new(dir.path());
        assert!(matches!(table.load("nope.tex"), Err(Error::MissingSourceFile { .. })));
        assert!(matches!(table.require("nope.tex"), Err(Error::MissingSourceFile { .. })));
    }

    #[test]
    fn test_clear_keeps_slots() {
        let mut table = FileTable::default();
        table.insert("a.tex", LineStore::parse("1\n2\n"));
        table.clear();
        assert_eq!(table.len(), 1);
        assert!(table.require("a.tex").unwrap().is_empty());
        assert_eq!(table.total_lines(), 0);
    }

    #[test]
    fn test_write_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = FileTable::default();
        table.insert("out/main.tex", LineStore::parse("x\n"));

        let path = table.write("out/main.tex", dir.path()).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "x\n");
    }
}

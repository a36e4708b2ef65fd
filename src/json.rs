//! JSON documents: the export response and the statistics log

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Generate a unique identifier for one export run
pub fn generate_export_id() -> String {
    format!("export-{}", Uuid::new_v4())
}

/// Outcome of an export, printed by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub export_id: String,
    pub success: bool,
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    #[serde(default)]
    pub lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn failure(export_id: String, release: String, error: String) -> Self {
        Self {
            export_id,
            success: false,
            release,
            version: None,
            outputs: Vec::new(),
            lines: 0,
            build_hash: None,
            compile_seconds: None,
            error: Some(error),
        }
    }
}

/// One row of the statistics log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub id: u64,
    pub release: String,
    pub version: String,
    pub compile_seconds: f64,
    pub date: NaiveDate,
    pub lines: usize,
    pub build_hash: String,
}

/// Append-only record of exports, keyed by an increasing id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsLog {
    pub entries: Vec<StatsEntry>,
}

impl StatsLog {
    /// Load the log, or start an empty one if the file does not exist yet
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn next_id(&self) -> u64 {
        self.entries.iter().map(|e| e.id).max().map_or(1, |id| id + 1)
    }

    /// Last version recorded for `release`
    pub fn last_version(&self, release: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.release == release)
            .max_by_key(|e| e.id)
            .map(|e| e.version.as_str())
    }

    /// Append an entry with the next id, returning that id
    pub fn append(
        &mut self,
        release: &str,
        version: &str,
        compile_seconds: f64,
        date: NaiveDate,
        lines: usize,
        build_hash: &str,
    ) -> u64 {
        let id = self.next_id();
        self.entries.push(StatsEntry {
            id,
            release: release.to_string(),
            version: version.to_string(),
            compile_seconds,
            date,
            lines,
            build_hash: build_hash.to_string(),
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_export_id_is_unique() {
        let a = generate_export_id();
        let b = generate_export_id();
        assert!(a.starts_with("export-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_stats_ids_increase() {
        let mut log = StatsLog::default();
        assert_eq!(log.append("report", "1.0.0", 2.5, date(), 900, "abcd1234"), 1);
        assert_eq!(log.append("exam", "0.1.0", 1.0, date(), 300, "ffff0000"), 2);
        assert_eq!(log.append("report", "1.0.1", 2.4, date(), 910, "abcd9999"), 3);

        assert_eq!(log.last_version("report"), Some("1.0.1"));
        assert_eq!(log.last_version("exam"), Some("0.1.0"));
        assert_eq!(log.last_version("thesis"), None);
    }

    #[test]
    fn test_stats_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats/log.json");

        assert!(StatsLog::load(&path).unwrap().entries.is_empty());

        let mut log = StatsLog::default();
        log.append("report", "1.0.0", 0.0, date(), 10, "00000000");
        log.save(&path).unwrap();

        let loaded = StatsLog::load(&path).unwrap();
        assert_eq!(loaded, log);
        assert!(fs::read_to_string(&path).unwrap().contains("\"date\": \"2026-10-18\""));
    }

    #[test]
    fn test_failure_response_omits_empty_fields() {
        let response = ExportResponse::failure("export-1".into(), "exam".into(), "boom".into());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"boom\""));
        assert!(!json.contains("build_hash"));
    }
}

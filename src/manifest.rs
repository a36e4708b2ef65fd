//! Release manifests: which files a release uses and what it does to them

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::{ComposeOptions, ComposeSettings};
use crate::error::{Error, Result};
use crate::transform::Transform;
use crate::typeset::TypesetterConfig;

fn yes() -> bool {
    true
}

/// One file written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Logical name of the source in the file table
    pub source: String,
    /// Destination relative to the output directory, defaults to `source`
    #[serde(default)]
    pub dest: Option<String>,
    /// Flatten nested includes; otherwise the source is written as edited
    #[serde(default = "yes")]
    pub flatten: bool,
    #[serde(default)]
    pub options: ComposeOptions,
}

impl OutputSpec {
    pub fn dest(&self) -> &str {
        self.dest.as_deref().unwrap_or(&self.source)
    }
}

/// Everything an export needs to know about one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    /// Directory the logical file names are relative to
    #[serde(default)]
    pub base_dir: PathBuf,
    /// Files loaded into the table before any transform runs
    pub files: Vec<String>,
    /// Main document, handed to the typesetter
    pub main: String,
    pub output_dir: PathBuf,
    /// Files to write; defaults to the flattened main file
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    #[serde(default)]
    pub compose: ComposeSettings,
    #[serde(default)]
    pub typesetter: Option<TypesetterConfig>,
    /// Append-only statistics log
    #[serde(default)]
    pub stats_file: Option<PathBuf>,
}

impl Release {
    /// Read a manifest; relative paths are resolved against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("cannot read {}: {}", path.display(), e)))?;
        let mut release: Release = serde_json::from_str(&text)?;

        let root = path.parent().unwrap_or_else(|| Path::new(""));
        release.base_dir = root.join(&release.base_dir);
        release.output_dir = root.join(&release.output_dir);
        release.stats_file = release.stats_file.map(|p| root.join(p));

        release.validate()?;
        Ok(release)
    }

    /// Check that every referenced name is one of the release's files
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::Manifest(format!("release '{}' lists no files", self.name)));
        }
        let known = |name: &str| self.files.iter().any(|f| f == name);

        if !known(&self.main) {
            return Err(Error::Manifest(format!("main file '{}' is not listed in files", self.main)));
        }
        if let Some(config) = &self.compose.config_file {
            if !known(config) {
                return Err(Error::Manifest(format!("config file '{}' is not listed in files", config)));
            }
        }
        for output in &self.outputs {
            if !known(&output.source) {
                return Err(Error::Manifest(format!("output source '{}' is not listed in files", output.source)));
            }
        }
        Ok(())
    }

    /// Outputs to write, falling back to the flattened main file
    pub fn outputs(&self) -> Vec<OutputSpec> {
        if !self.outputs.is_empty() {
            return self.outputs.clone();
        }
        vec![OutputSpec {
            source: self.main.clone(),
            dest: None,
            flatten: true,
            options: ComposeOptions::default(),
        }]
    }
}

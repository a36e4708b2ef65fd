//! External typesetter boundary

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

fn one() -> u32 {
    1
}

/// Something that turns a main file into a document
///
/// Only the wall-clock time is reported back; output is not inspected.
pub trait Typesetter {
    fn run(&self, main: &Path, workdir: &Path) -> Result<Duration>;
}

/// Typesetter command from a release manifest, e.g. `pdflatex`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesetterConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Number of passes, for cross references
    #[serde(default = "one")]
    pub runs: u32,
}

/// Runs an external program once per pass with the main file as last argument
#[derive(Debug, Clone)]
pub struct CommandTypesetter {
    config: TypesetterConfig,
}

impl CommandTypesetter {
    pub fn new(config: TypesetterConfig) -> Self {
        Self { config }
    }
}

impl Typesetter for CommandTypesetter {
    fn run(&self, main: &Path, workdir: &Path) -> Result<Duration> {
        let started = Instant::now();
        for pass in 1..=self.config.runs.max(1) {
            let status = Command::new(&self.config.program)
                .args(&self.config.args)
                .arg(main)
                .current_dir(workdir)
                .status()
                .map_err(|e| Error::Typesetter(format!("cannot start '{}': {}", self.config.program, e)))?;
            if !status.success() {
                warn!(program = %self.config.program, pass, %status, "typesetter failed");
                return Err(Error::Typesetter(format!(
                    "'{}' exited with {} on pass {}",
                    self.config.program, status, pass
                )));
            }
        }
        let elapsed = started.elapsed();
        info!(program = %self.config.program, seconds = elapsed.as_secs_f64(), "typeset document");
        Ok(elapsed)
    }
}

//! One export of a release: load, edit, stamp, compose, write, record

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use crate::compose::Composer;
use crate::error::Result;
use crate::json::{ExportResponse, StatsLog, generate_export_id};
use crate::lines::{LineStore, write_lines};
use crate::manifest::Release;
use crate::table::FileTable;
use crate::transform::apply_all;
use crate::typeset::Typesetter;
use crate::version::{Version, build_hash, ensure_newer};

/// What the operator asked for
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Produce the distributable build
    pub dist: bool,
    /// Version to stamp and record; must succeed the last recorded one
    pub version: Option<String>,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub export_id: String,
    pub release: String,
    pub version: Option<Version>,
    pub outputs: Vec<PathBuf>,
    pub lines: usize,
    pub build_hash: String,
    pub compile_seconds: Option<f64>,
    pub stats_id: Option<u64>,
}

impl ExportReport {
    pub fn into_response(self) -> ExportResponse {
        ExportResponse {
            export_id: self.export_id,
            success: true,
            release: self.release,
            version: self.version.map(|v| v.to_string()),
            outputs: self.outputs,
            lines: self.lines,
            build_hash: Some(self.build_hash),
            compile_seconds: self.compile_seconds,
            error: None,
        }
    }
}

/// Check a candidate version against the statistics log
fn check_version(release: &Release, candidate: &str) -> Result<Version> {
    let previous = match &release.stats_file {
        Some(path) => StatsLog::load(path)?.last_version(&release.name).map(str::to_string),
        None => None,
    };
    match previous {
        Some(previous) => ensure_newer(candidate, &previous),
        None => Version::parse(candidate),
    }
}

/// Run one export of `release`
///
/// The file table lives only for the duration of the call. On failure it is
/// cleared before the error is returned; files already written stay on disk.
pub fn export(release: &Release, request: &ExportRequest, typesetter: Option<&dyn Typesetter>) -> Result<ExportReport> {
    let export_id = generate_export_id();
    info!(export_id = %export_id, release = %release.name, dist = request.dist, "starting export");

    let version = request
        .version
        .as_deref()
        .map(|candidate| check_version(release, candidate))
        .transpose()?;

    let mut table = FileTable::new(&release.base_dir);
    let result = run(release, request, version.as_ref(), &mut table, typesetter);
    table.clear();

    let (outputs, lines, hash, compile_seconds) = match result {
        Ok(done) => done,
        Err(e) => {
            warn!(export_id = %export_id, error = %e, "export failed");
            return Err(e);
        }
    };

    let stats_id = match (&release.stats_file, &version) {
        (Some(path), Some(version)) => {
            let mut log = StatsLog::load(path)?;
            let id = log.append(
                &release.name,
                &version.to_string(),
                compile_seconds.unwrap_or(0.0),
                Local::now().date_naive(),
                lines,
                &hash,
            );
            log.save(path)?;
            Some(id)
        }
        _ => None,
    };

    info!(export_id = %export_id, outputs = outputs.len(), lines, build_hash = %hash, "export finished");
    Ok(ExportReport {
        export_id,
        release: release.name.clone(),
        version: version.map(|v| v.with_build(hash.clone())),
        outputs,
        lines,
        build_hash: hash,
        compile_seconds,
        stats_id,
    })
}

type Produced = (Vec<PathBuf>, usize, String, Option<f64>);

fn run(
    release: &Release,
    request: &ExportRequest,
    version: Option<&Version>,
    table: &mut FileTable,
    typesetter: Option<&dyn Typesetter>,
) -> Result<Produced> {
    for name in &release.files {
        table.load(name)?;
    }
    apply_all(&release.transforms, table)?;

    if let Some(version) = version {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let stamp = version.to_string();
        for name in &release.files {
            let store = table.require_mut(name)?;
            release.compose.header.stamp_version(store, &stamp, &date);
        }
    }

    let mut composed: Vec<(String, LineStore)> = Vec::new();
    {
        let mut composer = Composer::new(table, &release.compose, request.dist);
        for output in release.outputs() {
            let store = if output.flatten {
                composer.flatten(&output.source, output.options)?
            } else {
                table.require(&output.source)?.clone()
            };
            composed.push((output.dest().to_string(), store));
        }
    }

    let mut written = Vec::with_capacity(composed.len());
    let mut lines = 0;
    let mut text = String::new();
    for (dest, store) in &composed {
        let path = release.output_dir.join(dest);
        write_lines(&path, store)?;
        lines += store.len();
        text.push_str(&store.to_text());
        written.push(path);
    }
    let hash = build_hash(&text);

    let compile_seconds = match typesetter {
        Some(typesetter) => {
            let main = composed
                .iter()
                .zip(release.outputs())
                .find(|(_, spec)| spec.source == release.main)
                .map(|((dest, _), _)| PathBuf::from(dest))
                .unwrap_or_else(|| PathBuf::from(&release.main));
            Some(typesetter.run(&main, &release.output_dir)?.as_secs_f64())
        }
        None => None,
    };

    Ok((written, lines, hash, compile_seconds))
}

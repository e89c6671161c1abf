//! Exportable reports of a solved set-cover run.
//!
//! A report directory holds:
//! - `manifest.json`: format version, creation time, parameters, counts, executor and the names
//!   of the data files, and
//! - three binary arrays in the crate's stream format (optionally compressed): `candidates.bin`
//!   and `codewords.bin` (`LongArray`), `covered.bin` (`ByteArray`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::array::{ByteArray, LongArray};
use crate::core::compress::Compressor;
use crate::error::ComputeError;
use crate::setcover::{Coverage, SetCoverParams};

pub const FORMAT_VERSION: u32 = 1;
const MANIFEST_FILENAME: &str = "manifest.json";
const CANDIDATES_FILENAME: &str = "candidates.bin";
const CODEWORDS_FILENAME: &str = "codewords.bin";
const COVERED_FILENAME: &str = "covered.bin";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// If the output directory already exists, remove it first.
    pub force: bool,
    /// Stream transform applied to the binary files.
    pub compression: Compressor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub format_version: u32,
    pub created_unix_secs: u64,
    pub params: ParamsManifest,
    pub counts: CountsManifest,
    pub executor: String,
    pub elapsed_ms: u64,
    pub compression: Compressor,
    pub files: FilesManifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsManifest {
    pub v: u32,
    pub m: u32,
    pub t: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsManifest {
    pub candidates: u64,
    pub codewords: u64,
    pub covered: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesManifest {
    pub candidates: String,
    pub codewords: String,
    pub covered: String,
}

/// A loaded report.
#[derive(Debug, Clone)]
pub struct Report {
    pub manifest: ReportManifest,
    pub candidates: LongArray,
    pub codewords: LongArray,
    pub covered: ByteArray,
}

impl Report {
    pub fn is_complete(&self) -> bool {
        self.manifest.counts.covered == self.manifest.counts.candidates
    }
}

/// Write `coverage` of `params` into `out_dir`.
///
/// An existing directory is refused unless `options.force` is set, in which case it is replaced.
pub fn export_report(
    params: &SetCoverParams,
    coverage: &Coverage,
    out_dir: &Path,
    options: ExportOptions,
) -> Result<ReportManifest, ComputeError> {
    if coverage.covered.len() != params.candidate_count() {
        return Err(ComputeError::Index {
            stage: "report_export_covered_len",
            gid: coverage.covered.len(),
            size: params.candidate_count(),
        });
    }

    prepare_output_dir(out_dir, options.force)?;

    let created_unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let manifest = ReportManifest {
        format_version: FORMAT_VERSION,
        created_unix_secs,
        params: ParamsManifest {
            v: params.v(),
            m: params.m(),
            t: params.t(),
        },
        counts: CountsManifest {
            candidates: params.candidate_count(),
            codewords: params.codewords().len(),
            covered: coverage.covered_count,
        },
        executor: coverage.executor.clone(),
        elapsed_ms: coverage.elapsed_ms,
        compression: options.compression,
        files: FilesManifest {
            candidates: CANDIDATES_FILENAME.to_string(),
            codewords: CODEWORDS_FILENAME.to_string(),
            covered: COVERED_FILENAME.to_string(),
        },
    };

    write_manifest(out_dir, &manifest)?;
    let c = options.compression;
    params
        .candidates()
        .save(&out_dir.join(&manifest.files.candidates), c)?;
    params
        .codewords()
        .save(&out_dir.join(&manifest.files.codewords), c)?;
    coverage
        .covered
        .save(&out_dir.join(&manifest.files.covered), c)?;

    info!(
        dir = %out_dir.display(),
        candidates = manifest.counts.candidates,
        covered = manifest.counts.covered,
        "report exported"
    );
    Ok(manifest)
}

/// Read a report written by [`export_report`] and check it against its manifest.
pub fn load_report(dir: &Path) -> Result<Report, ComputeError> {
    let manifest = read_manifest(dir)?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(ComputeError::invalid(format!(
            "unsupported report format_version {} (expected {FORMAT_VERSION})",
            manifest.format_version
        )));
    }

    let c = manifest.compression;
    let candidates = LongArray::load(&dir.join(&manifest.files.candidates), c)?;
    let codewords = LongArray::load(&dir.join(&manifest.files.codewords), c)?;
    let covered = ByteArray::load(&dir.join(&manifest.files.covered), c)?;

    let counts = manifest.counts;
    if candidates.len() != counts.candidates || covered.len() != counts.candidates {
        return Err(ComputeError::invalid(format!(
            "report holds {} candidates and {} flags, manifest says {}",
            candidates.len(),
            covered.len(),
            counts.candidates
        )));
    }
    if codewords.len() != counts.codewords {
        return Err(ComputeError::invalid(format!(
            "report holds {} codewords, manifest says {}",
            codewords.len(),
            counts.codewords
        )));
    }
    let covered_count = covered.iter().filter(|&b| b != 0).count() as u64;
    if covered_count != counts.covered {
        return Err(ComputeError::invalid(format!(
            "report flags {covered_count} candidates as covered, manifest says {}",
            counts.covered
        )));
    }

    info!(
        dir = %dir.display(),
        candidates = counts.candidates,
        covered = counts.covered,
        "report loaded"
    );
    Ok(Report {
        manifest,
        candidates,
        codewords,
        covered,
    })
}

/// Paths of the manifest and the three data files inside `dir`.
pub fn report_paths(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join(MANIFEST_FILENAME),
        dir.join(CANDIDATES_FILENAME),
        dir.join(CODEWORDS_FILENAME),
        dir.join(COVERED_FILENAME),
    ]
}

/// Error mapper tagging a failure with `stage` and the path it happened at.
fn at<'a, E: std::fmt::Display>(stage: &'static str, path: &'a Path) -> impl FnOnce(E) -> ComputeError + 'a {
    move |e| ComputeError::io_at(stage, path, e)
}

fn prepare_output_dir(out_dir: &Path, force: bool) -> Result<(), ComputeError> {
    match (out_dir.exists(), force) {
        (true, false) => {
            return Err(at("report_export_dir_exists", out_dir)(
                "refusing to replace an existing report without force",
            ))
        }
        (true, true) => fs::remove_dir_all(out_dir).map_err(at("report_export_remove_dir", out_dir))?,
        (false, _) => {}
    }
    fs::create_dir_all(out_dir).map_err(at("report_export_create_dir", out_dir))
}

fn write_manifest(out_dir: &Path, manifest: &ReportManifest) -> Result<(), ComputeError> {
    let path = out_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_vec_pretty(manifest).map_err(at("report_manifest_encode", &path))?;
    fs::write(&path, json).map_err(at("report_manifest_write", &path))
}

fn read_manifest(dir: &Path) -> Result<ReportManifest, ComputeError> {
    let path = dir.join(MANIFEST_FILENAME);
    let bytes = fs::read(&path).map_err(at("report_manifest_read", &path))?;
    serde_json::from_slice(&bytes).map_err(at("report_manifest_decode", &path))
}

//! Module source discovery and parallel record extraction.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use ansible_schema_core::{OverrideEntry, SourcedRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::extract::extract_file;

/// Typed error for discovery file operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Invalid or missing input (e.g. non-existent path).
    #[error("{0}")]
    InvalidInput(String),
}

/// A file that did not yield a module record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Records and failures of a discovery run, both in path order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub records: Vec<SourcedRecord>,
    pub failures: Vec<ExtractionFailure>,
}

const MODULE_EXTENSIONS: &[&str] = &["py", "yml", "yaml"];

/// Collects module source paths under `root`, recursively and sorted.
///
/// Python files (except `__init__.py`) and YAML documentation sidecars are
/// kept. Hidden directories are skipped.
pub fn collect_module_paths(root: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if !root.is_dir() {
        return Err(DiscoverError::InvalidInput(format!(
            "Module directory '{}' does not exist",
            root.display()
        )));
    }

    let mut paths = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if !is_hidden(&path) {
                    pending.push(path);
                }
                continue;
            }

            if is_module_file(&path) {
                paths.insert(path);
            }
        }
    }

    Ok(paths.into_iter().collect())
}

/// Extracts records from every module file under `root`.
///
/// Extraction runs on a rayon pool of `jobs` threads (adaptive default
/// when `None`). Output keeps the sorted path order, so runs over the same
/// tree are identical.
pub fn discover_records(
    root: &Path,
    jobs: Option<usize>,
) -> Result<DiscoveryOutcome, DiscoverError> {
    let paths = collect_module_paths(root)?;
    debug!(root = %root.display(), files = paths.len(), "Collected module files");

    let results: Vec<(PathBuf, Result<_, _>)> = {
        use rayon::prelude::*;
        let jobs = jobs
            .filter(|jobs| *jobs > 0)
            .unwrap_or_else(|| default_parallel_jobs(paths.len()));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        pool.install(|| {
            paths
                .par_iter()
                .map(|path| (path.clone(), extract_file(path)))
                .collect()
        })
    };

    let mut outcome = DiscoveryOutcome::default();
    for (path, result) in results {
        match result {
            Ok(record) => outcome
                .records
                .push(SourcedRecord::new(source_label(root, &path), record)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping file");
                outcome.failures.push(ExtractionFailure {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        records = outcome.records.len(),
        failures = outcome.failures.len(),
        "Discovery finished"
    );
    Ok(outcome)
}

/// Loads override entries from a YAML or JSON list.
pub fn load_overrides(path: &Path) -> Result<Vec<OverrideEntry>, DiscoverError> {
    if !path.is_file() {
        return Err(DiscoverError::InvalidInput(format!(
            "Override file '{}' does not exist",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let entries = if path.extension() == Some(OsStr::new("json")) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(entries)
}

fn is_module_file(path: &Path) -> bool {
    let is_init = path.file_name() == Some(OsStr::new("__init__.py"));
    let extension_ok = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext));
    extension_ok && !is_init
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.'))
}

fn source_label(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn default_parallel_jobs(file_count: usize) -> usize {
    let cpu_count = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(4);
    cpu_count.min(file_count.max(1))
}

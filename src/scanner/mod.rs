//! Media source scanning
//!
//! Walks the local source tree and computes the candidate file set for a
//! run: which files to push, how many, and how many bytes. Zero-byte and
//! oversize files never become candidates; incremental runs keep only
//! files modified strictly after the last committed sync timestamp.

use crate::types::SyncError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Files above this size are skipped with a warning
pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024; // 1 GiB

/// Callback for reporting scan progress
///
/// Arguments:
/// - `candidates`: number of candidate files selected so far
/// - `bytes`: total bytes of selected candidates so far
pub type ScanProgress = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Format-normalization hook consulted for each file during the scan
///
/// Actual codec work is delegated to whatever implementation the caller
/// injects; the scanner only routes files through it. A conversion
/// failure skips the file rather than aborting the scan.
pub trait MediaConverter {
    /// True when this converter wants to rewrite the file
    fn handles(&self, path: &Path) -> bool;

    /// Normalize the file, returning the path of the converted result
    fn convert(&self, path: &Path) -> Result<PathBuf, SyncError>;
}

/// Converter that leaves every file untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConversion;

impl MediaConverter for NoConversion {
    fn handles(&self, _path: &Path) -> bool {
        false
    }

    fn convert(&self, path: &Path) -> Result<PathBuf, SyncError> {
        Ok(path.to_path_buf())
    }
}

/// Scan tuning
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Exclude globs applied during the walk
    pub exclude_patterns: Vec<String>,

    /// Route matching files through the injected converter
    pub convert_formats: bool,
}

/// Candidate file set for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    /// Absolute candidate paths, in walk order
    pub files: Vec<PathBuf>,

    /// Sum of candidate sizes
    pub total_bytes: u64,
}

impl ScanOutcome {
    pub fn count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compute the candidate file set under `source_root`
///
/// `since` carries the last committed sync timestamp; `None` means full
/// sync. Per-file problems (unreadable metadata, failed conversion) are
/// logged and skip that file only.
pub fn scan_media(
    source_root: &Path,
    since: Option<f64>,
    options: &ScanOptions,
    converter: &dyn MediaConverter,
    on_progress: Option<&ScanProgress>,
) -> Result<ScanOutcome, SyncError> {
    if !source_root.is_dir() {
        return Err(SyncError::Scan(format!(
            "Source directory does not exist: {}",
            source_root.display()
        )));
    }

    let mut override_builder = ignore::overrides::OverrideBuilder::new(source_root);
    for pattern in &options.exclude_patterns {
        // The ignore crate's OverrideBuilder uses ! for exclusion.
        let exclude_pattern = format!("!{}", pattern);
        override_builder.add(&exclude_pattern).map_err(|error| {
            SyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, error))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|error| SyncError::Config(format!("Failed to build exclude overrides: {}", error)))?;

    // Hidden-file filtering keeps thumbnail caches and sidecar droppings
    // out of the candidate set; gitignore semantics are not wanted here.
    let walker = ignore::WalkBuilder::new(source_root)
        .standard_filters(false)
        .hidden(true)
        .overrides(overrides)
        .build();

    // Materialize the walk before conversion runs, so a file the
    // converter writes mid-scan is never picked up by the same pass.
    let mut discovered = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                    discovered.push(entry.into_path());
                }
            }
            Err(error) => warn!(%error, "skipping unreadable entry"),
        }
    }

    let mut outcome = ScanOutcome::default();

    for original in discovered {
        let path = match maybe_convert(&original, options, converter) {
            Some(path) => path,
            None => continue,
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(file = %path.display(), %error, "failed to read metadata");
                continue;
            }
        };

        let size = metadata.len();
        if size == 0 {
            debug!(file = %path.display(), "skipping zero-byte file");
            continue;
        }
        if size > MAX_FILE_SIZE {
            warn!(file = %path.display(), size, "skipping oversize file");
            continue;
        }

        let mtime = match epoch_mtime(&metadata) {
            Some(mtime) => mtime,
            None => {
                warn!(file = %path.display(), "failed to read modification time");
                continue;
            }
        };
        if !eligible(mtime, since) {
            continue;
        }

        outcome.total_bytes += size;
        outcome.files.push(path);
        if let Some(progress) = on_progress {
            progress(outcome.files.len() as u64, outcome.total_bytes);
        }
    }

    info!(
        files = outcome.count(),
        bytes = outcome.total_bytes,
        "scan complete"
    );
    Ok(outcome)
}

fn maybe_convert(
    path: &Path,
    options: &ScanOptions,
    converter: &dyn MediaConverter,
) -> Option<PathBuf> {
    if !options.convert_formats || !converter.handles(path) {
        return Some(path.to_path_buf());
    }
    match converter.convert(path) {
        Ok(converted) => {
            info!(from = %path.display(), to = %converted.display(), "converted");
            Some(converted)
        }
        Err(error) => {
            warn!(file = %path.display(), %error, "conversion failed; file skipped");
            None
        }
    }
}

fn epoch_mtime(metadata: &fs::Metadata) -> Option<f64> {
    metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|elapsed| elapsed.as_secs_f64())
}

/// A file is eligible iff it was modified strictly after the last sync,
/// or no prior sync exists
fn eligible(mtime: f64, since: Option<f64>) -> bool {
    match since {
        Some(last_sync) => mtime > last_sync,
        None => true,
    }
}

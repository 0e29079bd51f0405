//! Configuration management

use crate::notify::DEFAULT_BATCH_SIZE;
use crate::types::SyncError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default device folder receiving synced media
pub const DEFAULT_TARGET: &str = "/storage/self/primary/DCIM/droidsync";

/// State file kept next to the source tree unless overridden
const STATE_FILE_NAME: &str = ".droidsync_last_sync";

/// Push local media to an attached Android device over adb
#[derive(Debug, Parser)]
#[command(name = "droidsync", version)]
pub struct Cli {
    /// Local directory to sync from
    pub source: PathBuf,

    /// Destination directory on the device
    pub target: Option<String>,

    /// Only push files modified since the last committed sync
    #[arg(long)]
    pub incremental: bool,

    /// Route convertible formats through the configured media converter
    #[arg(long)]
    pub convert_media: bool,

    /// Device serial to use, skipping the interactive picker
    #[arg(long, value_name = "SERIAL")]
    pub device: Option<String>,

    /// List candidate files without transferring anything
    #[arg(long)]
    pub dry_run: bool,

    /// Exclude glob, repeatable
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Override the sync-state file location
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Bridge executable to invoke
    #[arg(long, value_name = "PATH")]
    pub adb_path: Option<PathBuf>,

    /// Per-command timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Paths per index-notification broadcast
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Config file (default: ./droidsync.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Optional config-file keys, all overridable on the command line
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub target: Option<String>,
    pub adb_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FileConfig {
    /// Load an explicit config file, or `droidsync.toml` when present
    fn load(explicit: Option<&Path>) -> Result<Self, SyncError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from("droidsync.toml");
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let contents = fs::read_to_string(&path).map_err(|error| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), error))
        })?;
        toml::from_str(&contents).map_err(|error| {
            SyncError::Config(format!("Invalid config {}: {}", path.display(), error))
        })
    }
}

/// Global configuration for a sync run
#[derive(Debug, Clone)]
pub struct Config {
    /// Local source directory
    pub source: PathBuf,

    /// Absolute destination directory on the device
    pub target: String,

    /// Incremental mode: only files newer than the last committed sync
    pub incremental: bool,

    /// Route convertible formats through the media converter
    pub convert_media: bool,

    /// Preselected device serial
    pub device: Option<String>,

    /// List candidates, transfer nothing
    pub dry_run: bool,

    /// Exclude globs for the scan
    pub exclude_patterns: Vec<String>,

    /// Sync-state file location
    pub state_file: PathBuf,

    /// Bridge executable
    pub adb_path: PathBuf,

    /// Per-command timeout
    pub bridge_timeout: Duration,

    /// Paths per index-notification broadcast
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            target: DEFAULT_TARGET.to_string(),
            incremental: false,
            convert_media: false,
            device: None,
            dry_run: false,
            exclude_patterns: Vec::new(),
            state_file: PathBuf::from(STATE_FILE_NAME),
            adb_path: PathBuf::from("adb"),
            bridge_timeout: Duration::from_secs(30),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = FileConfig::load(cli.config.as_deref())?;

        let mut exclude_patterns = file.exclude;
        exclude_patterns.extend(cli.exclude);

        let state_file = cli
            .state_file
            .unwrap_or_else(|| cli.source.join(STATE_FILE_NAME));

        let config = Config {
            source: cli.source,
            target: cli
                .target
                .or(file.target)
                .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            incremental: cli.incremental,
            convert_media: cli.convert_media,
            device: cli.device,
            dry_run: cli.dry_run,
            exclude_patterns,
            state_file,
            adb_path: cli
                .adb_path
                .or(file.adb_path)
                .unwrap_or_else(|| PathBuf::from("adb")),
            bridge_timeout: Duration::from_secs(cli.timeout.or(file.timeout_secs).unwrap_or(30)),
            batch_size: cli.batch_size.or(file.batch_size).unwrap_or(DEFAULT_BATCH_SIZE),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.source.exists() {
            return Err(SyncError::Config(format!(
                "Source path does not exist: {:?}",
                self.source
            )));
        }
        if !self.source.is_dir() {
            return Err(SyncError::Config(format!(
                "Source path is not a directory: {:?}",
                self.source
            )));
        }
        if !self.target.starts_with('/') {
            return Err(SyncError::Config(format!(
                "Target must be an absolute device path: {}",
                self.target
            )));
        }
        if self.batch_size == 0 {
            return Err(SyncError::Config(
                "Notification batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::CurlOptions;
use crate::queue::DEFAULT_BATCH_CAP;
use crate::report::STATUS_FILE_NAME;
use crate::scheduler::{SchedulerOptions, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_TIMEOUT_GRACE};

/// File name of the merged metadata store when `metadata_output` is not set.
pub const UPDATED_METADATA_FILE_NAME: &str = "updated_metadata.csv";

/// Dataset column names (optional `[columns]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Unique identifier column; also the key column of the metadata store.
    pub id: String,
    /// Preferred download address.
    pub primary_url: String,
    /// Used when the primary address is empty.
    pub fallback_url: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "BRnum".to_string(),
            primary_url: "Pdf_URL".to_string(),
            fallback_url: "Report Html Address".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/docfetch/config.toml`.
/// Missing keys take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocfetchConfig {
    /// Input dataset (CSV with a header row).
    pub dataset_path: PathBuf,
    /// Master metadata store (CSV, keyed by the identifier column).
    pub metadata_path: PathBuf,
    /// Where documents are saved as `<id>.<ext>`.
    pub destination_dir: PathBuf,
    /// Where the status report and (by default) the merged store are written.
    pub output_dir: PathBuf,
    /// Merged store location; defaults to `<output_dir>/updated_metadata.csv`.
    /// Set it to `metadata_path` to update the master in place.
    pub metadata_output: Option<PathBuf>,
    /// Extension of downloaded files, without the dot.
    pub file_extension: String,
    /// Maximum entries fetched per run.
    pub batch_cap: usize,
    /// Maximum simultaneous downloads.
    pub concurrency_limit: usize,
    /// Per-download time budget in seconds.
    pub worker_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Optional User-Agent header; some report hosts reject curl's default.
    pub user_agent: Option<String>,
    pub columns: ColumnNames,
}

impl Default for DocfetchConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("Data/reports.csv"),
            metadata_path: PathBuf::from("Data/metadata.csv"),
            destination_dir: PathBuf::from("Data/Downloads"),
            output_dir: PathBuf::from("Data/Output"),
            metadata_output: None,
            file_extension: "pdf".to_string(),
            batch_cap: DEFAULT_BATCH_CAP,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            worker_timeout_secs: 300,
            connect_timeout_secs: 30,
            user_agent: None,
            columns: ColumnNames::default(),
        }
    }
}

impl DocfetchConfig {
    /// File extension with any leading dot removed (`".pdf"` and `"pdf"` are the same).
    pub fn extension(&self) -> &str {
        self.file_extension.trim().trim_start_matches('.')
    }

    pub fn status_report_path(&self) -> PathBuf {
        self.output_dir.join(STATUS_FILE_NAME)
    }

    pub fn metadata_output_path(&self) -> PathBuf {
        self.metadata_output
            .clone()
            .unwrap_or_else(|| self.output_dir.join(UPDATED_METADATA_FILE_NAME))
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs.max(1))
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            concurrency_limit: self.concurrency_limit,
            worker_timeout: self.worker_timeout(),
            timeout_grace: DEFAULT_TIMEOUT_GRACE,
        }
    }

    /// Curl limits matching this config; curl's total timeout equals the worker budget.
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            timeout: self.worker_timeout(),
            user_agent: self.user_agent.clone(),
            ..CurlOptions::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("docfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DocfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DocfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (e.g. `--config`).
pub fn load_from_path(path: &Path) -> Result<DocfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: DocfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

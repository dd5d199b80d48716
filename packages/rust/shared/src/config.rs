//! Application configuration for ecfr-digest.
//!
//! User config lives at `~/.ecfr/ecfr.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EcfrError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ecfr.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ecfr";

/// Public eCFR versioner API root.
const DEFAULT_BASE_URL: &str = "https://www.ecfr.gov/api/versioner/v1";

// ---------------------------------------------------------------------------
// Config structs (matching ecfr.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Download settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Folder holding one JSON document per title.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Combined corpus artifact.
    #[serde(default = "default_corpus_file")]
    pub corpus_file: PathBuf,

    /// Flat summary artifact.
    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,

    /// Folder for full-text XML snapshots.
    #[serde(default = "default_xml_dir")]
    pub xml_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            corpus_file: default_corpus_file(),
            summary_file: default_summary_file(),
            xml_dir: default_xml_dir(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    "json_titles".into()
}
fn default_corpus_file() -> PathBuf {
    "ecfr_combined.json".into()
}
fn default_summary_file() -> PathBuf {
    "small_summary.json".into()
}
fn default_xml_dir() -> PathBuf {
    "xml_titles".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Versioner API root; title paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// First title index to download (inclusive).
    #[serde(default = "default_first_title")]
    pub first_title: u32,

    /// Last title index to download (inclusive).
    #[serde(default = "default_last_title")]
    pub last_title: u32,

    /// Pause between consecutive requests, in ms.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Snapshot date used for full-text XML downloads.
    #[serde(default = "default_snapshot_date")]
    pub snapshot_date: NaiveDate,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            first_title: default_first_title(),
            last_title: default_last_title(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            snapshot_date: default_snapshot_date(),
        }
    }
}

impl FetchConfig {
    /// The API root as a parsed URL.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| EcfrError::config(format!("invalid base_url {:?}: {e}", self.base_url)))
    }

    /// Check the base URL and that the title range is non-empty and starts at 1 or later.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.first_title == 0 {
            return Err(EcfrError::config("first_title must be at least 1"));
        }
        if self.first_title > self.last_title {
            return Err(EcfrError::config(format!(
                "empty title range: {}..={}",
                self.first_title, self.last_title
            )));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_first_title() -> u32 {
    1
}
fn default_last_title() -> u32 {
    50
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_snapshot_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ecfr/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| EcfrError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ecfr/ecfr.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EcfrError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| EcfrError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.fetch.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EcfrError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EcfrError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EcfrError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

//! Runtime settings for the harvest pipeline.
//!
//! Everything has a sensible default; an optional TOML file overrides
//! individual fields and the CLI overrides those in turn.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;
use crate::harvest::DEFAULT_WORKERS;
use crate::index::DEFAULT_LISTING_URL;

/// Settings controlling a harvest run and dataset locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the dataset file and the icon directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Listing page the unit index is built from.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Concurrent harvest workers (bounds outbound connections).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Courtesy delay before each request, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listing_url: default_listing_url(),
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl Settings {
    /// Load settings, applying a TOML file over the defaults when given.
    pub fn load(path: Option<&Path>) -> Result<Self, HarvestError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text)
                    .map_err(|e| HarvestError::Config(format!("{}: {}", path.display(), e)))
            }
            None => Ok(Self::default()),
        }
    }

    /// Path of the persisted dataset file.
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join("unit_counters.json")
    }

    /// Directory unit icons are written to.
    pub fn icons_dir(&self) -> PathBuf {
        self.data_dir.join("unit_icons")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

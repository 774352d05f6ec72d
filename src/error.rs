//! Error types for the harvest pipeline.

use thiserror::Error;

/// Errors produced while building or loading the counters dataset.
///
/// Per-unit failures are handled as soft failures by the coordinator and
/// never surface through this type; these variants cover corpus-wide
/// failures (index page, dataset file) and the raw I/O they wrap.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("dataset format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

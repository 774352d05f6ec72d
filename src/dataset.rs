//! Canonical dataset model and its persisted JSON form.
//!
//! The dataset maps unit display names to their counter records. A
//! `BTreeMap` keeps top-level keys sorted and serde keeps nested field
//! order fixed, so consecutive harvest runs diff cleanly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HarvestError;

/// Counters record for one unit.
///
/// `wiki_link` is set at index-build time and never changes. The three
/// counter fields stay null when extraction failed for the unit; the
/// downstream consumer shows such units as present but counter-less.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Detail page the record was (or will be) harvested from.
    pub wiki_link: String,
    /// Units this unit is strong against, normalized singular names.
    pub strong_vs: Option<Vec<String>>,
    /// Units this unit is weak against, normalized singular names.
    pub weak_vs: Option<Vec<String>>,
    /// Filename of the locally persisted icon.
    pub image_name: Option<String>,
}

impl UnitRecord {
    /// New record with null counter fields.
    pub fn new(wiki_link: String) -> Self {
        Self {
            wiki_link,
            strong_vs: None,
            weak_vs: None,
            image_name: None,
        }
    }
}

/// Unit name → record, sorted by name.
pub type Dataset = BTreeMap<String, UnitRecord>;

/// Render the dataset to its persisted JSON form (pretty, sorted keys).
pub fn dataset_to_json(dataset: &Dataset) -> Result<String, HarvestError> {
    Ok(serde_json::to_string_pretty(dataset)?)
}

/// Parse a persisted dataset. Malformed input is a
/// [`HarvestError::Format`], never a partial dataset.
pub fn dataset_from_json(json: &str) -> Result<Dataset, HarvestError> {
    Ok(serde_json::from_str(json)?)
}

/// Write the dataset file.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, dataset_to_json(dataset)?)?;
    info!("Wrote {} unit records to {}", dataset.len(), path.display());
    Ok(())
}

/// Load a dataset file written by [`save_dataset`].
pub fn load_dataset(path: &Path) -> Result<Dataset, HarvestError> {
    let json = fs::read_to_string(path)?;
    dataset_from_json(&json)
}

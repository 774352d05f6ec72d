//! Counterharvest - wiki scraper and fuzzy lookup for unit counter data.
//!
//! Builds a unit → counters dataset by crawling a game wiki (listing
//! page → per-unit detail pages, concurrently), persists it as
//! deterministic JSON plus local icon files, and answers typo-tolerant
//! fuzzy queries over the dataset's unit names.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod index;
pub mod normalize;
pub mod search;

pub use config::Settings;
pub use dataset::{load_dataset, save_dataset, Dataset, UnitRecord};
pub use error::HarvestError;
pub use fetch::{Fetch, HttpFetcher};
pub use harvest::run_harvest;
pub use index::{build_unit_index, UnitIndex, DEFAULT_LISTING_URL};
pub use search::{search, DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF};

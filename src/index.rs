//! Unit index construction from the wiki's unit listing page.
//!
//! The listing page holds one `article-table` whose cells group unit
//! links by age; each link's `title` attribute carries the unit name
//! with the game-disambiguation suffix appended.

use std::collections::HashMap;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::HarvestError;
use crate::fetch::Fetch;

/// Listing page with the table of all unit links.
pub const DEFAULT_LISTING_URL: &str =
    "https://ageofempires.fandom.com/wiki/Unit_(Age_of_Empires_II)";

/// Disambiguation suffix the wiki appends to link titles.
const TITLE_SUFFIX: &str = " (Age of Empires II)";

/// One unit discovered on the listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitEntry {
    pub name: String,
    pub url: String,
}

/// Ordered set of units to harvest, keyed by display name.
///
/// Insertion order is preserved and drives the coordinator's merge; a
/// re-inserted name keeps its original position but takes the later URL
/// (the listing table links some units once per age).
#[derive(Debug, Default)]
pub struct UnitIndex {
    entries: Vec<UnitEntry>,
    slots: HashMap<String, usize>,
}

impl UnitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit, overwriting the URL if the name is already known.
    pub fn insert(&mut self, name: String, url: String) {
        match self.slots.get(&name) {
            Some(&slot) => self.entries[slot].url = url,
            None => {
                self.slots.insert(name.clone(), self.entries.len());
                self.entries.push(UnitEntry { name, url });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the first `limit` entries (0 means no limit).
    pub fn truncate(&mut self, limit: usize) {
        if limit > 0 && limit < self.entries.len() {
            for entry in &self.entries[limit..] {
                self.slots.remove(&entry.name);
            }
            self.entries.truncate(limit);
        }
    }
}

/// Parse the listing page markup into a [`UnitIndex`].
///
/// The expected table is located by its `article-table` class; its
/// absence is a hard parse error since nothing can be harvested without
/// it. Relative link targets are resolved against `origin`.
pub fn parse_unit_index(html: &str, origin: &Url) -> Result<UnitIndex, HarvestError> {
    let document = Html::parse_document(html);

    let table_selector = Selector::parse("table.article-table")
        .map_err(|e| HarvestError::Parse(format!("Failed to parse selector: {:?}", e)))?;
    let cell_selector = Selector::parse("td")
        .map_err(|e| HarvestError::Parse(format!("Failed to parse selector: {:?}", e)))?;
    let link_selector = Selector::parse("a")
        .map_err(|e| HarvestError::Parse(format!("Failed to parse selector: {:?}", e)))?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| HarvestError::Parse("unit listing table not found".to_string()))?;

    let mut index = UnitIndex::new();
    for cell in table.select(&cell_selector) {
        for link in cell.select(&link_selector) {
            let Some(title) = link.value().attr("title") else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let name = title.replace(TITLE_SUFFIX, "");
            let url = match origin.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            };
            index.insert(name, url);
        }
    }

    debug!("Parsed {} units from listing page", index.len());
    Ok(index)
}

/// Fetch the listing page and build the unit index.
pub async fn build_unit_index(
    fetcher: &dyn Fetch,
    listing_url: &str,
) -> Result<UnitIndex, HarvestError> {
    let origin = Url::parse(listing_url)
        .map_err(|e| HarvestError::Parse(format!("invalid listing url: {}", e)))?;
    let html = fetcher.get_text(listing_url).await?;
    parse_unit_index(&html, &origin)
}

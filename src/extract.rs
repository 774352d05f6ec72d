//! Per-unit detail extraction: counters section and portrait icon.
//!
//! Parsing is split from I/O so the section and portrait walks are
//! testable on fixture markup. All per-unit failures here are soft: the
//! caller gets a record with null fields and the batch moves on.

use std::path::{Path, PathBuf};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::HarvestError;
use crate::fetch::Fetch;
use crate::normalize::normalize_phrase;

/// Section header introducing the counters table on a unit page.
const COUNTERS_HEADER: &str = "Unit strengths and weaknesses";
/// Age-qualified variant used by at least one unit (Camel Scout).
const COUNTERS_HEADER_FEUDAL: &str = "Unit strengths and weaknesses in Feudal Age";

/// Extraction result for one unit. Any subset of fields may be null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitCounters {
    pub strong_vs: Option<Vec<String>>,
    pub weak_vs: Option<Vec<String>>,
    pub image_name: Option<String>,
}

/// Reference to a unit's portrait image on the wiki.
#[derive(Debug, Clone, PartialEq)]
pub struct PortraitRef {
    /// Absolute URL of the image bytes.
    pub src: String,
    /// Canonical filename the site assigns to the image.
    pub image_name: String,
}

fn selector(css: &str) -> Selector {
    // selectors here are static strings; a parse failure is a bug
    Selector::parse(css).expect("invalid selector")
}

/// Extract the strong-vs / weak-vs lists from a unit detail page.
///
/// The counters live in the two table rows following the section header
/// row; each row's last cell holds a comma-separated phrase list. Returns
/// `None` when neither header variant is present (soft failure).
pub fn parse_counters(html: &str) -> Option<(Vec<String>, Vec<String>)> {
    let document = Html::parse_document(html);
    let th_selector = selector("th");
    let td_selector = selector("td");

    let header = document
        .select(&th_selector)
        .find(|th| text_of(th) == COUNTERS_HEADER)
        .or_else(|| {
            document
                .select(&th_selector)
                .find(|th| text_of(th) == COUNTERS_HEADER_FEUDAL)
        })?;

    let header_row = ElementRef::wrap(header.parent()?)?;
    let mut rows = header_row
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr");

    let strong = phrase_list(&rows.next()?, &td_selector)?;
    let weak = phrase_list(&rows.next()?, &td_selector)?;
    Some((strong, weak))
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Last cell of a counters row, split on `", "` and normalized.
fn phrase_list(row: &ElementRef, td_selector: &Selector) -> Option<Vec<String>> {
    let cell = row.select(td_selector).last()?;
    let text = text_of(&cell);
    Some(text.split(", ").map(normalize_phrase).collect())
}

/// Locate the unit's primary portrait in the page's infobox.
///
/// Returns `None` when the figure, link, image or either attribute is
/// missing; portrait absence is a soft failure, not a crash.
pub fn parse_portrait(html: &str, page_url: &Url) -> Option<PortraitRef> {
    let document = Html::parse_document(html);
    let image_selector = selector("figure.pi-item.pi-image a img");

    let image = document.select(&image_selector).next()?;
    let src = image.value().attr("src")?;
    let image_name = image.value().attr("data-image-name")?;

    let src = page_url.join(src).ok()?.to_string();
    Some(PortraitRef {
        src,
        image_name: image_name.to_string(),
    })
}

/// Persist icon bytes under the site-provided filename.
///
/// The directory is created if missing and an existing file is
/// overwritten, so re-runs are idempotent.
pub async fn write_icon(
    icons_dir: &Path,
    image_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, HarvestError> {
    tokio::fs::create_dir_all(icons_dir).await?;
    let path = icons_dir.join(image_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Run the full extraction for one unit: fetch the detail page, parse
/// the counters section, then download and persist the portrait icon.
///
/// Never fails the batch: fetch or parse problems are logged against the
/// unit name and degrade to null fields.
pub async fn extract_unit(
    fetcher: &dyn Fetch,
    name: &str,
    detail_url: &str,
    icons_dir: &Path,
) -> UnitCounters {
    let html = match fetcher.get_text(detail_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Failed to fetch detail page for {}: {}", name, e);
            return UnitCounters::default();
        }
    };

    let page_url = match Url::parse(detail_url) {
        Ok(u) => u,
        Err(e) => {
            warn!("Invalid detail url for {}: {}", name, e);
            return UnitCounters::default();
        }
    };

    let mut result = UnitCounters::default();
    match parse_counters(&html) {
        Some((strong, weak)) => {
            result.strong_vs = Some(strong);
            result.weak_vs = Some(weak);
        }
        None => {
            warn!("Couldn't find counters table for {}", name);
            return result;
        }
    }

    let Some(portrait) = parse_portrait(&html, &page_url) else {
        warn!("Couldn't find portrait for {}", name);
        return result;
    };

    match fetcher.get_bytes(&portrait.src).await {
        Ok(bytes) => match write_icon(icons_dir, &portrait.image_name, &bytes).await {
            Ok(path) => {
                debug!("Saved icon for {} to {}", name, path.display());
                result.image_name = Some(portrait.image_name);
            }
            Err(e) => warn!("Failed to write icon for {}: {}", name, e),
        },
        Err(e) => warn!("Failed to fetch icon for {}: {}", name, e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_page(header: &str, strong: &str, weak: &str, with_figure: bool) -> String {
        let figure = if with_figure {
            r#"<figure class="pi-item pi-image">
                <a href="/wiki/File:Knight.png">
                    <img src="https://static.example.test/Knight.png" data-image-name="Knight.png">
                </a>
            </figure>"#
        } else {
            ""
        };
        format!(
            r#"<html><body>{figure}
            <table>
                <tr><th colspan="2">{header}</th></tr>
                <tr><td>Strong vs.</td><td>{strong}</td></tr>
                <tr><td>Weak vs.</td><td>{weak}</td></tr>
            </table>
            </body></html>"#
        )
    }

    #[test]
    fn parses_both_counter_lists() {
        let html = detail_page(
            "Unit strengths and weaknesses",
            "Archers, Skirmishers, and Camels",
            "Pikemen, and Monks",
            true,
        );
        let (strong, weak) = parse_counters(&html).unwrap();
        assert_eq!(strong, vec!["Archer", "Skirmisher", "Camel"]);
        assert_eq!(weak, vec!["Pikeman", "Monk"]);
    }

    #[test]
    fn lists_are_not_truncated_to_equal_length() {
        let html = detail_page(
            "Unit strengths and weaknesses",
            "Archers, Skirmishers, Camels, and Monks",
            "Pikemen",
            false,
        );
        let (strong, weak) = parse_counters(&html).unwrap();
        assert_eq!(strong.len(), 4);
        assert_eq!(weak, vec!["Pikeman"]);
    }

    #[test]
    fn falls_back_to_feudal_age_header() {
        let html = detail_page(
            "Unit strengths and weaknesses in Feudal Age",
            "Villagers",
            "Spearmen",
            false,
        );
        let (strong, weak) = parse_counters(&html).unwrap();
        assert_eq!(strong, vec!["Villager"]);
        assert_eq!(weak, vec!["Spearman"]);
    }

    #[test]
    fn missing_header_yields_none() {
        let html = "<html><body><table><tr><th>Upgrades</th></tr></table></body></html>";
        assert!(parse_counters(html).is_none());
    }

    #[test]
    fn takes_last_cell_of_each_row() {
        // label cell first, counters cell last
        let html = detail_page("Unit strengths and weaknesses", "Camels", "Knights", false);
        let (strong, weak) = parse_counters(&html).unwrap();
        assert_eq!(strong, vec!["Camel"]);
        assert_eq!(weak, vec!["Knight"]);
    }

    #[test]
    fn portrait_parsed_from_infobox_figure() {
        let html = detail_page("Unit strengths and weaknesses", "Camels", "Knights", true);
        let page_url = Url::parse("https://ageofempires.fandom.com/wiki/Knight").unwrap();
        let portrait = parse_portrait(&html, &page_url).unwrap();
        assert_eq!(portrait.image_name, "Knight.png");
        assert_eq!(portrait.src, "https://static.example.test/Knight.png");
    }

    #[test]
    fn missing_portrait_is_not_a_crash() {
        let html = detail_page("Unit strengths and weaknesses", "Camels", "Knights", false);
        let page_url = Url::parse("https://ageofempires.fandom.com/wiki/Knight").unwrap();
        assert!(parse_portrait(&html, &page_url).is_none());
    }

    #[tokio::test]
    async fn icon_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("unit_icons");

        write_icon(&icons, "Knight.png", b"old bytes").await.unwrap();
        let path = write_icon(&icons, "Knight.png", b"new bytes").await.unwrap();

        let entries = std::fs::read_dir(&icons).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(std::fs::read(path).unwrap(), b"new bytes");
    }
}

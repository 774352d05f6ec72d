//! Concurrent harvest coordination.
//!
//! Fans the per-unit extractor out over a bounded worker pool. Workers
//! pop units from a shared queue and hand results back by distinct key
//! through one shared map; no other mutable state crosses workers. The
//! merge runs single-threaded after every worker has been joined.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::dataset::{Dataset, UnitRecord};
use crate::extract::{extract_unit, UnitCounters};
use crate::fetch::Fetch;
use crate::index::{UnitEntry, UnitIndex};

/// Default number of concurrent harvest workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Harvest every unit in `index` and merge the results into a dataset.
///
/// Each index key ends up in the dataset exactly once, in null-field
/// form when its extraction failed or its task panicked. The merge
/// iterates the index in insertion order; worker completion order is
/// irrelevant to the output.
pub async fn run_harvest(
    fetcher: Arc<dyn Fetch>,
    index: &UnitIndex,
    icons_dir: &Path,
    workers: usize,
    progress: Option<ProgressBar>,
) -> Dataset {
    let workers = workers.max(1);
    let queue: Arc<Mutex<Vec<UnitEntry>>> =
        Arc::new(Mutex::new(index.iter().cloned().collect()));
    let results: Arc<Mutex<HashMap<String, UnitCounters>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut handles = Vec::new();
    for _ in 0..workers {
        let fetcher = fetcher.clone();
        let queue = queue.clone();
        let results = results.clone();
        let semaphore = semaphore.clone();
        let icons_dir: PathBuf = icons_dir.to_path_buf();
        let progress = progress.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let Ok(_permit) = semaphore.acquire().await else {
                    break;
                };

                let entry = {
                    let mut queue = queue.lock().await;
                    queue.pop()
                };
                let Some(entry) = entry else {
                    break;
                };

                if let Some(pb) = &progress {
                    pb.set_message(entry.name.clone());
                }

                let counters =
                    extract_unit(fetcher.as_ref(), &entry.name, &entry.url, &icons_dir).await;

                results.lock().await.insert(entry.name, counters);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
            }
        }));
    }

    // Full barrier: the merge must not start before the pool drains.
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Harvest worker terminated abnormally: {}", e);
        }
    }

    let mut results = results.lock().await;
    let mut dataset = Dataset::new();
    let mut failed = 0usize;
    for entry in index.iter() {
        let mut record = UnitRecord::new(entry.url.clone());
        match results.remove(&entry.name) {
            Some(counters) => {
                if counters.strong_vs.is_none() {
                    failed += 1;
                }
                record.strong_vs = counters.strong_vs;
                record.weak_vs = counters.weak_vs;
                record.image_name = counters.image_name;
            }
            // task never completed; the key stays with null fields
            None => failed += 1,
        }
        dataset.insert(entry.name.clone(), record);
    }

    info!(
        "Harvested {} units ({} without counters)",
        dataset.len(),
        failed
    );
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// In-memory fetcher: canned pages and icon bytes, with a set of
    /// URLs that fail on purpose.
    struct FakeFetcher {
        pages: HashMap<String, String>,
        images: HashMap<String, Vec<u8>>,
        failing: HashSet<String>,
    }

    impl FakeFetcher {
        fn failure(url: &str) -> HarvestError {
            HarvestError::Parse(format!("injected failure for {}", url))
        }
    }

    #[async_trait]
    impl Fetch for FakeFetcher {
        async fn get_text(&self, url: &str) -> Result<String, HarvestError> {
            if self.failing.contains(url) {
                return Err(Self::failure(url));
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Self::failure(url))
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
            if self.failing.contains(url) {
                return Err(Self::failure(url));
            }
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| Self::failure(url))
        }
    }

    fn detail_page(name: &str, strong: &str, weak: &str) -> String {
        format!(
            r#"<html><body>
            <figure class="pi-item pi-image">
                <a href="/wiki/File:{name}.png">
                    <img src="https://static.example.test/{name}.png" data-image-name="{name}.png">
                </a>
            </figure>
            <table>
                <tr><th>Unit strengths and weaknesses</th></tr>
                <tr><td>Strong vs.</td><td>{strong}</td></tr>
                <tr><td>Weak vs.</td><td>{weak}</td></tr>
            </table>
            </body></html>"#
        )
    }

    fn fixture(failing_unit: Option<&str>) -> (Arc<dyn Fetch>, UnitIndex) {
        let units = [
            ("Knight", "Archers, Skirmishers", "Pikemen, Camels"),
            ("Archer", "Spearmen", "Skirmishers, Knights"),
            ("Monk", "Knights", "Archers, Light Cavalry"),
            ("Camel Rider", "Knights", "Pikemen, Monks"),
        ];

        let mut pages = HashMap::new();
        let mut images = HashMap::new();
        let mut failing = HashSet::new();
        let mut index = UnitIndex::new();

        for (name, strong, weak) in units {
            let url = format!("https://example.test/wiki/{}", name.replace(' ', "_"));
            if failing_unit == Some(name) {
                failing.insert(url.clone());
            }
            pages.insert(url.clone(), detail_page(name, strong, weak));
            images.insert(
                format!("https://static.example.test/{}.png", name),
                format!("png:{}", name).into_bytes(),
            );
            index.insert(name.to_string(), url);
        }

        (
            Arc::new(FakeFetcher {
                pages,
                images,
                failing,
            }),
            index,
        )
    }

    async fn harvest_with(workers: usize, failing_unit: Option<&str>) -> Dataset {
        let (fetcher, index) = fixture(failing_unit);
        let dir = tempfile::tempdir().unwrap();
        run_harvest(fetcher, &index, &dir.path().join("unit_icons"), workers, None).await
    }

    #[tokio::test]
    async fn all_units_fully_populated() {
        let dataset = harvest_with(4, None).await;
        assert_eq!(dataset.len(), 4);

        let knight = &dataset["Knight"];
        assert_eq!(
            knight.strong_vs.as_deref(),
            Some(["Archer".to_string(), "Skirmisher".to_string()].as_slice())
        );
        assert_eq!(
            knight.weak_vs.as_deref(),
            Some(["Pikeman".to_string(), "Camel".to_string()].as_slice())
        );
        assert_eq!(knight.image_name.as_deref(), Some("Knight.png"));
        assert_eq!(knight.wiki_link, "https://example.test/wiki/Knight");
    }

    #[tokio::test]
    async fn icons_are_written_for_each_unit() {
        let (fetcher, index) = fixture(None);
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("unit_icons");
        run_harvest(fetcher, &index, &icons, 2, None).await;

        assert_eq!(
            std::fs::read(icons.join("Monk.png")).unwrap(),
            b"png:Monk".to_vec()
        );
        assert_eq!(std::fs::read_dir(&icons).unwrap().count(), 4);
    }

    #[tokio::test]
    async fn faulted_unit_keeps_null_fields_single_worker() {
        let dataset = harvest_with(1, Some("Monk")).await;
        assert_eq!(dataset.len(), 4);

        let monk = &dataset["Monk"];
        assert!(monk.strong_vs.is_none());
        assert!(monk.weak_vs.is_none());
        assert!(monk.image_name.is_none());
        assert!(!monk.wiki_link.is_empty());

        for name in ["Knight", "Archer", "Camel Rider"] {
            assert!(dataset[name].strong_vs.is_some(), "{} should be populated", name);
        }
    }

    #[tokio::test]
    async fn faulted_unit_keeps_null_fields_many_workers() {
        let dataset = harvest_with(8, Some("Monk")).await;
        assert_eq!(dataset.len(), 4);
        assert!(dataset["Monk"].strong_vs.is_none());
        for name in ["Knight", "Archer", "Camel Rider"] {
            assert!(dataset[name].strong_vs.is_some(), "{} should be populated", name);
        }
    }
}

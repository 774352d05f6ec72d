//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::dataset::{load_dataset, save_dataset, Dataset};
use crate::fetch::HttpFetcher;
use crate::harvest::run_harvest;
use crate::index::build_unit_index;
use crate::search::{search, DEFAULT_LIMIT, DEFAULT_SCORE_CUTOFF};

#[derive(Parser)]
#[command(name = "counterharvest")]
#[command(about = "Wiki scraper and fuzzy lookup for RTS unit counter data")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides settings)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the wiki and build the unit counters dataset
    Harvest {
        /// Listing page URL to start from
        #[arg(long)]
        url: Option<String>,
        /// Number of harvest workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Only harvest the first N units (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,
        /// Dataset output path (defaults to <data-dir>/unit_counters.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Fuzzy-search unit names in the harvested dataset
    Search {
        /// Query text; a single space lists units
        query: String,
        /// Maximum number of matches
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Minimum similarity score (0-100)
        #[arg(long, default_value_t = DEFAULT_SCORE_CUTOFF)]
        cutoff: u8,
    },

    /// Print one unit's record by exact name
    Show {
        /// Unit display name
        unit: String,
    },
}

/// Parse arguments and dispatch to the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }

    match cli.command {
        Commands::Harvest {
            url,
            workers,
            limit,
            out,
        } => cmd_harvest(&settings, url, workers, limit, out).await,
        Commands::Search {
            query,
            limit,
            cutoff,
        } => cmd_search(&settings, &query, limit, cutoff),
        Commands::Show { unit } => cmd_show(&settings, &unit),
    }
}

async fn cmd_harvest(
    settings: &Settings,
    url: Option<String>,
    workers: Option<usize>,
    limit: usize,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let listing_url = url.unwrap_or_else(|| settings.listing_url.clone());
    let workers = workers.unwrap_or(settings.workers);
    let out = out.unwrap_or_else(|| settings.dataset_path());

    let fetcher = Arc::new(HttpFetcher::new(
        settings.timeout(),
        settings.request_delay(),
    ));

    println!(
        "{} Building unit index from {}",
        style("→").cyan(),
        listing_url
    );
    let mut index = build_unit_index(fetcher.as_ref(), &listing_url).await?;
    index.truncate(limit);
    println!(
        "{} Found {} units, harvesting with {} workers",
        style("→").cyan(),
        index.len(),
        workers
    );

    let pb = ProgressBar::new(index.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let dataset = run_harvest(
        fetcher,
        &index,
        &settings.icons_dir(),
        workers,
        Some(pb.clone()),
    )
    .await;
    pb.finish_and_clear();

    save_dataset(&dataset, &out)?;

    let missing = dataset
        .values()
        .filter(|record| record.strong_vs.is_none())
        .count();
    println!(
        "{} Wrote {} units to {} ({} without counters)",
        style("✓").green(),
        dataset.len(),
        out.display(),
        missing
    );
    Ok(())
}

fn load_for_query(settings: &Settings) -> anyhow::Result<Dataset> {
    let path = settings.dataset_path();
    if !path.exists() {
        anyhow::bail!(
            "dataset not found at {} (run `counterharvest harvest` first)",
            path.display()
        );
    }
    Ok(load_dataset(&path)?)
}

fn cmd_search(settings: &Settings, query: &str, limit: usize, cutoff: u8) -> anyhow::Result<()> {
    let dataset = load_for_query(settings)?;
    let matches = search(
        query,
        dataset.keys().map(String::as_str),
        limit,
        cutoff,
    );

    if matches.is_empty() {
        println!("{} No matches", style("✗").red());
        return Ok(());
    }

    for name in matches {
        println!("{}", style(name).bold());
        print_record(&dataset, name);
    }
    Ok(())
}

fn cmd_show(settings: &Settings, unit: &str) -> anyhow::Result<()> {
    let dataset = load_for_query(settings)?;
    if !dataset.contains_key(unit) {
        anyhow::bail!("no unit named {:?} in the dataset", unit);
    }
    println!("{}", style(unit).bold());
    print_record(&dataset, unit);
    Ok(())
}

fn print_record(dataset: &Dataset, name: &str) {
    let record = &dataset[name];
    match (&record.strong_vs, &record.weak_vs) {
        (Some(strong), Some(weak)) => {
            println!("  strong vs: {}", strong.join(", "));
            println!("  weak vs:   {}", weak.join(", "));
        }
        _ => println!("  (no counter data)"),
    }
    if let Some(image) = &record.image_name {
        println!("  icon:      {}", image);
    }
}

//! Sequential scraping pipeline.
//!
//! This module drives one full run: harvest article URLs from search, then
//! fetch, extract and store each article in turn. One bad article never
//! aborts the run; a failed harvest does, because without URLs there is
//! nothing left to do.

use crate::browser::PageSource;
use crate::error::Result;
use crate::extract::{self, AbstractRecord};
use crate::harvest::{self, HarvestOptions};
use crate::store::AbstractStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{error, info};

/// Inputs for one pipeline run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Search keyword
    pub keyword: String,
    /// Upper bound on harvested article URLs
    pub max_results: usize,
    /// Directory receiving the JSON store
    pub data_dir: PathBuf,
    /// Custom search base URL for mirror sites
    pub search_base_url: Option<String>,
}

impl RunConfig {
    /// Run configuration with the default data directory.
    pub fn new(keyword: impl Into<String>, max_results: usize) -> Self {
        Self {
            keyword: keyword.into(),
            max_results,
            data_dir: PathBuf::from("./data"),
            search_base_url: None,
        }
    }
}

/// What happened to one harvested URL
#[derive(Debug, Clone)]
pub enum UrlOutcome {
    /// Fetched, extracted and merged into the store
    Saved {
        /// Article URL
        url: String,
        /// Extracted article title
        title: String,
    },
    /// Failed somewhere in fetch, extract or store; the run moved on
    Skipped {
        /// Article URL
        url: String,
        /// Why it was skipped
        reason: String,
    },
}

/// Summary of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Keyword the run was for
    pub keyword: String,
    /// URLs the driver attempted, successes and failures alike
    pub attempted: usize,
    /// Per-URL outcomes, in harvest order
    pub outcomes: Vec<UrlOutcome>,
    /// Where the saved abstracts live
    pub store_path: PathBuf,
}

impl RunReport {
    /// Number of abstracts merged into the store
    pub fn saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UrlOutcome::Saved { .. }))
            .count()
    }

    /// Number of URLs that failed and were skipped
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UrlOutcome::Skipped { .. }))
            .count()
    }
}

/// Run the full pipeline for one keyword.
///
/// Harvest errors propagate and abort the run. Per-article errors are
/// logged with the offending URL and the run parameters, recorded in the
/// report, and skipped.
///
/// # Arguments
///
/// * `fetcher` - Page source used for search pages and article pages
/// * `config` - Run configuration
///
/// # Returns
///
/// A [`RunReport`] covering every attempted URL
pub async fn run(fetcher: &dyn PageSource, config: &RunConfig) -> Result<RunReport> {
    std::fs::create_dir_all(&config.data_dir)?;

    let options = HarvestOptions {
        max_results: config.max_results,
        base_url: config.search_base_url.clone(),
    };
    let urls = harvest::harvest_urls(fetcher, &config.keyword, &options).await?;

    let store = AbstractStore::for_run(&config.data_dir, &config.keyword, config.max_results);
    info!(
        keyword = %config.keyword,
        urls = urls.len(),
        store = ?store.path(),
        "Downloading abstracts"
    );

    let progress = ProgressBar::new(urls.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress.set_message("Downloading abstracts");

    let mut outcomes = Vec::with_capacity(urls.len());

    for url in &urls {
        match process_url(fetcher, url, &store).await {
            Ok(record) => {
                info!(url = %url, title = %record.title, "Abstract saved");
                outcomes.push(UrlOutcome::Saved {
                    url: url.clone(),
                    title: record.title,
                });
            }
            Err(e) => {
                error!(
                    url = %url,
                    keyword = %config.keyword,
                    max_results = config.max_results,
                    error = %e,
                    "Failed to process article, skipping"
                );
                outcomes.push(UrlOutcome::Skipped {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();

    let report = RunReport {
        keyword: config.keyword.clone(),
        attempted: urls.len(),
        outcomes,
        store_path: store.path().to_path_buf(),
    };

    info!(
        keyword = %report.keyword,
        attempted = report.attempted,
        saved = report.saved(),
        skipped = report.skipped(),
        "Run complete"
    );

    Ok(report)
}

/// Fetch one article page, extract its record and merge it into the store.
async fn process_url(
    fetcher: &dyn PageSource,
    url: &str,
    store: &AbstractStore,
) -> Result<AbstractRecord> {
    let html = fetcher.fetch_page(url).await?;
    let record = extract::extract_abstract(&html)?;
    store.merge(&record)?;
    Ok(record)
}

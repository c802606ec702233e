//! rgabstracts - ResearchGate Abstract Harvester
//!
//! Scrapes ResearchGate abstracts for a keyword: Google search discovers the
//! article URLs, a stealth Chrome session renders each page, and the
//! extracted abstracts land in a keyed JSON store.
//!
//! ## Usage
//!
//! ```bash
//! rgabstracts run "banana waste" --max-results 100
//! rgabstracts harvest "banana waste" --max-results 20
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rgabstracts::browser::{BrowserProfile, ChromeFetcher};
use rgabstracts::harvest::{self, HarvestOptions};
use rgabstracts::pipeline::{self, RunConfig, UrlOutcome};
use rgabstracts::store::sanitize_keyword;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// ResearchGate Abstract Harvester
#[derive(Parser)]
#[command(name = "rgabstracts")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest article URLs and download their abstracts
    Run {
        /// Search keyword
        keyword: String,

        /// Maximum number of article URLs to harvest
        #[arg(long, default_value = "100")]
        max_results: usize,

        /// Directory receiving the JSON store
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Also write logs to a per-run file in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Run Chrome with a visible window
        #[arg(long)]
        headed: bool,

        /// Explicit Chrome binary path
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Custom search base URL (e.g., a mirror)
        #[arg(long)]
        search_url: Option<String>,
    },

    /// Only harvest article URLs and print them
    Harvest {
        /// Search keyword
        keyword: String,

        /// Maximum number of article URLs to harvest
        #[arg(long, default_value = "20")]
        max_results: usize,

        /// Run Chrome with a visible window
        #[arg(long)]
        headed: bool,

        /// Explicit Chrome binary path
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Custom search base URL (e.g., a mirror)
        #[arg(long)]
        search_url: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            keyword,
            max_results,
            data_dir,
            log_dir,
            headed,
            chrome,
            search_url,
        } => {
            init_logging(cli.debug, log_dir.as_deref(), &keyword)?;
            run_pipeline(keyword, max_results, data_dir, headed, chrome, search_url).await
        }
        Commands::Harvest {
            keyword,
            max_results,
            headed,
            chrome,
            search_url,
        } => {
            init_logging(cli.debug, None, &keyword)?;
            run_harvest(keyword, max_results, headed, chrome, search_url).await
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Initialize the tracing subscriber.
///
/// With a log directory, output goes to a per-run file named from the
/// keyword and a launch timestamp instead of the terminal.
fn init_logging(debug: bool, log_dir: Option<&Path>, keyword: &str) -> Result<()> {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            let name = format!(
                "{}_{}.log",
                sanitize_keyword(keyword),
                Local::now().format("%Y-%m-%d-%H-%M-%S")
            );
            let file = File::create(dir.join(&name)).context("Failed to create log file")?;

            fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true)
                .init();

            println!("Logging to: {}", dir.join(&name).display());
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .init();
        }
    }

    Ok(())
}

// ============================================================================
// Pipeline Run
// ============================================================================

async fn run_pipeline(
    keyword: String,
    max_results: usize,
    data_dir: PathBuf,
    headed: bool,
    chrome: Option<PathBuf>,
    search_url: Option<String>,
) -> Result<()> {
    let fetcher = ChromeFetcher::new(browser_profile(headed, chrome));
    let config = RunConfig {
        keyword,
        max_results,
        data_dir,
        search_base_url: search_url,
    };

    println!(
        "Harvesting up to {} ResearchGate abstracts for \"{}\"",
        config.max_results, config.keyword
    );

    let report = pipeline::run(&fetcher, &config)
        .await
        .context("Pipeline run failed")?;

    if report.attempted == 0 {
        println!("No article URLs found.");
        return Ok(());
    }

    println!(
        "\nAttempted {} articles: {} saved, {} skipped.",
        report.attempted,
        report.saved(),
        report.skipped()
    );
    for outcome in &report.outcomes {
        if let UrlOutcome::Skipped { url, reason } = outcome {
            println!("  skipped {} ({})", url, reason);
        }
    }

    println!("\n✓ Run complete. Abstracts in: {}", report.store_path.display());
    Ok(())
}

// ============================================================================
// URL Harvest
// ============================================================================

async fn run_harvest(
    keyword: String,
    max_results: usize,
    headed: bool,
    chrome: Option<PathBuf>,
    search_url: Option<String>,
) -> Result<()> {
    let fetcher = ChromeFetcher::new(browser_profile(headed, chrome));
    let options = HarvestOptions {
        max_results,
        base_url: search_url,
    };

    println!("Searching for up to {} article URLs...", max_results);

    let urls = harvest::harvest_urls(&fetcher, &keyword, &options)
        .await
        .context("Harvest failed")?;

    if urls.is_empty() {
        println!("No results from Google search.");
        return Ok(());
    }

    println!("Found {} article URLs:", urls.len());
    for url in &urls {
        println!("{}", url);
    }

    Ok(())
}

fn browser_profile(headed: bool, chrome: Option<PathBuf>) -> BrowserProfile {
    BrowserProfile {
        headless: !headed,
        chrome_executable: chrome,
        ..BrowserProfile::default()
    }
}

//! # rgabstracts
//!
//! ResearchGate Abstract Harvester - Google-search discovery, stealth Chrome
//! fetching, keyed JSON store
//!
//! ## Modules
//!
//! - [`browser`] - Anti-detection Chrome page fetching
//! - [`harvest`] - Article URL discovery via Google search
//! - [`extract`] - Title and abstract extraction
//! - [`store`] - Keyed JSON store on disk
//! - [`pipeline`] - Sequential run driver
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rgabstracts::browser::{BrowserProfile, ChromeFetcher};
//! use rgabstracts::pipeline::{self, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = ChromeFetcher::new(BrowserProfile::default());
//!     let report = pipeline::run(&fetcher, &RunConfig::new("banana waste", 20)).await?;
//!     println!("Saved {} of {} abstracts", report.saved(), report.attempted);
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod pipeline;
pub mod store;

pub use error::{Result, RgError};

//! On-disk abstract store.
//!
//! This module persists scraped abstracts as one JSON object per run
//! configuration, keyed by article title. Every merge is a full
//! read-modify-write of the file, so a crash mid-run loses at most the
//! record being written.

use crate::error::Result;
use crate::extract::AbstractRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Store contents: article title mapped to abstract text
pub type StoreMap = BTreeMap<String, String>;

/// Strip a keyword down to characters safe for a filename.
///
/// Keeps alphanumerics, spaces, hyphens and underscores, then replaces
/// spaces with underscores.
pub fn sanitize_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Store filename for one run configuration, e.g.
/// `2026-08-25_banana_waste_100_abstracts.json`.
pub fn store_file_name(keyword: &str, max_results: usize, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}_abstracts.json",
        date.format("%Y-%m-%d"),
        sanitize_keyword(keyword),
        max_results
    )
}

/// Keyed JSON store accumulating extracted abstracts across a run.
pub struct AbstractStore {
    path: PathBuf,
}

impl AbstractStore {
    /// Create a store for one run configuration, dated today, inside `data_dir`.
    pub fn for_run(data_dir: &Path, keyword: &str, max_results: usize) -> Self {
        let name = store_file_name(keyword, max_results, chrono::Local::now().date_naive());
        Self {
            path: data_dir.join(name),
        }
    }

    /// Create a store at an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current store contents.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is an
    /// error, because merging on top of it would silently replace whatever
    /// was already collected.
    pub fn load(&self) -> Result<StoreMap> {
        if !self.path.exists() {
            debug!("Store file not present yet: {:?}", self.path);
            return Ok(StoreMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let entries: StoreMap = serde_json::from_str(&content)?;
        debug!("Loaded {} stored abstracts from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    /// Merge one record into the store, creating the file on first write.
    ///
    /// A record whose title is already stored overwrites the old abstract.
    pub fn merge(&self, record: &AbstractRecord) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(record.title.clone(), record.abstract_text.clone());

        let content = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, content)?;

        info!("Saved abstract to {:?} ({} total)", self.path, entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(title: &str, text: &str) -> AbstractRecord {
        AbstractRecord {
            title: title.to_string(),
            abstract_text: text.to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = AbstractStore::with_path(PathBuf::from("/nonexistent/store.json"));
        let entries = store.load().expect("Missing file should load as empty");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_merge_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let store = AbstractStore::with_path(dir.path().join("store.json"));

        store.merge(&record("Paper A", "Abstract A"))?;

        assert!(store.path().exists());
        let entries = store.load()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("Paper A").map(String::as_str), Some("Abstract A"));
        Ok(())
    }

    #[test]
    fn test_merge_preserves_existing_entries() -> Result<()> {
        let dir = tempdir()?;
        let store = AbstractStore::with_path(dir.path().join("store.json"));

        store.merge(&record("Paper A", "Abstract A"))?;
        store.merge(&record("Paper B", "Abstract B"))?;

        let entries = store.load()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("Paper A").map(String::as_str), Some("Abstract A"));
        assert_eq!(entries.get("Paper B").map(String::as_str), Some("Abstract B"));
        Ok(())
    }

    #[test]
    fn test_merge_overwrites_same_title() -> Result<()> {
        let dir = tempdir()?;
        let store = AbstractStore::with_path(dir.path().join("store.json"));

        store.merge(&record("Paper A", "Old abstract"))?;
        store.merge(&record("Paper A", "New abstract"))?;

        let entries = store.load()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("Paper A").map(String::as_str), Some("New abstract"));
        Ok(())
    }

    #[test]
    fn test_merge_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let store = AbstractStore::with_path(dir.path().join("store.json"));
        let rec = record("Paper A", "Abstract A");

        store.merge(&rec)?;
        store.merge(&rec)?;

        let entries = store.load()?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_corrupt_store_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not valid json")?;

        let store = AbstractStore::with_path(path);

        assert!(store.load().is_err());
        assert!(store.merge(&record("Paper A", "Abstract A")).is_err());
        Ok(())
    }

    #[test]
    fn test_store_file_name_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).expect("Valid date");

        assert_eq!(
            store_file_name("banana waste", 100, date),
            "2026-08-25_banana_waste_100_abstracts.json"
        );
    }

    #[test]
    fn test_sanitize_keyword() {
        assert_eq!(sanitize_keyword("banana waste"), "banana_waste");
        assert_eq!(sanitize_keyword("C. elegans: review?"), "C_elegans_review");
        assert_eq!(sanitize_keyword("  padded  "), "padded");
        assert_eq!(sanitize_keyword("micro-RNA_2"), "micro-RNA_2");
    }
}

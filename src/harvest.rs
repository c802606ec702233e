//! Search-results harvesting module.
//!
//! This module walks paginated Google results for a site-restricted keyword
//! query and collects every ResearchGate article URL found along the way.
//! Page rendering goes through the injected [`PageSource`], so the walk
//! itself is browser-free and testable.

use crate::browser::{self, PageSource};
use crate::error::{Result, RgError};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Default Google search base URL
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com";

/// Site restriction applied to every query
const TARGET_SITE: &str = "researchgate.net";

/// Results per Google search page
const PAGE_SIZE: usize = 10;

/// Pattern for article links on the target site
const RESULT_URL_PATTERN: &str = r"https?://www\.researchgate\.net\S+";

/// Harvest options for the search walk
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Upper bound on returned URLs; also fixes the page count
    pub max_results: usize,
    /// Custom base URL for mirror sites
    pub base_url: Option<String>,
}

impl HarvestOptions {
    /// Options for up to `max_results` URLs against the default search base.
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            base_url: None,
        }
    }
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Collect up to `max_results` article URLs from paginated search results.
///
/// Requests `max_results / 10` pages, so anything under 10 loads no pages at
/// all. The walk stops early once the quota is met or a page contributes
/// nothing, and the final list is truncated to `max_results`.
///
/// # Arguments
///
/// * `fetcher` - Page source used to render each search page
/// * `keyword` - Search keyword, combined with the site restriction
/// * `options` - Harvest options
///
/// # Errors
///
/// Returns [`RgError::Challenge`] if a search page turns out to be a
/// bot-detection wall; fetch errors propagate unchanged.
pub async fn harvest_urls(
    fetcher: &dyn PageSource,
    keyword: &str,
    options: &HarvestOptions,
) -> Result<Vec<String>> {
    let search_base = options
        .base_url
        .as_ref()
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());

    let pages_to_load = options.max_results / PAGE_SIZE;

    info!(
        keyword,
        url = %search_base,
        pages = pages_to_load,
        "Loading Google search result pages"
    );

    let mut harvested: Vec<String> = Vec::new();

    for page_num in 0..pages_to_load {
        let start = page_num * PAGE_SIZE;
        let url = build_search_url(&search_base, keyword, start)?;

        debug!(page = page_num + 1, url = %url, "Fetching search page");

        let html = fetcher.fetch_page(url.as_str()).await?;
        if browser::is_challenge_page(&html) {
            return Err(RgError::Challenge {
                url: url.to_string(),
            });
        }

        let found = extract_result_urls(&html)?;
        info!(page = page_num + 1, count = found.len(), "Parsed search page");

        let page_was_empty = found.is_empty();
        harvested.extend(found);

        if harvested.len() >= options.max_results || page_was_empty {
            info!(total = harvested.len(), "Stopping harvest early");
            break;
        }
    }

    harvested.truncate(options.max_results);
    info!(total = harvested.len(), "Harvest complete");
    Ok(harvested)
}

/// Build one Google search URL for the site-restricted query.
///
/// `start` is Google's pagination offset (0, 10, 20, ...).
fn build_search_url(base_url: &str, keyword: &str, start: usize) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/search", base_url))
        .map_err(|e| RgError::Config(format!("Invalid base URL: {}", e)))?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("q", &format!("site:{} {}", TARGET_SITE, keyword));
        params.append_pair("hl", "en-US"); // Force English locale for consistent parsing
        params.append_pair("start", &start.to_string());
    }

    Ok(url)
}

/// Pull every ResearchGate article URL out of one rendered search page.
///
/// Scans the `href` of every anchor and keeps each substring matching the
/// target-site pattern. Google wraps results in redirect URLs, so a match
/// may start mid-string; whatever trails the link (tracking parameters
/// included) is kept, exactly as the anchor carried it.
pub fn extract_result_urls(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    let anchor_selector =
        Selector::parse("a[href]").map_err(|e| RgError::Parse(e.to_string()))?;
    let url_regex =
        Regex::new(RESULT_URL_PATTERN).map_err(|e| RgError::Parse(e.to_string()))?;

    let mut urls = Vec::new();

    for anchor in document.select(&anchor_selector) {
        if let Some(href) = anchor.value().attr("href") {
            for matched in url_regex.find_iter(href) {
                urls.push(matched.as_str().to_string());
            }
        }
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a scripted sequence of pages and records every requested URL.
    struct ScriptedPages {
        pages: Vec<String>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("Lock poisoned").clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            let mut requested = self.requested.lock().expect("Lock poisoned");
            let index = requested.len();
            requested.push(url.to_string());
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        }
    }

    /// A search page whose anchors wrap the given article URLs in Google
    /// redirect links.
    fn search_page(article_urls: &[String]) -> String {
        let anchors: String = article_urls
            .iter()
            .map(|u| format!(r#"<a href="/url?q={}&sa=U&ved=xyz">result</a>"#, u))
            .collect();
        format!(
            r#"<html><body><div id="search">{}</div></body></html>"#,
            anchors
        )
    }

    fn article_urls(count: usize, offset: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                format!(
                    "https://www.researchgate.net/publication/{}_Paper",
                    offset + i
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_under_ten_results_loads_no_pages() {
        let fetcher = ScriptedPages::new(vec![search_page(&article_urls(10, 0))]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(5))
            .await
            .expect("Harvest should succeed");

        assert!(urls.is_empty());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_twenty_results_walks_two_pages() {
        let fetcher = ScriptedPages::new(vec![
            search_page(&article_urls(10, 0)),
            search_page(&article_urls(10, 10)),
        ]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(20))
            .await
            .expect("Harvest should succeed");

        assert_eq!(urls.len(), 20);
        let requested = fetcher.requested();
        assert_eq!(requested.len(), 2);
        assert!(requested[0].contains("start=0"));
        assert!(requested[1].contains("start=10"));
        assert!(requested[0].contains("q=site%3Aresearchgate.net+banana+waste"));
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let empty = "<html><body><div id=\"search\"></div></body></html>".to_string();
        let fetcher = ScriptedPages::new(vec![
            search_page(&article_urls(10, 0)),
            empty,
            search_page(&article_urls(10, 20)),
        ]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(30))
            .await
            .expect("Harvest should succeed");

        assert_eq!(urls.len(), 10);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_first_page_yields_empty_list() {
        // Three pages planned, but nothing matches on the first one
        let fetcher = ScriptedPages::new(vec![
            "<html><body>no matches</body></html>".to_string(),
            search_page(&article_urls(10, 0)),
            search_page(&article_urls(10, 10)),
        ]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(30))
            .await
            .expect("Harvest should succeed");

        assert!(urls.is_empty());
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_met_stops_early() {
        // Pages can carry more than ten matches when results are linked twice
        let fetcher = ScriptedPages::new(vec![
            search_page(&article_urls(15, 0)),
            search_page(&article_urls(15, 15)),
            search_page(&article_urls(15, 30)),
        ]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(30))
            .await
            .expect("Harvest should succeed");

        assert_eq!(urls.len(), 30);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_result_list_truncated_to_max() {
        let fetcher = ScriptedPages::new(vec![
            search_page(&article_urls(15, 0)),
            search_page(&article_urls(15, 15)),
        ]);

        let urls = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(25))
            .await
            .expect("Harvest should succeed");

        assert_eq!(urls.len(), 25);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_challenge_page_aborts_harvest() {
        let wall = r#"<html><body>
            Our systems have detected unusual traffic from your computer network.
        </body></html>"#
            .to_string();
        let fetcher = ScriptedPages::new(vec![wall]);

        let result = harvest_urls(&fetcher, "banana waste", &HarvestOptions::new(20)).await;

        assert!(matches!(result, Err(RgError::Challenge { .. })));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let fetcher = ScriptedPages::new(vec![search_page(&article_urls(10, 0))]);
        let options = HarvestOptions {
            max_results: 10,
            base_url: Some("https://google.example.org/".to_string()),
        };

        let urls = harvest_urls(&fetcher, "banana waste", &options)
            .await
            .expect("Harvest should succeed");

        assert_eq!(urls.len(), 10);
        assert!(fetcher.requested()[0].starts_with("https://google.example.org/search?"));
    }

    #[test]
    fn test_build_search_url() {
        let url = build_search_url(DEFAULT_SEARCH_URL, "banana waste", 10)
            .expect("Failed to build URL");

        assert!(url.as_str().starts_with("https://www.google.com/search?"));
        assert!(url.as_str().contains("q=site%3Aresearchgate.net+banana+waste"));
        assert!(url.as_str().contains("start=10"));
    }

    #[test]
    fn test_extract_urls_from_redirect_anchors() {
        let html = r#"
            <html><body>
                <a href="/url?q=https://www.researchgate.net/publication/1_One&sa=U">One</a>
                <a href="https://www.researchgate.net/publication/2_Two">Two</a>
                <a href="/url?q=https://example.com/elsewhere">Elsewhere</a>
                <a href="/search?q=next+page">Next</a>
            </body></html>
        "#;

        let urls = extract_result_urls(html).expect("Parse failed");

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://www.researchgate.net/publication/1_One&sa=U");
        assert_eq!(urls[1], "https://www.researchgate.net/publication/2_Two");
    }

    #[test]
    fn test_extract_urls_from_empty_html() {
        let urls = extract_result_urls("<html><body></body></html>").expect("Parse failed");
        assert!(urls.is_empty());
    }
}

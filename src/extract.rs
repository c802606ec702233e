//! Title and abstract extraction from ResearchGate article pages.
//!
//! ResearchGate marks the abstract up with schema.org microdata, so the
//! extractor keys on `div[itemprop="description"]` for the abstract body and
//! the first `h1` for the article title.

use crate::error::{OptionExt, Result, RgError};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// One scraped article: its title and abstract text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractRecord {
    /// Article title, from the first `h1` on the page
    pub title: String,
    /// Abstract body, from the first `div[itemprop="description"]`
    pub abstract_text: String,
}

/// Extract the first title/abstract pair from a rendered article page.
///
/// Pages with several description blocks or headings contribute only their
/// first of each. A page missing either element, whether from a failed load,
/// a paywall, or changed markup, is a parse error.
///
/// # Arguments
///
/// * `html` - Rendered HTML of one article page
///
/// # Errors
///
/// Returns [`RgError::Parse`] if the abstract or title element is absent.
pub fn extract_abstract(html: &str) -> Result<AbstractRecord> {
    let document = Html::parse_document(html);

    let description_selector = Selector::parse(r#"div[itemprop="description"]"#)
        .map_err(|e| RgError::Parse(e.to_string()))?;
    let heading_selector = Selector::parse("h1").map_err(|e| RgError::Parse(e.to_string()))?;

    let abstract_text = document
        .select(&description_selector)
        .next()
        .ok_or_parse("no abstract element (div[itemprop=description]) in page")?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    let title = document
        .select(&heading_selector)
        .next()
        .ok_or_parse("no title element (h1) in page")?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    Ok(AbstractRecord {
        title,
        abstract_text,
    })
}

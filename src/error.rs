//! Custom error types for rgabstracts.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, RgError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for rgabstracts operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum RgError {
    /// Browser automation error (Chrome DevTools protocol)
    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// Search engine served a bot-detection challenge instead of results
    #[error("Challenge page served at {url}")]
    Challenge {
        /// URL whose response was the challenge interstitial
        url: String,
    },

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `RgError`
pub type Result<T> = std::result::Result<T, RgError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| RgError::Parse(msg.to_string()))
    }
}

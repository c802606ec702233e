//! Anti-detection browser layer.
//!
//! Provides the [`PageSource`] capability that the harvester and pipeline
//! depend on, plus its production implementation [`ChromeFetcher`]: a
//! chromiumoxide-driven Chrome session launched fresh for every fetch, with
//! fingerprint-masking flags and a best-effort challenge-solving pass.

use crate::error::{Result, RgError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// User agent presented by the stealth profile
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.5615.138 Safari/537.36";

/// Per-CDP-request timeout for a session
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Chrome flags that mask the most common automation fingerprints
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Selectors tried, in order, by the challenge-solving pass
const CHALLENGE_SELECTORS: &[&str] = &[
    "#recaptcha-anchor",
    ".recaptcha-checkbox-border",
    "input[value='Verify you are human']",
];

/// Markers that identify a bot-detection interstitial rather than real content
const CHALLENGE_MARKERS: &[&str] = &[
    "Our systems have detected unusual traffic",
    "Solving the above CAPTCHA",
    "g-recaptcha",
];

/// Returns `true` if the rendered page is a bot-detection wall instead of the
/// content that was asked for.
pub fn is_challenge_page(html: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| html.contains(marker))
}

/// Capability for loading a URL and returning the rendered page HTML.
///
/// The harvester and pipeline depend only on this trait, so tests can run
/// them against canned pages without a browser.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load `url` and return the fully rendered HTML of the page.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Launch configuration for one stealth Chrome session.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    /// Run without a visible window
    pub headless: bool,
    /// Open the session in incognito mode
    pub incognito: bool,
    /// User agent presented to the target site
    pub user_agent: String,
    /// Navigation attempts per URL before giving up
    pub reconnect_attempts: u32,
    /// Explicit Chrome binary (default: whatever chromiumoxide detects)
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            headless: true,
            incognito: true,
            user_agent: USER_AGENT.to_string(),
            reconnect_attempts: 4,
            chrome_executable: None,
        }
    }
}

/// Browser-automation page fetcher.
///
/// Every call launches and tears down its own Chrome session. Nothing is
/// shared between fetches, so each one pays the full startup cost but starts
/// from a clean fingerprint.
pub struct ChromeFetcher {
    profile: BrowserProfile,
}

impl ChromeFetcher {
    /// Create a fetcher with the given launch profile.
    pub fn new(profile: BrowserProfile) -> Self {
        Self { profile }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));

        if !self.profile.headless {
            builder = builder.with_head();
        }
        if self.profile.incognito {
            builder = builder.incognito();
        }
        if let Some(chrome) = &self.profile.chrome_executable {
            builder = builder.chrome_executable(chrome);
        }
        for arg in STEALTH_ARGS.iter().copied() {
            builder = builder.arg(arg);
        }
        builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

        builder.build().map_err(|e| RgError::Config(e.to_string()))
    }

    async fn load_page(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(self.profile.user_agent.as_str()).await?;

        self.open_with_retry(&page, url).await?;
        self.try_solve_challenge(&page).await;

        let html = page.content().await?;
        page.close().await.ok();
        Ok(html)
    }

    /// Navigate to `url`, retrying up to `reconnect_attempts` times with a
    /// jittered pause before each attempt.
    async fn open_with_retry(&self, page: &Page, url: &str) -> Result<()> {
        let attempts = self.profile.reconnect_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            // Random delay to avoid detection
            let delay = rand::random::<u64>() % 1500 + 500;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            match page.goto(url).await {
                Ok(_) => {
                    page.wait_for_navigation().await.ok();
                    return Ok(());
                }
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "Navigation attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(RgError::Browser)
            .unwrap_or_else(|| RgError::Config("no navigation attempts configured".to_string())))
    }

    /// Best-effort pass at a visible challenge widget. Failures are ignored;
    /// the caller learns from the page content whether it worked.
    async fn try_solve_challenge(&self, page: &Page) {
        for selector in CHALLENGE_SELECTORS.iter().copied() {
            if let Ok(element) = page.find_element(selector).await {
                match element.click().await {
                    Ok(_) => {
                        debug!(selector, "Clicked challenge widget");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        return;
                    }
                    Err(e) => {
                        debug!(selector, error = %e, "Challenge widget click failed");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl PageSource for ChromeFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config).await?;

        // Drain CDP events for the lifetime of this session
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.load_page(&browser, url).await;

        if let Err(e) = browser.close().await {
            debug!(error = %e, "Browser close failed");
        }
        let _ = browser.wait().await;
        let _ = events.await;

        result
    }
}

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Registry watching behavior
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP client settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Notification feed settings
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watch.base_url.trim().is_empty() {
            return Err(AppError::validation("watch.base_url is empty"));
        }
        url::Url::parse(&self.watch.base_url)
            .map_err(|e| AppError::validation(format!("watch.base_url is not a URL: {e}")))?;
        if self.watch.lookback_days < 0 {
            return Err(AppError::validation("watch.lookback_days must be >= 0"));
        }
        if self.watch.thumb_url.trim().is_empty() {
            return Err(AppError::validation("watch.thumb_url is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.feed.service_url.trim().is_empty() {
            return Err(AppError::validation("feed.service_url is empty"));
        }
        if self.feed.page_limit == 0 || self.feed.page_limit > 100 {
            return Err(AppError::validation("feed.page_limit must be in 1..=100"));
        }
        Ok(())
    }
}

/// Registry watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// URL of the registry listing page with the "Open files:" section
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// How many days back a document still counts as new
    #[serde(default = "defaults::lookback_days")]
    pub lookback_days: i64,

    /// URL of the thumbnail image attached to root announcements
    #[serde(default = "defaults::thumb_url")]
    pub thumb_url: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            lookback_days: defaults::lookback_days(),
            thumb_url: defaults::thumb_url(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between detail page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Notification feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the feed's XRPC service
    #[serde(default = "defaults::service_url")]
    pub service_url: String,

    /// Page size when scanning recent posts for dedup and purge.
    /// The service caps this at 100; older posts are never scanned.
    #[serde(default = "defaults::page_limit")]
    pub page_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            service_url: defaults::service_url(),
            page_limit: defaults::page_limit(),
        }
    }
}

mod defaults {
    // Watch defaults
    pub fn base_url() -> String {
        "https://www.fedcourt.gov.au/services/access-to-files-and-transcripts/online-files".into()
    }
    pub fn lookback_days() -> i64 {
        2
    }
    pub fn thumb_url() -> String {
        "https://www.fedcourt.gov.au/_design/images/apple-touch-icon.png".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; fedwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Feed defaults
    pub fn service_url() -> String {
        "https://bsky.social".into()
    }
    pub fn page_limit() -> u32 {
        100
    }
}

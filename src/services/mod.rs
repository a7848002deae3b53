//! Service layer for the fedwatch application.
//!
//! This module contains the markup extraction logic:
//! - Case listing extraction (`case_list`)
//! - Document table extraction (`documents`)
//! - Link span detection for rich text (`links`)

pub mod case_list;
pub mod documents;
pub mod links;

use async_trait::async_trait;
use scraper::Selector;

use crate::error::{AppError, Result};

/// Fetches raw markup for a URL.
///
/// Fetch failures are fatal for the page being processed; retry policy
/// belongs to the caller.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Live fetcher backed by a reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("a[href]").is_ok());
        assert!(parse_selector("td, th").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }
}

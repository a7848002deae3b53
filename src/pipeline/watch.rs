// src/pipeline/watch.rs

//! Detection run over the registry listing.
//!
//! Cases are processed strictly sequentially, in listing order. Each case is
//! an independent unit: a fetch or publish failure is logged and counted,
//! and the run continues with the next case. Ordering matters because a
//! reply cannot reference a root that does not exist yet.

use std::time::Duration;

use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::feed::NotificationStore;
use crate::models::{CaseLink, Config};
use crate::pipeline::publish::{PublishOutcome, Publisher};
use crate::services::{PageFetcher, case_list, documents};
use crate::utils;

/// Summary of one detection run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WatchOutcome {
    /// Cases found under "Open files:"
    pub cases: usize,
    /// New announcement threads created
    pub published: usize,
    /// Cases with no recent documents or an already-announced update
    pub skipped: usize,
    /// Cases that failed to fetch, parse, or publish
    pub failures: usize,
}

/// Run one detection pass using today's date for the lookback window.
pub async fn run_watch<F, S>(
    config: &Config,
    fetcher: &F,
    publisher: &Publisher<'_, S>,
) -> Result<WatchOutcome>
where
    F: PageFetcher,
    S: NotificationStore,
{
    run_watch_at(config, fetcher, publisher, Utc::now().date_naive()).await
}

/// Run one detection pass with an explicit reference date.
///
/// The date is captured once so every case in the run shares one window.
pub async fn run_watch_at<F, S>(
    config: &Config,
    fetcher: &F,
    publisher: &Publisher<'_, S>,
    today: NaiveDate,
) -> Result<WatchOutcome>
where
    F: PageFetcher,
    S: NotificationStore,
{
    let listing = fetcher.fetch(&config.watch.base_url).await?;
    let cases = case_list::extract(&listing)?;

    if cases.is_empty() {
        log::info!("No cases listed under \"Open files:\"");
        return Ok(WatchOutcome::default());
    }
    log::info!("Found {} open files", cases.len());

    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let mut outcome = WatchOutcome {
        cases: cases.len(),
        ..WatchOutcome::default()
    };

    for case in &cases {
        match process_case(config, fetcher, publisher, case, today).await {
            Ok(Some(PublishOutcome::Created(node))) => {
                outcome.published += 1;
                log::info!("Published thread for {}: {}", case.name, node.post.uri);
            }
            Ok(Some(PublishOutcome::AlreadyAnnounced(_))) => {
                outcome.skipped += 1;
            }
            Ok(None) => {
                outcome.skipped += 1;
                log::debug!("No recent documents for {}", case.name);
            }
            Err(error) => {
                outcome.failures += 1;
                log::error!("Failed to process case {} ({}): {}", case.name, case.url, error);
            }
        }

        if delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }
    }

    log::info!(
        "Run complete: {} cases, {} published, {} skipped, {} failed",
        outcome.cases,
        outcome.published,
        outcome.skipped,
        outcome.failures
    );

    Ok(outcome)
}

/// Process a single case to completion, including its entire reply chain.
async fn process_case<F, S>(
    config: &Config,
    fetcher: &F,
    publisher: &Publisher<'_, S>,
    case: &CaseLink,
    today: NaiveDate,
) -> Result<Option<PublishOutcome>>
where
    F: PageFetcher,
    S: NotificationStore,
{
    let case_url =
        utils::resolve(&config.watch.base_url, &case.url).unwrap_or_else(|| case.url.clone());

    let html = fetcher.fetch(&case_url).await?;
    let activity = documents::extract(&html, &case_url, today, config.watch.lookback_days)?;

    if !activity.has_recent_documents() {
        return Ok(None);
    }

    let outcome = publisher.publish_case_update(&case.name, &activity).await?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::error::AppError;
    use crate::feed::testing::FakeFeed;

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::config(format!("no fixture for {url}")))
        }
    }

    const BASE: &str = "https://registry.test/services/online-files";

    fn config() -> Config {
        let mut config = Config::default();
        config.watch.base_url = BASE.to_string();
        config.crawler.request_delay_ms = 0;
        config
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn listing(entries: &[(&str, &str)]) -> String {
        let mut html = String::from("<div><p><strong>Open files:</strong></p><ul>");
        for (href, name) in entries {
            html.push_str(&format!(r#"<li><a href="{href}">{name}</a></li>"#));
        }
        html.push_str("</ul><p><strong>Closed files:</strong></p></div>");
        html
    }

    fn detail(date: &str) -> String {
        format!(
            "<table><tr><th>Date</th><th>Type</th><th>Document</th></tr>\
             <tr><td>{date}</td><td>Order</td><td><a href=\"/docs/o.pdf\">Orders</a></td></tr>\
             </table>"
        )
    }

    #[tokio::test]
    async fn test_run_publishes_active_case() {
        let fetcher = FakeFetcher::new(&[
            (BASE, &listing(&[("/files/nsd1-2024", "Smith v Jones")])),
            ("https://registry.test/files/nsd1-2024", &detail("15 March 2024")),
        ]);
        let store = FakeFeed::new();
        let config = config();
        let publisher = Publisher::with_thumb(&store, &config, None);

        let outcome = run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();

        assert_eq!(outcome.cases, 1);
        assert_eq!(outcome.published, 1);
        assert_eq!(outcome.failures, 0);
        // Root plus one document reply
        assert_eq!(store.posts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_quiet_case_is_skipped() {
        let fetcher = FakeFetcher::new(&[
            (BASE, &listing(&[("/files/nsd1-2024", "Smith v Jones")])),
            ("https://registry.test/files/nsd1-2024", &detail("01 January 2024")),
        ]);
        let store = FakeFeed::new();
        let config = config();
        let publisher = Publisher::with_thumb(&store, &config, None);

        let outcome = run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.published, 0);
        assert_eq!(store.create_count(), 0);
    }

    #[tokio::test]
    async fn test_one_failing_case_does_not_abort_the_run() {
        let fetcher = FakeFetcher::new(&[
            (
                BASE,
                &listing(&[
                    ("/files/broken", "Broken Case"),
                    ("/files/nsd2-2024", "Re Acme Pty Ltd"),
                ]),
            ),
            // No fixture for /files/broken: its fetch fails.
            ("https://registry.test/files/nsd2-2024", &detail("15 March 2024")),
        ]);
        let store = FakeFeed::new();
        let config = config();
        let publisher = Publisher::with_thumb(&store, &config, None);

        let outcome = run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();

        assert_eq!(outcome.failures, 1);
        assert_eq!(outcome.published, 1);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let fetcher = FakeFetcher::new(&[(BASE, "<p>Registry moved elsewhere.</p>")]);
        let store = FakeFeed::new();
        let config = config();
        let publisher = Publisher::with_thumb(&store, &config, None);

        let outcome = run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();
        assert_eq!(outcome, WatchOutcome::default());
    }

    #[tokio::test]
    async fn test_second_run_publishes_nothing_new() {
        let fetcher = FakeFetcher::new(&[
            (BASE, &listing(&[("/files/nsd1-2024", "Smith v Jones")])),
            ("https://registry.test/files/nsd1-2024", &detail("15 March 2024")),
        ]);
        let store = FakeFeed::new();
        let config = config();
        let publisher = Publisher::with_thumb(&store, &config, None);

        run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();
        let created = store.create_count();

        let outcome = run_watch_at(&config, &fetcher, &publisher, today())
            .await
            .unwrap();
        assert_eq!(outcome.published, 0);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(store.create_count(), created);
    }
}

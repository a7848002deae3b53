// src/pipeline/publish.rs

//! Idempotent case update publishing.
//!
//! Every case update has a stable identifier derived from the case id and
//! the most recent activity date. The identifier is embedded verbatim in the
//! root announcement's text, and the feed itself is the durable store: a
//! scan of the account's recent posts for that substring decides whether an
//! update was already announced. Only on a miss does anything get published.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::feed::{ExternalEmbed, FeedPost, NotificationStore, PostRecord};
use crate::models::{CaseActivity, Config, DocumentRecord, ThreadNode};
use crate::pipeline::thread::ThreadChain;
use crate::services::links;
use crate::utils;

/// Result of a publish attempt for one case update.
#[derive(Debug)]
pub enum PublishOutcome {
    /// A new root (and reply chain) was created
    Created(ThreadNode),

    /// A matching identifier was found; nothing was published
    AlreadyAnnounced(ThreadNode),
}

impl PublishOutcome {
    /// Root node of the announcement thread, new or pre-existing.
    pub fn node(&self) -> &ThreadNode {
        match self {
            Self::Created(node) | Self::AlreadyAnnounced(node) => node,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Stable identifier for a case update.
///
/// This exact substring is embedded in every root announcement and matched
/// against on later runs, so its format is a wire contract: changing it
/// breaks dedup across runs.
pub fn update_identifier(case_id: &str, most_recent: NaiveDate) -> String {
    format!("{case_id}::{}", most_recent.format("%Y-%m-%d"))
}

/// Publishes case updates against a notification store.
pub struct Publisher<'a, S: NotificationStore> {
    store: &'a S,
    config: &'a Config,
    thumb: Option<serde_json::Value>,
}

impl<'a, S: NotificationStore> Publisher<'a, S> {
    /// Create a publisher, fetching and uploading the embed thumbnail once.
    ///
    /// A thumbnail fetch failure is an error here rather than a silently
    /// missing embed on every later post.
    pub async fn new(store: &'a S, config: &'a Config, client: &reqwest::Client) -> Result<Self> {
        let bytes = client
            .get(&config.watch.thumb_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let thumb = store.upload_blob(bytes.to_vec(), "image/png").await?;
        log::debug!("Cached embed thumbnail from {}", config.watch.thumb_url);

        Ok(Self {
            store,
            config,
            thumb: Some(thumb),
        })
    }

    /// Create a publisher with an already-uploaded (or absent) thumbnail.
    pub fn with_thumb(
        store: &'a S,
        config: &'a Config,
        thumb: Option<serde_json::Value>,
    ) -> Self {
        Self {
            store,
            config,
            thumb,
        }
    }

    /// Announce a case update: one root post plus one reply per recent
    /// document, in table row order. Re-running for an unchanged case
    /// publishes nothing.
    pub async fn publish_case_update(
        &self,
        case_name: &str,
        activity: &CaseActivity,
    ) -> Result<PublishOutcome> {
        let most_recent = activity.most_recent.ok_or_else(|| {
            AppError::publish(activity.case_url.clone(), "no dated activity to announce")
        })?;

        let case_id = utils::case_id_from_url(&activity.case_url);
        let identifier = update_identifier(&case_id, most_recent);

        if let Some(existing) = self.find_existing(&identifier).await? {
            log::info!("Update {} already announced, nothing to do", identifier);
            let spans = links::find_links(&existing.text);
            return Ok(PublishOutcome::AlreadyAnnounced(ThreadNode {
                text: existing.text,
                spans,
                reply: None,
                post: existing.post,
            }));
        }

        let mut chain = ThreadChain::new();

        let text = format!(
            "{case_name} has new documents\n{}\nUpdated: {}\n\n{identifier}",
            activity.case_url,
            most_recent.format("%d %B %Y"),
        );
        let spans = links::find_links(&text);
        let record = PostRecord::new(text.clone())
            .with_facets(links::to_facets(&spans))
            .with_embed(ExternalEmbed::new(
                activity.case_url.clone(),
                case_name,
                format!("Updated {}", most_recent.format("%d %B %Y")),
                self.thumb.clone(),
            ));

        let root_post = self.store.create_post(&record).await?;
        log::info!("Announced {} as {}", identifier, root_post.uri);
        chain.advance(root_post.clone());

        let root = ThreadNode {
            text,
            spans,
            reply: None,
            post: root_post,
        };

        for doc in &activity.recent_documents {
            let text = self.document_text(doc);
            let spans = links::find_links(&text);
            let reply = chain.next_ref();

            let mut record = PostRecord::new(text).with_facets(links::to_facets(&spans));
            if let Some(reply) = reply {
                record = record.with_reply(reply);
            }

            let post = self.store.create_post(&record).await?;
            log::debug!("Replied with document {:?} as {}", doc.name, post.uri);
            chain.advance(post);
        }

        Ok(PublishOutcome::Created(root))
    }

    fn document_text(&self, doc: &DocumentRecord) -> String {
        let mut text = format!(
            "{}\nPublished: {}",
            doc.name,
            doc.published.format("%d %B %Y")
        );
        if let Some(href) = &doc.url {
            let absolute = utils::resolve(&self.config.watch.base_url, href)
                .unwrap_or_else(|| href.clone());
            text.push('\n');
            text.push_str(&absolute);
        }
        text
    }

    /// Scan recent non-reply posts for the identifier marker.
    ///
    /// Only the most recent page is scanned, and matching is by substring;
    /// both are accepted boundary conditions of using the feed as the store.
    async fn find_existing(&self, identifier: &str) -> Result<Option<FeedPost>> {
        let recent = self.store.list_recent(self.config.feed.page_limit).await?;
        Ok(recent.into_iter().find(|p| p.text.contains(identifier)))
    }
}

//! Notification feed abstractions.
//!
//! The feed doubles as the durable store for idempotency: the publisher
//! scans the account's recent posts for an identifier marker before creating
//! anything. `NotificationStore` keeps that lookup-and-write surface behind
//! a trait so the dedup policy can be tested against an in-memory fake,
//! while `BskyFeed` implements it over the live XRPC protocol.

pub mod bsky;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{LinkSpan, PostRef, ReplyRef};

// Re-export for convenience
pub use bsky::BskyFeed;

/// Record collection for feed posts.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// A post read back from the feed, reduced to what dedup needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    /// Handle of the post
    pub post: PostRef,

    /// Post text as stored
    pub text: String,
}

/// One byte-addressed rich-text annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

impl Facet {
    /// Build a link facet from a detected span.
    pub fn link(span: &LinkSpan) -> Self {
        Self {
            index: ByteSlice {
                byte_start: span.start,
                byte_end: span.end,
            },
            features: vec![FacetFeature::Link {
                uri: span.url.clone(),
            }],
        }
    }
}

/// Half-open byte range into the UTF-8 encoding of the post text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ByteSlice {
    #[serde(rename = "byteStart")]
    pub byte_start: usize,

    #[serde(rename = "byteEnd")]
    pub byte_end: usize,
}

/// A single facet feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
}

/// External link preview attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalEmbed {
    #[serde(rename = "$type")]
    pub embed_type: String,
    pub external: ExternalLink,
}

impl ExternalEmbed {
    pub fn new(
        uri: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        thumb: Option<serde_json::Value>,
    ) -> Self {
        Self {
            embed_type: "app.bsky.embed.external".to_string(),
            external: ExternalLink {
                uri: uri.into(),
                title: title.into(),
                description: description.into(),
                thumb,
            },
        }
    }
}

/// Payload of an external embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLink {
    pub uri: String,
    pub title: String,
    pub description: String,

    /// Opaque blob reference from a prior upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<serde_json::Value>,
}

/// A post record ready for publishing.
#[derive(Debug, Clone, Serialize)]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,

    pub text: String,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<ExternalEmbed>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
}

impl PostRecord {
    /// Create a bare post record with the current timestamp.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            record_type: POST_COLLECTION.to_string(),
            text: text.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            facets: Vec::new(),
            embed: None,
            reply: None,
        }
    }

    pub fn with_facets(mut self, facets: Vec<Facet>) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_embed(mut self, embed: ExternalEmbed) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn with_reply(mut self, reply: ReplyRef) -> Self {
        self.reply = Some(reply);
        self
    }
}

/// Trait for the notification store backing the publisher.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// List up to `limit` recent non-reply posts by this account,
    /// newest first. The service caps `limit` at 100.
    async fn list_recent(&self, limit: u32) -> Result<Vec<FeedPost>>;

    /// Publish a post record, returning its handle.
    async fn create_post(&self, record: &PostRecord) -> Result<PostRef>;

    /// Delete a post by its record URI.
    async fn delete_post(&self, uri: &str) -> Result<()>;

    /// Upload a binary blob, returning an opaque reference usable in embeds.
    async fn upload_blob(&self, bytes: Vec<u8>, mime: &str) -> Result<serde_json::Value>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fake store for publisher and pipeline tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::AppError;

    #[derive(Default)]
    pub struct FakeFeed {
        /// Published posts in creation order
        pub posts: Mutex<Vec<(PostRef, PostRecord)>>,
        /// URIs passed to delete_post
        pub deleted: Mutex<Vec<String>>,
        creates: AtomicUsize,
        counter: AtomicUsize,
    }

    impl FakeFeed {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-seed the feed with plain posts carrying the given texts.
        pub fn with_posts(texts: &[&str]) -> Self {
            let feed = Self::new();
            {
                let mut posts = feed.posts.lock().unwrap();
                for (i, text) in texts.iter().enumerate() {
                    posts.push((
                        PostRef {
                            uri: format!("at://did:plc:fake/app.bsky.feed.post/seed{i}"),
                            cid: format!("seedcid{i}"),
                        },
                        PostRecord::new(*text),
                    ));
                }
            }
            feed
        }

        pub fn create_count(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationStore for FakeFeed {
        async fn list_recent(&self, limit: u32) -> Result<Vec<FeedPost>> {
            let posts = self.posts.lock().unwrap();
            Ok(posts
                .iter()
                .rev()
                .filter(|(_, record)| record.reply.is_none())
                .take(limit as usize)
                .map(|(post, record)| FeedPost {
                    post: post.clone(),
                    text: record.text.clone(),
                })
                .collect())
        }

        async fn create_post(&self, record: &PostRecord) -> Result<PostRef> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            self.creates.fetch_add(1, Ordering::SeqCst);
            let post = PostRef {
                uri: format!("at://did:plc:fake/app.bsky.feed.post/{n}"),
                cid: format!("cid{n}"),
            };
            self.posts
                .lock()
                .unwrap()
                .push((post.clone(), record.clone()));
            Ok(post)
        }

        async fn delete_post(&self, uri: &str) -> Result<()> {
            let mut posts = self.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|(post, _)| post.uri != uri);
            if posts.len() == before {
                return Err(AppError::feed(400, format!("no such record: {uri}")));
            }
            self.deleted.lock().unwrap().push(uri.to_string());
            Ok(())
        }

        async fn upload_blob(&self, _bytes: Vec<u8>, mime: &str) -> Result<serde_json::Value> {
            Ok(serde_json::json!({ "$type": "blob", "mimeType": mime }))
        }
    }
}

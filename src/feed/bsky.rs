// src/feed/bsky.rs

//! Live Bluesky feed client.
//!
//! Speaks XRPC over HTTP against a configurable service URL. Every non-2xx
//! response is surfaced as a feed error; retry policy belongs to the caller.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::feed::{FeedPost, NotificationStore, POST_COLLECTION, PostRecord};
use crate::models::{FeedConfig, PostRef};

/// Authenticated XRPC client for one account.
pub struct BskyFeed {
    client: reqwest::Client,
    service_url: String,
    did: String,
    access_jwt: String,
    handle: String,
}

#[derive(Debug, serde::Deserialize)]
struct SessionResponse {
    #[serde(rename = "accessJwt")]
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Debug, serde::Deserialize)]
struct AuthorFeedResponse {
    feed: Vec<FeedItem>,
}

#[derive(Debug, serde::Deserialize)]
struct FeedItem {
    post: PostView,
}

#[derive(Debug, serde::Deserialize)]
struct PostView {
    uri: String,
    cid: String,
    record: RecordView,
}

#[derive(Debug, serde::Deserialize)]
struct RecordView {
    #[serde(default)]
    text: String,
}

#[derive(Debug, serde::Deserialize)]
struct BlobResponse {
    blob: serde_json::Value,
}

impl BskyFeed {
    /// Create an authenticated session for the account.
    pub async fn login(
        client: reqwest::Client,
        config: &FeedConfig,
        identifier: &str,
        password: &str,
    ) -> Result<Self> {
        let service_url = config.service_url.trim_end_matches('/').to_string();
        let url = format!("{service_url}/xrpc/com.atproto.server.createSession");

        let resp = client
            .post(&url)
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": password,
            }))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let session: SessionResponse = resp.json().await?;

        log::info!("Logged in to {} as {}", service_url, session.handle);

        Ok(Self {
            client,
            service_url,
            did: session.did,
            access_jwt: session.access_jwt,
            handle: session.handle,
        })
    }

    /// Account handle for this session.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    fn xrpc(&self, nsid: &str) -> String {
        format!("{}/xrpc/{nsid}", self.service_url)
    }
}

#[async_trait]
impl NotificationStore for BskyFeed {
    async fn list_recent(&self, limit: u32) -> Result<Vec<FeedPost>> {
        let limit = limit.to_string();
        let resp = self
            .client
            .get(self.xrpc("app.bsky.feed.getAuthorFeed"))
            .bearer_auth(&self.access_jwt)
            .query(&[
                ("actor", self.did.as_str()),
                ("filter", "posts_no_replies"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let feed: AuthorFeedResponse = resp.json().await?;

        Ok(feed
            .feed
            .into_iter()
            .map(|item| FeedPost {
                post: PostRef {
                    uri: item.post.uri,
                    cid: item.post.cid,
                },
                text: item.post.record.text,
            })
            .collect())
    }

    async fn create_post(&self, record: &PostRecord) -> Result<PostRef> {
        let resp = self
            .client
            .post(self.xrpc("com.atproto.repo.createRecord"))
            .bearer_auth(&self.access_jwt)
            .json(&serde_json::json!({
                "repo": self.did,
                "collection": POST_COLLECTION,
                "record": record,
            }))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    async fn delete_post(&self, uri: &str) -> Result<()> {
        let (repo, rkey) = split_record_uri(uri)?;
        let resp = self
            .client
            .post(self.xrpc("com.atproto.repo.deleteRecord"))
            .bearer_auth(&self.access_jwt)
            .json(&serde_json::json!({
                "repo": repo,
                "collection": POST_COLLECTION,
                "rkey": rkey,
            }))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn upload_blob(&self, bytes: Vec<u8>, mime: &str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(self.xrpc("com.atproto.repo.uploadBlob"))
            .bearer_auth(&self.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let out: BlobResponse = resp.json().await?;
        Ok(out.blob)
    }
}

/// Surface a non-2xx response as a feed error with its body text.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::feed(status.as_u16(), body));
    }
    Ok(resp)
}

/// Split an `at://repo/collection/rkey` record URI into (repo, rkey).
fn split_record_uri(uri: &str) -> Result<(&str, &str)> {
    let rest = uri
        .strip_prefix("at://")
        .ok_or_else(|| AppError::validation(format!("not an at:// URI: {uri}")))?;
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(repo), Some(_collection), Some(rkey)) if !repo.is_empty() && !rkey.is_empty() => {
            Ok((repo, rkey))
        }
        _ => Err(AppError::validation(format!("malformed record URI: {uri}"))),
    }
}

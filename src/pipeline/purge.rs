// src/pipeline/purge.rs

//! Operational reset: delete recent announcements.

use crate::error::Result;
use crate::feed::NotificationStore;

/// Delete up to `limit` recent non-reply posts by this account.
///
/// The same page-size horizon applies as for dedup: posts older than the
/// most recent page are left untouched. Returns the number of posts deleted.
pub async fn run_purge<S: NotificationStore>(store: &S, limit: u32) -> Result<usize> {
    let posts = store.list_recent(limit).await?;
    if posts.is_empty() {
        log::info!("Nothing to purge");
        return Ok(0);
    }

    for post in &posts {
        log::debug!("Deleting {}", post.post.uri);
        store.delete_post(&post.post.uri).await?;
    }

    log::info!("Deleted {} posts", posts.len());
    Ok(posts.len())
}

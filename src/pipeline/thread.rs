//! Reply chain sequencing.
//!
//! A thread is a root post plus a linear chain of replies. Every reply
//! carries two references: its immediate parent and the thread root, which
//! is identical for all posts in the chain. This sequencing is pure state,
//! separate from network I/O, so it can be tested without a live feed.

use crate::models::{PostRef, ReplyRef};

/// Tracks the root and most recent post of a thread under construction.
#[derive(Debug, Clone, Default)]
pub struct ThreadChain {
    root: Option<PostRef>,
    prev: Option<PostRef>,
}

impl ThreadChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply reference for the next post: absent before the root is
    /// published, afterwards `{parent: previous post, root: first post}`.
    pub fn next_ref(&self) -> Option<ReplyRef> {
        match (&self.root, &self.prev) {
            (Some(root), Some(prev)) => Some(ReplyRef {
                root: root.clone(),
                parent: prev.clone(),
            }),
            _ => None,
        }
    }

    /// Record a newly published post as the chain tail.
    pub fn advance(&mut self, post: PostRef) {
        if self.root.is_none() {
            self.root = Some(post.clone());
        }
        self.prev = Some(post);
    }

    /// Root of the chain, if any post has been published.
    pub fn root(&self) -> Option<&PostRef> {
        self.root.as_ref()
    }
}

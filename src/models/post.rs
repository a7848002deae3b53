//! Notification post data structures.

use serde::{Deserialize, Serialize};

/// A URL occurrence inside post text.
///
/// Offsets are byte offsets into the UTF-8 encoding of the text, half-open.
/// The downstream rich-text protocol addresses annotations by byte range,
/// so these must never be character offsets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte offset of the first byte of the URL
    pub start: usize,

    /// Byte offset one past the last byte of the URL
    pub end: usize,

    /// The matched URL
    pub url: String,
}

/// Stable handle pair identifying a published post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRef {
    /// Record URI (`at://...`)
    pub uri: String,

    /// Content hash of the record
    pub cid: String,
}

/// Reply reference carried by every non-root post in a thread.
///
/// All posts in one thread share the same `root`; `parent` is the
/// immediately preceding post in the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyRef {
    pub root: PostRef,
    pub parent: PostRef,
}

/// One published notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    /// Post text as published
    pub text: String,

    /// Link spans detected in the text
    pub spans: Vec<LinkSpan>,

    /// Reply reference, absent for the thread root
    pub reply: Option<ReplyRef>,

    /// Handle of the published post
    pub post: PostRef,
}

// src/services/links.rs

//! Link span detection for rich text.
//!
//! The notification protocol addresses text annotations by UTF-8 byte range,
//! so URL matching runs over the encoded bytes and every span carries byte
//! offsets, never character offsets.

use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::feed::Facet;
use crate::models::LinkSpan;

/// Matches an http(s) URL preceded by start-of-text or a non-word character.
/// The optional path/query tail must not end on sentence-closing punctuation.
const URL_PATTERN: &str = r"(?:^|\W)(https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_+.~#?&/=]*[-a-zA-Z0-9@%_+~#/=])?)";

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"))
}

/// Scan text for embedded URLs, returning byte-accurate spans.
pub fn find_links(text: &str) -> Vec<LinkSpan> {
    let bytes = text.as_bytes();
    url_pattern()
        .captures_iter(bytes)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let url = std::str::from_utf8(m.as_bytes()).ok()?.to_string();
            Some(LinkSpan {
                start: m.start(),
                end: m.end(),
                url,
            })
        })
        .collect()
}

/// Wrap detected spans into link-annotation facets for the wire payload.
pub fn to_facets(spans: &[LinkSpan]) -> Vec<Facet> {
    spans.iter().map(Facet::link).collect()
}

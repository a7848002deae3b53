// src/models/mod.rs

//! Domain models for the fedwatch application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod case;
mod config;
mod post;

// Re-export all public types
pub use case::{CaseActivity, CaseLink, DocumentRecord};
pub use config::{Config, CrawlerConfig, FeedConfig, WatchConfig};
pub use post::{LinkSpan, PostRef, ReplyRef, ThreadNode};

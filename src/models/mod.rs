// src/models/mod.rs

//! Domain models for the archive.
//!
//! This module contains the data structures shared by the store client,
//! the sync services and the query pipeline.

mod block;
mod config;
mod entry;
mod facet;

// Re-export all public types
pub use block::{Block, BlockKind};
pub use config::{Config, LoggingConfig, PropertyNames, ServerConfig, StoreConfig, SyncConfig};
pub use entry::{Entry, PropertyValue};
pub use facet::FacetBucket;

/// One page of catalog results as issued by the store.
#[derive(Debug, Clone, Default)]
pub struct EntryPage {
    pub results: Vec<Entry>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

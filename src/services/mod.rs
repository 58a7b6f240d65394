//! Service layer for the archive.
//!
//! This module contains the store-facing logic for:
//! - Catalog listing across pages (`CatalogFetcher`)
//! - Body fetching and the full-text cache (`ContentCache`)

mod catalog;
mod content;

pub use catalog::{CatalogFetcher, DEFAULT_PAGE_SIZE};
pub use content::{CacheSlot, ContentCache, fetch_entry_text};

//! Document store abstractions.
//!
//! The archive only ever reads from the store, through two capabilities:
//!
//! ```text
//! query(source, cursor, page_size) -> { results, has_more, next_cursor }
//! list_blocks(entry)               -> [Block]
//! ```
//!
//! - [`NotionStore`]: the HTTP client used in production
//! - [`MemoryStore`]: fixture-backed store for offline runs and tests

pub mod memory;
pub mod notion;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Block, Config, EntryPage};

// Re-export for convenience
pub use memory::{FIXTURE_SOURCE, MemoryStore};
pub use notion::NotionStore;

/// Trait for read-only document store backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one page of entries from `source_id`, starting at `cursor`.
    async fn query(
        &self,
        source_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<EntryPage>;

    /// Fetch the ordered body blocks of one entry.
    async fn list_blocks(&self, entry_id: &str) -> Result<Vec<Block>>;

    /// Source id the store serves regardless of configuration, if any.
    fn builtin_source(&self) -> Option<&str> {
        None
    }
}

/// Open the fixture store when a fixture path is given, the HTTP store otherwise.
pub fn open(config: &Config, fixture: Option<&Path>) -> Result<Arc<dyn DocumentStore>> {
    match fixture {
        Some(path) => {
            log::info!("Using fixture store from {}", path.display());
            Ok(Arc::new(MemoryStore::load(path)?))
        }
        None => Ok(Arc::new(NotionStore::from_config(config)?)),
    }
}

//! In-memory document store.
//!
//! Serves a fixed set of entries and bodies, either built in code or loaded
//! from a JSON fixture:
//!
//! ```json
//! {
//!   "entries": [{ "id": "a", "title": "Keiko", "date": "2024-01-05" }],
//!   "blocks": { "a": [{ "kind": "paragraph", "text": ["Men strikes"] }] }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Block, Entry, EntryPage};
use crate::store::DocumentStore;

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    blocks: HashMap<String, Vec<Block>>,
}

/// Fixture-backed store. Cursors are stringified offsets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry>,
    blocks: HashMap<String, Vec<Block>>,
    failing: HashSet<String>,
    queries: AtomicUsize,
    source: Option<String>,
}

/// Source id a loaded fixture answers to when none is configured.
pub const FIXTURE_SOURCE: &str = "fixture";

impl MemoryStore {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Load a store from a JSON fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        Ok(Self {
            entries: fixture.entries,
            blocks: fixture.blocks,
            source: Some(FIXTURE_SOURCE.to_string()),
            ..Self::default()
        })
    }

    /// Attach a body to an entry.
    pub fn with_blocks(mut self, entry_id: impl Into<String>, blocks: Vec<Block>) -> Self {
        self.blocks.insert(entry_id.into(), blocks);
        self
    }

    /// Make body fetches for `entry_id` fail.
    pub fn failing(mut self, entry_id: impl Into<String>) -> Self {
        self.failing.insert(entry_id.into());
        self
    }

    /// Answer to `source_id` without any database being configured.
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source = Some(source_id.into());
        self
    }

    /// Number of catalog pages served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        _source_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<EntryPage> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| AppError::upstream("query", format!("invalid cursor {c:?}")))?,
            None => 0,
        };
        let end = (start + page_size.max(1)).min(self.entries.len());
        let results = self.entries.get(start..end).unwrap_or_default().to_vec();
        let has_more = end < self.entries.len();

        Ok(EntryPage {
            results,
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn list_blocks(&self, entry_id: &str) -> Result<Vec<Block>> {
        if self.failing.contains(entry_id) {
            return Err(AppError::upstream(
                format!("blocks/{entry_id}"),
                "simulated failure",
            ));
        }
        Ok(self.blocks.get(entry_id).cloned().unwrap_or_default())
    }

    fn builtin_source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

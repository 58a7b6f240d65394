// src/services/content.rs

//! Full-text content cache.
//!
//! Fetches every entry body concurrently, flattens it to text and keeps the
//! result keyed by entry id, so that searches never go back to the store.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::Entry;
use crate::pipeline::extract_text;
use crate::store::DocumentStore;

/// Fetch one entry body and flatten it to text.
pub async fn fetch_entry_text(store: &dyn DocumentStore, entry_id: &str) -> Result<String> {
    let blocks = store.list_blocks(entry_id).await?;
    Ok(extract_text(&blocks))
}

/// State of a single cached body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSlot {
    /// Fetch not yet settled
    Pending,
    /// Body fetched and flattened
    Resolved(String),
    /// Fetch failed; reads as empty text
    Failed,
}

/// Entry id → flattened body text, plus a readiness flag.
///
/// A cache is built for one entry-list snapshot and is never patched: a new
/// entry list means a new cache.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    slots: HashMap<String, CacheSlot>,
    ready: bool,
}

impl ContentCache {
    /// A not-ready cache with every entry pending.
    pub fn pending(entries: &[Entry]) -> Self {
        Self {
            slots: entries
                .iter()
                .map(|e| (e.id.clone(), CacheSlot::Pending))
                .collect(),
            ready: false,
        }
    }

    /// Build a ready cache from settled fetch results. Failures become empty text.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<String>)>,
    {
        let slots = results
            .into_iter()
            .map(|(id, result)| {
                let slot = match result {
                    Ok(text) => CacheSlot::Resolved(text),
                    Err(_) => CacheSlot::Failed,
                };
                (id, slot)
            })
            .collect();

        Self { slots, ready: true }
    }

    /// Fetch every entry body concurrently and build a ready cache.
    ///
    /// At most `concurrency` fetches are in flight. Per-entry failures are
    /// logged and cached as empty text; they never fail the population. The
    /// returned cache is only marked ready once every fetch has settled.
    pub async fn populate(
        store: &dyn DocumentStore,
        entries: &[Entry],
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);

        // Owned ids keep the fan-out future `Send` for `tokio::spawn`
        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();

        let results: Vec<(String, Result<String>)> = stream::iter(ids)
            .map(|id| async move {
                let result = fetch_entry_text(store, &id).await;
                if let Err(error) = &result {
                    log::warn!("Failed to fetch body for {}: {}", id, error);
                }
                (id, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let cache = Self::from_results(results);
        log::info!(
            "Content cache ready: {} bodies, {} failed",
            cache.len(),
            cache.failed_count()
        );
        cache
    }

    /// Whether every fetch has settled.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Cached text for an entry. Failed fetches read as `""`; pending or
    /// unknown ids read as `None`.
    pub fn get(&self, entry_id: &str) -> Option<&str> {
        match self.slots.get(entry_id)? {
            CacheSlot::Resolved(text) => Some(text),
            CacheSlot::Failed => Some(""),
            CacheSlot::Pending => None,
        }
    }

    pub fn slot(&self, entry_id: &str) -> Option<&CacheSlot> {
        self.slots.get(entry_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, CacheSlot::Failed))
            .count()
    }
}

// src/pipeline/sync.rs

//! Full catalog sync.
//!
//! Every sync rebuilds a [`Snapshot`] from scratch: list the catalog, derive
//! facets, then populate the content cache. Nothing is carried over from a
//! previous snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, Entry, FacetBucket};
use crate::pipeline::{MonthFilter, compute_facets, filter_entries};
use crate::services::{CatalogFetcher, ContentCache};
use crate::store::DocumentStore;

/// An immutable view of the archive: entries, their facets and their bodies.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<Entry>,
    facets: Vec<FacetBucket>,
    cache: ContentCache,
    synced_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// A snapshot of a freshly listed catalog whose bodies are still pending.
    pub fn warming(entries: Vec<Entry>) -> Self {
        Self {
            facets: compute_facets(&entries),
            cache: ContentCache::pending(&entries),
            entries,
            synced_at: Some(Utc::now()),
        }
    }

    /// Replace the cache wholesale.
    pub fn with_cache(self, cache: ContentCache) -> Self {
        Self { cache, ..self }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn facets(&self) -> &[FacetBucket] {
        &self.facets
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// When the catalog behind this snapshot was listed.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    /// Whether every body has been fetched and searches see final data.
    pub fn is_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// Search this snapshot. Callers should check [`Snapshot::is_ready`] first.
    pub fn search(&self, query: &str, month: &MonthFilter) -> Vec<&Entry> {
        filter_entries(&self.entries, &self.cache, query, month)
    }
}

/// The source to list: the configured database, else the store's built-in one.
pub fn resolve_source(store: &dyn DocumentStore, config: &Config) -> Result<String> {
    match config.source_id() {
        Ok(id) => Ok(id.to_string()),
        Err(e) => store.builtin_source().map(str::to_string).ok_or(e),
    }
}

/// List the catalog and return a warming snapshot.
pub async fn fetch_catalog(store: Arc<dyn DocumentStore>, config: &Config) -> Result<Snapshot> {
    let source_id = resolve_source(store.as_ref(), config)?;
    let fetcher = CatalogFetcher::with_page_size(store, config.sync.page_size);
    let entries = fetcher.fetch_all(&source_id).await?;
    Ok(Snapshot::warming(entries))
}

/// Populate the cache of a warming snapshot.
pub async fn warm(snapshot: Snapshot, store: &dyn DocumentStore, config: &Config) -> Snapshot {
    let cache =
        ContentCache::populate(store, snapshot.entries(), config.sync.max_concurrent).await;
    snapshot.with_cache(cache)
}

/// Run a full sync: catalog, facets, then content cache.
pub async fn run_sync(store: Arc<dyn DocumentStore>, config: &Config) -> Result<Snapshot> {
    let start_time = Utc::now();

    let snapshot = fetch_catalog(Arc::clone(&store), config).await?;
    log::info!(
        "Catalog listed: {} entries across {} month(s)",
        snapshot.entries().len(),
        snapshot.facets().len()
    );

    let snapshot = warm(snapshot, store.as_ref(), config).await;

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Sync complete: {} entries, {} bodies failed, {} ms",
        snapshot.entries().len(),
        snapshot.cache().failed_count(),
        elapsed.num_milliseconds()
    );

    Ok(snapshot)
}

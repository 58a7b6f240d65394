//! Pipeline entry points for archive operations.
//!
//! - `extract_text`: Flatten body blocks into markdown-like text
//! - `compute_facets`: Month buckets over the entry list
//! - `filter_entries`: Query and month filtering over the cached archive
//! - `run_sync`: Full rebuild of a [`Snapshot`]

pub mod extract;
pub mod facets;
pub mod search;
pub mod sync;

pub use extract::extract_text;
pub use facets::compute_facets;
pub use search::{MonthFilter, filter_entries};
pub use sync::{Snapshot, resolve_source, run_sync};

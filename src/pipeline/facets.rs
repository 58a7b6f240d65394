//! Month facets over the entry list.

use std::collections::BTreeMap;

use crate::models::{Entry, FacetBucket};

/// Count entries per `YYYY-MM`, newest month first.
///
/// Entries without a date are left out. Keys are fixed-width ISO prefixes,
/// so ordering the map keys in reverse is the same as ordering by month.
pub fn compute_facets(entries: &[Entry]) -> Vec<FacetBucket> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for month in entries.iter().filter_map(Entry::month_key) {
        *counts.entry(month).or_default() += 1;
    }

    counts
        .into_iter()
        .rev()
        .map(|(month, count)| FacetBucket::new(month, count))
        .collect()
}

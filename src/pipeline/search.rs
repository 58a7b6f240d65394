//! Query filtering over the cached archive.
//!
//! Matches the query against titles and cached bodies without touching the
//! store, so every keystroke can be answered from memory.

use std::fmt;
use std::str::FromStr;

use crate::models::Entry;
use crate::services::ContentCache;

/// Month restriction applied to search results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    /// Date prefix, normally `YYYY-MM`
    Month(String),
}

impl MonthFilter {
    /// Parse the boundary form: `"all"` or empty means no restriction.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "all" => Self::All,
            month => Self::Month(month.to_string()),
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::Month(prefix) => entry
                .date
                .as_deref()
                .is_some_and(|date| date.starts_with(prefix.as_str())),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Month(month) => f.write_str(month),
        }
    }
}

/// Filter and order entries for a query.
///
/// An entry is kept when the query occurs (case-insensitively) in its title
/// or in its cached body, and it passes the month filter. Results are ordered
/// by date descending; undated entries sort last and ties keep input order.
pub fn filter_entries<'a>(
    entries: &'a [Entry],
    cache: &ContentCache,
    query: &str,
    month: &MonthFilter,
) -> Vec<&'a Entry> {
    let needle = query.to_lowercase();

    let mut matched: Vec<&Entry> = entries
        .iter()
        .filter(|entry| month.matches(entry))
        .filter(|entry| {
            needle.is_empty()
                || entry.title.to_lowercase().contains(&needle)
                || cache
                    .get(&entry.id)
                    .is_some_and(|body| body.to_lowercase().contains(&needle))
        })
        .collect();

    // `sort_by` is stable
    matched.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(pairs: &[(&str, &str)]) -> ContentCache {
        ContentCache::from_results(
            pairs
                .iter()
                .map(|(id, text)| (id.to_string(), Ok(text.to_string()))),
        )
    }

    fn ids<'a>(entries: &[&'a Entry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_body_match_is_enough() {
        let entries = vec![Entry::new("a", "Shopping").with_date("2024-01-01")];
        let cache = cache(&[("a", "- buy milk")]);

        let result = filter_entries(&entries, &cache, "milk", &MonthFilter::All);
        assert_eq!(ids(&result), ["a"]);
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let entries = vec![
            Entry::new("a", "Morning KEIKO"),
            Entry::new("b", "Evening run"),
        ];
        let result = filter_entries(&entries, &ContentCache::default(), "keiko", &MonthFilter::All);
        assert_eq!(ids(&result), ["a"]);
    }

    #[test]
    fn test_body_match_is_case_insensitive() {
        let entries = vec![Entry::new("a", "Notes")];
        let cache = cache(&[("a", "Practiced DO strikes")]);
        let result = filter_entries(&entries, &cache, "do strikes", &MonthFilter::All);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_empty_query_matches_all() {
        let entries = vec![Entry::new("a", ""), Entry::new("b", "x")];
        let result = filter_entries(&entries, &ContentCache::default(), "", &MonthFilter::All);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_month_filter_excludes_other_months() {
        let entries = vec![
            Entry::new("a", "January").with_date("2024-01-15"),
            Entry::new("b", "February").with_date("2024-02-03"),
            Entry::new("c", "Undated"),
        ];
        let filter = MonthFilter::parse("2024-02");

        let result = filter_entries(&entries, &ContentCache::default(), "", &filter);
        assert_eq!(ids(&result), ["b"]);
    }

    #[test]
    fn test_both_predicates_required() {
        let entries = vec![
            Entry::new("a", "milk run").with_date("2024-01-15"),
            Entry::new("b", "milk run").with_date("2024-02-15"),
        ];
        let filter = MonthFilter::parse("2024-01");
        let result = filter_entries(&entries, &ContentCache::default(), "milk", &filter);
        assert_eq!(ids(&result), ["a"]);
    }

    #[test]
    fn test_sort_desc_with_missing_dates_last() {
        let entries = vec![
            Entry::new("jan", "x").with_date("2024-01-01"),
            Entry::new("mar", "x").with_date("2024-03-01"),
            Entry::new("none", "x"),
        ];
        let result = filter_entries(&entries, &ContentCache::default(), "", &MonthFilter::All);
        assert_eq!(ids(&result), ["mar", "jan", "none"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let entries = vec![
            Entry::new("first", "x").with_date("2024-01-01"),
            Entry::new("undated-1", "x"),
            Entry::new("second", "x").with_date("2024-01-01"),
            Entry::new("undated-2", "x"),
        ];
        let result = filter_entries(&entries, &ContentCache::default(), "", &MonthFilter::All);
        assert_eq!(ids(&result), ["first", "second", "undated-1", "undated-2"]);
    }

    #[test]
    fn test_failed_body_reads_as_empty() {
        let entries = vec![Entry::new("a", "Title")];
        let cache = ContentCache::from_results(vec![(
            "a".to_string(),
            Err(crate::error::AppError::upstream("blocks/a", "boom")),
        )]);
        assert!(filter_entries(&entries, &cache, "boom", &MonthFilter::All).is_empty());
        assert_eq!(filter_entries(&entries, &cache, "title", &MonthFilter::All).len(), 1);
    }

    #[test]
    fn test_month_filter_parse() {
        assert_eq!(MonthFilter::parse("all"), MonthFilter::All);
        assert_eq!(MonthFilter::parse(""), MonthFilter::All);
        assert_eq!(
            "2024-02".parse::<MonthFilter>().unwrap(),
            MonthFilter::Month("2024-02".into())
        );
        assert_eq!(MonthFilter::Month("2024-02".into()).to_string(), "2024-02");
    }
}

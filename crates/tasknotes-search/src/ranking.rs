//! Relevance ordering and re-pagination of merged results.
//!
//! Ordering is deterministic and stable: title matches first, then content
//! matches, then most recently updated. Items equal under all three keep
//! the order they were merged in.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tasknotes_core::UnifiedSearchResult;

/// Sort key for one result against a normalized query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    title_match: Reverse<bool>,
    content_match: Reverse<bool>,
    updated_at: Reverse<DateTime<Utc>>,
}

impl Rank {
    /// Compute the rank of `result` for an already trimmed, lower-cased query.
    pub fn of(result: &UnifiedSearchResult, needle: &str) -> Self {
        Self {
            title_match: Reverse(result.title.to_lowercase().contains(needle)),
            content_match: Reverse(result.content.to_lowercase().contains(needle)),
            updated_at: Reverse(result.updated_at),
        }
    }
}

/// Normalize a raw query for case-insensitive matching.
pub fn needle(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Stable relevance sort in place.
pub fn sort_results(results: &mut [UnifiedSearchResult], query: &str) {
    if results.len() < 2 {
        return;
    }
    let needle = needle(query);
    results.sort_by_cached_key(|r| Rank::of(r, &needle));
}

/// Slice `[skip, skip + limit)` out of `results`, clamping to its length.
pub fn paginate(
    mut results: Vec<UnifiedSearchResult>,
    skip: i32,
    limit: i32,
) -> Vec<UnifiedSearchResult> {
    let len = results.len();
    let start = usize::try_from(skip).unwrap_or(0).min(len);
    let end = start
        .saturating_add(usize::try_from(limit).unwrap_or(0))
        .min(len);

    results.truncate(end);
    results.drain(..start);
    results
}

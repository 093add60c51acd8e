//! Test fixtures for aggregation tests.
//!
//! Provides a fixed-page provider and result builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tasknotes_search::{
    Error, ProviderPage, Result, ResultKind, SearchContext, SearchProvider, SearchRequest,
    UnifiedSearchResult,
};

/// Provider that serves one fixed page, or fails, and counts calls.
pub struct FixedProvider {
    pub kind: ResultKind,
    pub page: Option<ProviderPage>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedProvider {
    pub fn notes(results: Vec<UnifiedSearchResult>, total: i64) -> Self {
        Self {
            kind: ResultKind::Note,
            page: Some(ProviderPage { results, total }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn tasks(results: Vec<UnifiedSearchResult>, total: i64) -> Self {
        Self {
            kind: ResultKind::Task,
            ..Self::notes(results, total)
        }
    }

    pub fn broken(kind: ResultKind) -> Self {
        Self {
            kind,
            page: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SearchProvider for FixedProvider {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn kind(&self) -> ResultKind {
        self.kind
    }

    async fn search(&self, _request: &SearchRequest, _ctx: &SearchContext) -> Result<ProviderPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page
            .clone()
            .ok_or_else(|| Error::upstream(self.name(), "unavailable"))
    }
}

/// Note updated on the given day of March 2024.
pub fn note(id: &str, title: &str, content: &str, day: u32) -> UnifiedSearchResult {
    UnifiedSearchResult::new(
        ResultKind::Note,
        id,
        title,
        content,
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
    )
}

/// Task updated on the given day of March 2024.
pub fn task(id: i32, title: &str, day: u32) -> UnifiedSearchResult {
    let mut result = UnifiedSearchResult::new(
        ResultKind::Task,
        id.to_string(),
        title,
        "",
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
    );
    result.completed = Some(false);
    result
}

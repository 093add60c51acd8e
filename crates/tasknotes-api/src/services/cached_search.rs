//! Cache-aside search service shared by every transport.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use tasknotes_core::{
    RequestSource, Result, ResultKind, SearchContext, SearchRequest, UnifiedSearchResponse,
};
use tasknotes_search::SearchEngine;

use crate::metrics::Metrics;
use crate::services::SearchCache;

/// The search entry point handed to REST and GraphQL handlers.
///
/// `merged` serves the unified, cached path. `by_kind` holds every provider
/// and serves the separate per-kind path, which is never cached.
#[derive(Clone)]
pub struct SearchService {
    merged: Arc<SearchEngine>,
    by_kind: Arc<SearchEngine>,
    cache: SearchCache,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
}

impl SearchService {
    pub fn new(
        merged: SearchEngine,
        by_kind: SearchEngine,
        cache: SearchCache,
        metrics: Arc<Metrics>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            merged: Arc::new(merged),
            by_kind: Arc::new(by_kind),
            cache,
            metrics,
            request_timeout,
        }
    }

    /// Context for a request arriving now through `source`.
    pub fn context(&self, source: RequestSource) -> SearchContext {
        SearchContext::with_timeout(source, self.request_timeout)
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Unified search through the cache.
    ///
    /// Invalid requests fail before the cache is consulted. A hit returns the
    /// stored response unchanged; a miss computes, stores, then returns.
    ///
    /// The key carries the user's cache generation as read before computing,
    /// so a response computed across an invalidation lands under a retired
    /// key. An unreadable generation bypasses the cache for this request.
    pub async fn search(
        &self,
        request: SearchRequest,
        ctx: &SearchContext,
    ) -> Result<UnifiedSearchResponse> {
        if !self.cache.is_enabled() {
            return self.merged.unified_search(request, ctx).await;
        }

        let request = request.prepare()?;
        let Some(generation) = self.cache.generation(request.user_id).await else {
            self.metrics.cache_miss(ctx.source);
            return self.merged.unified_search(request, ctx).await;
        };
        let key = SearchCache::cache_key(&request, generation);

        if let Some(cached) = self.cache.get::<UnifiedSearchResponse>(&key).await {
            self.metrics.cache_hit(ctx.source);
            return Ok(cached);
        }
        self.metrics.cache_miss(ctx.source);

        let response = self.merged.unified_search(request, ctx).await?;

        // Stored before returning so a follow-up request sees the entry.
        self.cache.set(&key, &response).await;
        debug!(
            cache_key = %key,
            source = %ctx.source,
            result_count = response.results.len(),
            "Search result cached"
        );

        Ok(response)
    }

    /// Search the providers of one kind only, bypassing the cache.
    pub async fn search_kind(
        &self,
        kind: ResultKind,
        request: SearchRequest,
        ctx: &SearchContext,
    ) -> Result<UnifiedSearchResponse> {
        self.by_kind.search_kind(kind, request, ctx).await
    }

    /// Drop every cached search for `user_id`.
    pub async fn invalidate_user(&self, user_id: i32) -> Result<usize> {
        let evicted = self.cache.invalidate_user(user_id).await?;
        self.metrics.cache_invalidated(evicted);
        Ok(evicted)
    }
}

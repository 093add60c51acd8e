//! Aggregation engine: provider fan-out, merge, relevance ordering, and
//! re-pagination.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, trace};

use tasknotes_core::{
    defaults, ProviderPage, Result, ResultKind, SearchContext, SearchProvider, SearchRequest,
    UnifiedSearchResponse,
};

use crate::ranking::{paginate, sort_results};

/// Fans a canonical request out to its providers and merges the answers.
///
/// Providers are consulted in registration order; that order, followed by
/// each provider's own item order, is the merge order the stable sort starts
/// from.
#[derive(Clone, Default)]
pub struct SearchEngine {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl SearchEngine {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Register another provider after the existing ones.
    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Names of the registered providers, in merge order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Search every registered provider and return one merged page.
    ///
    /// The request is validated before any provider call and normalized
    /// afterwards. Any provider failing fails the whole search.
    pub async fn unified_search(
        &self,
        request: SearchRequest,
        ctx: &SearchContext,
    ) -> Result<UnifiedSearchResponse> {
        let providers: Vec<&Arc<dyn SearchProvider>> = self.providers.iter().collect();
        aggregate(&providers, request, ctx).await
    }

    /// Search only the providers of one kind.
    ///
    /// Same validation, ordering, and pagination as [`Self::unified_search`].
    pub async fn search_kind(
        &self,
        kind: ResultKind,
        request: SearchRequest,
        ctx: &SearchContext,
    ) -> Result<UnifiedSearchResponse> {
        let providers: Vec<&Arc<dyn SearchProvider>> = self
            .providers
            .iter()
            .filter(|p| p.kind() == kind)
            .collect();
        aggregate(&providers, request, ctx).await
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("providers", &self.provider_names())
            .finish()
    }
}

/// Collect the first `skip + limit` items of one provider.
///
/// Providers cap a page at [`defaults::PAGE_LIMIT_MAX`], so deeper prefixes
/// are read in consecutive windows of at most that size. Reading stops at
/// the first short page or once the reported total is covered. The total is
/// the one reported for the first window.
async fn fetch_prefix(
    provider: &Arc<dyn SearchProvider>,
    request: &SearchRequest,
    ctx: &SearchContext,
) -> Result<ProviderPage> {
    let wanted = request.skip.saturating_add(request.limit);
    let mut collected = ProviderPage::default();
    let mut offset = 0i32;

    while offset < wanted {
        let limit = (wanted - offset).min(defaults::PAGE_LIMIT_MAX);
        let window = SearchRequest {
            skip: offset,
            limit,
            ..request.clone()
        };
        let page = provider.search(&window, ctx).await?;
        if offset == 0 {
            collected.total = page.total;
        }

        let received = page.results.len();
        collected.results.extend(page.results);
        offset = offset.saturating_add(limit);

        if received < limit as usize || i64::from(offset) >= collected.total {
            break;
        }
    }

    Ok(collected)
}

async fn aggregate(
    providers: &[&Arc<dyn SearchProvider>],
    request: SearchRequest,
    ctx: &SearchContext,
) -> Result<UnifiedSearchResponse> {
    let request = request.prepare()?;
    let start = Instant::now();

    let pages: Vec<ProviderPage> =
        try_join_all(providers.iter().map(|p| fetch_prefix(p, &request, ctx))).await?;

    let mut notes = 0i64;
    let mut tasks = 0i64;
    let mut merged = Vec::with_capacity(pages.iter().map(|p| p.results.len()).sum());

    for (provider, page) in providers.iter().zip(pages) {
        trace!(
            provider = provider.name(),
            result_count = page.results.len(),
            total = page.total,
            "Provider page merged"
        );
        match provider.kind() {
            ResultKind::Note => notes = notes.saturating_add(page.total),
            ResultKind::Task => tasks = tasks.saturating_add(page.total),
        }
        merged.extend(page.results);
    }

    sort_results(&mut merged, &request.query);
    let results = paginate(merged, request.skip, request.limit);
    let total = notes.saturating_add(tasks);

    debug!(
        user_id = request.user_id,
        source = %ctx.source,
        result_count = results.len(),
        total,
        duration_ms = start.elapsed().as_millis() as u64,
        "Aggregated search"
    );

    Ok(UnifiedSearchResponse {
        results,
        total,
        notes,
        tasks,
    })
}

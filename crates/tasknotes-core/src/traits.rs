//! Core traits for pluggable search providers and cache backends.
//!
//! These traits are the seams between the aggregation engine, the RPC
//! clients, and the cache layer, and are what the tests substitute.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ResultKind, UnifiedSearchResult};
use crate::search::{SearchContext, SearchRequest};

/// One provider's page of converted results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPage {
    pub results: Vec<UnifiedSearchResult>,
    /// Provider-reported total before any client-side re-pagination.
    pub total: i64,
}

/// An upstream service that can search one kind of record for a user.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name used in logs and errors ("notes", "tasks").
    fn name(&self) -> &str;

    /// Kind of record this provider returns.
    fn kind(&self) -> ResultKind;

    /// Run the search. The request is already validated and normalized.
    ///
    /// Implementations bound the call by their own timeout and the context
    /// deadline; exceeding it is an error, never an empty page.
    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> Result<ProviderPage>;
}

/// Key/value store backing the search cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logs ("redis", "memory").
    fn backend(&self) -> &'static str;

    /// Fetch a raw payload.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a payload with a fresh TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Delete every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize>;

    /// Atomically increment an integer counter, creating it at 1. Counters
    /// do not expire.
    async fn incr(&self, key: &str) -> Result<i64>;
}

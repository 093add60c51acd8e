//! Prometheus metrics for the search service.
//!
//! Each [`Metrics`] owns its own registry, so tests can assert on counters
//! without global state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use tasknotes_core::RequestSource;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    request_duration: HistogramVec,
    cache_hits: IntCounterVec,
    cache_misses: IntCounterVec,
    cache_invalidations: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("search_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "search_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method", "endpoint"],
        )?;
        let cache_hits = IntCounterVec::new(
            Opts::new("search_cache_hits_total", "Search cache hits"),
            &["source"],
        )?;
        let cache_misses = IntCounterVec::new(
            Opts::new("search_cache_misses_total", "Search cache misses"),
            &["source"],
        )?;
        let cache_invalidations = IntCounter::new(
            "search_cache_invalidations_total",
            "Cache entries evicted by mutation events",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;
        registry.register(Box::new(cache_invalidations.clone()))?;

        Ok(Self {
            registry,
            requests,
            request_duration,
            cache_hits,
            cache_misses,
            cache_invalidations,
        })
    }

    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
    }

    pub fn cache_hit(&self, source: RequestSource) {
        self.cache_hits.with_label_values(&[source.as_str()]).inc();
    }

    pub fn cache_miss(&self, source: RequestSource) {
        self.cache_misses.with_label_values(&[source.as_str()]).inc();
    }

    pub fn cache_invalidated(&self, evicted: usize) {
        self.cache_invalidations.inc_by(evicted as u64);
    }

    pub fn cache_hits(&self, source: RequestSource) -> u64 {
        self.cache_hits.with_label_values(&[source.as_str()]).get()
    }

    pub fn cache_misses(&self, source: RequestSource) -> u64 {
        self.cache_misses.with_label_values(&[source.as_str()]).get()
    }

    /// Render every metric in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Middleware recording request count and latency per route template.
pub async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    metrics.record_request(
        &method,
        &endpoint,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

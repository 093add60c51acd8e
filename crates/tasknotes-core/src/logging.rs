//! Structured logging field names for the TaskNotes search service.
//!
//! Every crate logs through `tracing` with these field names so log queries
//! work the same across the gateway, the engine and the provider clients.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded dependency (cache, event bus), requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, connections, invalidations) |
//! | DEBUG | Cache hit/miss, aggregation summaries |
//! | TRACE | Per-item detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID set by the request-id layer. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Owner of the searched or invalidated records.
pub const USER_ID: &str = "user_id";

/// Transport a search arrived through.
/// Values: "rest", "graphql", "internal"
pub const SOURCE: &str = "source";

/// Upstream provider name ("notes", "tasks").
pub const PROVIDER: &str = "provider";

// ─── Cache fields ──────────────────────────────────────────────────────────

/// Full cache key of a search entry.
pub const CACHE_KEY: &str = "cache_key";

/// Cache store backend ("redis", "memory").
pub const BACKEND: &str = "backend";

/// Per-user cache generation after an invalidation.
pub const GENERATION: &str = "generation";

/// Number of cache entries removed by one invalidation.
pub const EVICTED: &str = "evicted";

/// Event bus routing key of a mutation event.
pub const ROUTING_KEY: &str = "routing_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results in the returned page.
pub const RESULT_COUNT: &str = "result_count";

/// Sum of provider-reported totals.
pub const TOTAL: &str = "total";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

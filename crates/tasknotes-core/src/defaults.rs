//! Centralized default constants for the search service.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers. Organized by domain area.

use std::time::Duration;

// =============================================================================
// REQUEST BOUNDS
// =============================================================================

/// Page size applied when the caller omits `limit` or sends a non-positive one.
pub const PAGE_LIMIT: i32 = 20;

/// Largest page size a caller may request.
pub const PAGE_LIMIT_MAX: i32 = 100;

/// Maximum query length in characters.
pub const QUERY_MAX_CHARS: usize = 1000;

/// Maximum category name length in characters.
pub const CATEGORY_MAX_CHARS: usize = 100;

/// Maximum number of tag filters per request.
pub const TAGS_MAX: usize = 20;

/// Maximum length of a single tag filter in characters.
pub const TAG_MAX_CHARS: usize = 50;

// =============================================================================
// PROVIDERS
// =============================================================================

/// Per-call provider timeout, independent of the caller's deadline.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Startup dial timeout for provider channels.
pub const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default notes provider address.
pub const NOTES_GRPC_ADDR: &str = "notes-service:50051";

/// Default tasks provider address.
pub const TASKS_GRPC_ADDR: &str = "tasks-service:50052";

// =============================================================================
// CACHE
// =============================================================================

/// Cache entry TTL in seconds.
pub const CACHE_TTL_SECS: u64 = 120;

/// Namespace prefix shared by every search cache key.
pub const CACHE_KEY_PREFIX: &str = "search:u:";

/// Per-user generation counter, bumped on every invalidation. Lives outside
/// [`CACHE_KEY_PREFIX`] so a prefix sweep never resets it.
pub const CACHE_GENERATION_PREFIX: &str = "search:gen:";

/// Keys fetched per SCAN round-trip during invalidation.
pub const CACHE_SCAN_COUNT: usize = 200;

// =============================================================================
// EVENT BUS
// =============================================================================

/// Default AMQP broker URL.
pub const RABBITMQ_URL: &str = "amqp://rabbitmq:5672";

/// Topic exchange carrying upstream mutation events.
pub const EVENTS_EXCHANGE: &str = "tasknotes.events";

/// Durable queue owned by the search service.
pub const EVENTS_QUEUE: &str = "search-service-cache-invalidation";

/// Routing keys that invalidate a user's cached searches.
pub const INVALIDATION_ROUTING_KEYS: [&str; 4] =
    ["note.updated", "note.deleted", "task.updated", "task.deleted"];

/// Delay before the subscriber reconnects after losing the broker.
pub const EVENTS_RETRY_SECS: u64 = 5;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8008;

/// Deadline attached to each inbound search request.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

//! # tasknotes-api
//!
//! HTTP front door of the TaskNotes search service: REST and GraphQL
//! transports over a cache-aside [`SearchService`], with Prometheus metrics
//! and an event-driven cache invalidation subscriber.
//!
//! The binary (`tasknotes-search-service`) wires these pieces from the
//! environment; tests build the same router around mock providers.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod services;

pub use auth::JwtAuth;
pub use config::{AppConfig, CacheBackend, CacheConfig, EventsConfig};
pub use error::ApiError;
pub use metrics::Metrics;
pub use router::{build_router, AppState};
pub use services::{
    InvalidationSubscriber, MemoryStore, RedisStore, SearchCache, SearchService, SubscriberHandle,
};

//! Service layer shared by the REST and GraphQL transports.

pub mod cache_invalidation;
pub mod cached_search;
pub mod search_cache;

pub use cache_invalidation::{parse_event_user, InvalidationSubscriber, SubscriberHandle};
pub use cached_search::SearchService;
pub use search_cache::{MemoryStore, RedisStore, SearchCache};

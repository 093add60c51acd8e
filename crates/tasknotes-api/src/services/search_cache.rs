//! Per-user search result cache.
//!
//! Keys live under a per-user namespace so all of one user's entries can be
//! dropped with a prefix sweep when any of their notes or tasks change:
//!
//! ```text
//! search:u:{user_id}:g{generation}:{fingerprint}
//! ```
//!
//! The fingerprint is a truncated SHA-256 of the normalized request, with the
//! tag list sorted so tag order never changes the key.
//!
//! The generation comes from the counter `search:gen:{user_id}`, which every
//! invalidation bumps before sweeping. A search reads it before computing, so
//! a result computed across an invalidation is written under the old
//! generation and never served afterwards.
//!
//! ## Configuration
//!
//! - `REDIS_URL`: Redis connection URL (unset disables caching)
//! - `CACHE_BACKEND`: `redis` (default) or `memory`
//! - `CACHE_TTL_SECONDS`: Cache TTL in seconds (default: 120)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use tasknotes_core::{defaults, CacheStore, Error, Result, SearchRequest};

use crate::config::{CacheBackend, CacheConfig};

/// Separates fingerprint fields so adjacent values cannot run together.
const FIELD_SEP: &[u8] = b"\x1f";
/// Separates tags within the tag field.
const TAG_SEP: &[u8] = b"\x1e";
/// Hex characters of the digest kept in the key.
const FINGERPRINT_LEN: usize = 32;

/// Search cache over an optional [`CacheStore`].
///
/// Lookups never fail: a read error is a miss and a write error is logged
/// and dropped. Invalidation errors are returned.
#[derive(Clone)]
pub struct SearchCache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl SearchCache {
    /// Build the cache described by `config`.
    ///
    /// An unreachable or invalid Redis URL disables the cache with a warning.
    pub async fn from_config(config: &CacheConfig) -> Self {
        let store: Option<Arc<dyn CacheStore>> = match &config.backend {
            CacheBackend::Disabled => {
                info!("Search cache disabled (REDIS_URL not set)");
                None
            }
            CacheBackend::Memory => {
                info!(ttl_secs = config.ttl.as_secs(), "In-memory search cache enabled");
                Some(Arc::new(MemoryStore::new()))
            }
            CacheBackend::Redis { url } => match RedisStore::connect(url).await {
                Ok(store) => {
                    info!(
                        "Redis search cache enabled (TTL: {}s, URL: {})",
                        config.ttl.as_secs(),
                        url.replace(|c: char| c.is_ascii_alphanumeric(), "*")
                    );
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!("Failed to connect to Redis, cache disabled: {}", e);
                    None
                }
            },
        };

        Self {
            store,
            ttl: config.ttl,
        }
    }

    /// Cache over an explicit store.
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// Create a disabled cache (for testing or when Redis unavailable).
    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Get cache TTL setting.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Key namespace holding every entry for `user_id`.
    pub fn user_prefix(user_id: i32) -> String {
        format!("{}{}:", defaults::CACHE_KEY_PREFIX, user_id)
    }

    /// Key of the generation counter for `user_id`.
    pub fn generation_key(user_id: i32) -> String {
        format!("{}{}", defaults::CACHE_GENERATION_PREFIX, user_id)
    }

    /// Current cache generation for `user_id`, 0 before the first
    /// invalidation.
    ///
    /// `None` when the cache is disabled or the counter cannot be read; the
    /// caller then must neither read nor write entries.
    pub async fn generation(&self, user_id: i32) -> Option<i64> {
        let store = self.store.as_ref()?;
        let key = Self::generation_key(user_id);

        match store.get(&key).await {
            Ok(None) => Some(0),
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(generation) => Some(generation),
                Err(e) => {
                    error!(cache_key = %key, error = %e, "Cache generation unreadable");
                    None
                }
            },
            Err(e) => {
                error!(cache_key = %key, error = %e, "Cache generation GET failed");
                None
            }
        }
    }

    /// Generate the cache key for a normalized request at `generation`.
    pub fn cache_key(request: &SearchRequest, generation: i64) -> String {
        let mut hasher = Sha256::new();

        hasher.update(request.user_id.to_string().as_bytes());
        hasher.update(FIELD_SEP);
        hasher.update(request.query.as_bytes());
        hasher.update(FIELD_SEP);
        hasher.update(request.category.as_deref().unwrap_or("").as_bytes());
        hasher.update(FIELD_SEP);

        let mut sorted_tags: Vec<&str> = request.tags.iter().map(String::as_str).collect();
        sorted_tags.sort_unstable();
        for tag in sorted_tags {
            hasher.update(tag.as_bytes());
            hasher.update(TAG_SEP);
        }
        hasher.update(FIELD_SEP);

        hasher.update(request.limit.to_string().as_bytes());
        hasher.update(FIELD_SEP);
        hasher.update(request.skip.to_string().as_bytes());

        let hash = hex::encode(hasher.finalize());
        format!(
            "{}g{}:{}",
            Self::user_prefix(request.user_id),
            generation,
            &hash[..FINGERPRINT_LEN]
        )
    }

    /// Get a cached value. Undecodable payloads count as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;

        match store.get(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => {
                    debug!(cache_key = key, "Cache HIT");
                    Some(value)
                }
                Err(e) => {
                    warn!(cache_key = key, error = %e, "Cache payload undecodable, treating as miss");
                    None
                }
            },
            Ok(None) => {
                debug!(cache_key = key, "Cache MISS");
                None
            }
            Err(e) => {
                error!(cache_key = key, error = %e, "Cache GET failed");
                None
            }
        }
    }

    /// Store a value, overwriting any previous entry with a fresh TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };

        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!(cache_key = key, error = %e, "Cache serialization failed");
                return false;
            }
        };

        match store.set(key, serialized, self.ttl).await {
            Ok(()) => {
                debug!(cache_key = key, ttl_secs = self.ttl.as_secs(), "Cache SET");
                true
            }
            Err(e) => {
                error!(cache_key = key, error = %e, "Cache SET failed");
                false
            }
        }
    }

    /// Remove every entry cached for `user_id`, returning how many went.
    ///
    /// The generation is bumped first, so searches already in flight cannot
    /// repopulate the namespace with pre-invalidation results. Store errors
    /// are returned; the caller decides whether to retry.
    pub async fn invalidate_user(&self, user_id: i32) -> Result<usize> {
        let Some(store) = self.store.as_ref() else {
            return Ok(0);
        };

        let generation = store.incr(&Self::generation_key(user_id)).await?;
        let evicted = store.delete_prefix(&Self::user_prefix(user_id)).await?;
        info!(
            user_id,
            evicted,
            generation,
            backend = store.backend(),
            "Cache invalidated for user"
        );
        Ok(evicted)
    }
}

/// Redis-backed store. The connection manager multiplexes and reconnects on
/// its own, so each call works on a cheap clone.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let connection = ConnectionManager::new(client).await.map_err(cache_error)?;
        Ok(Self { connection })
    }
}

fn cache_error(e: redis::RedisError) -> Error {
    Error::Cache(e.to_string())
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(cache_error)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(defaults::CACHE_SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(cache_error)?;

            if !keys.is_empty() {
                removed += conn
                    .del::<_, usize>(keys.as_slice())
                    .await
                    .map_err(cache_error)?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection.clone();
        conn.incr::<_, _, i64>(key, 1).await.map_err(cache_error)
    }
}

/// Expiry of a [`MemoryStore`] entry; `None` never expires.
type Expiry = Option<Instant>;

fn is_live(expires: &Expiry, now: Instant) -> bool {
    expires.map_or(true, |at| at > now)
}

/// In-process store with per-entry expiry.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Expiry)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| is_live(expires, now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, (_, expires))| is_live(expires, now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|(_, expires)| is_live(expires, now))
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires)| is_live(expires, now));
        entries.insert(key.to_string(), (value, Some(now + ttl)));
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let mut expired = 0usize;
        entries.retain(|key, (_, expires)| {
            if !key.starts_with(prefix) {
                return true;
            }
            if !is_live(expires, now) {
                expired += 1;
            }
            false
        });
        Ok(before - entries.len() - expired)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let current = match entries.get(key) {
            Some((raw, expires)) if is_live(expires, now) => raw
                .parse::<i64>()
                .map_err(|_| Error::Cache(format!("value at {} is not an integer", key)))?,
            _ => 0,
        };
        let next = current + 1;
        entries.insert(key.to_string(), (next.to_string(), None));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SearchRequest {
        SearchRequest::new(7, "grocery").with_limit(10)
    }

    #[test]
    fn test_cache_key_generation() {
        let key1 = SearchCache::cache_key(&request(), 0);
        let key2 = SearchCache::cache_key(&request(), 0);
        assert_eq!(key1, key2);

        // Every field participates
        assert_ne!(key1, SearchCache::cache_key(&request().with_limit(11), 0));
        assert_ne!(key1, SearchCache::cache_key(&request().with_skip(10), 0));
        assert_ne!(key1, SearchCache::cache_key(&request().with_category("Home"), 0));
        assert_ne!(key1, SearchCache::cache_key(&request().with_tags(["a"]), 0));
        assert_ne!(
            key1,
            SearchCache::cache_key(&SearchRequest::new(8, "grocery").with_limit(10), 0)
        );

        // A new generation never shares keys with the old one
        assert_ne!(key1, SearchCache::cache_key(&request(), 1));

        // Exact query, not case-folded
        assert_ne!(
            key1,
            SearchCache::cache_key(&SearchRequest::new(7, "Grocery").with_limit(10), 0)
        );
    }

    #[test]
    fn test_cache_key_ignores_tag_order() {
        let ab = SearchCache::cache_key(&request().with_tags(["a", "b"]), 0);
        let ba = SearchCache::cache_key(&request().with_tags(["b", "a"]), 0);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_cache_key_fields_do_not_run_together() {
        let split_tags = SearchCache::cache_key(&request().with_tags(["ab", "c"]), 0);
        let joined_tags = SearchCache::cache_key(&request().with_tags(["a", "bc"]), 0);
        assert_ne!(split_tags, joined_tags);
    }

    #[test]
    fn test_cache_key_layout() {
        let key = SearchCache::cache_key(&request(), 3);
        let prefix = SearchCache::user_prefix(7);
        assert_eq!(prefix, "search:u:7:");

        let generation = format!("{}g3:", prefix);
        assert!(key.starts_with(&generation));
        assert_eq!(key.len(), generation.len() + FINGERPRINT_LEN);
        assert!(key[generation.len()..].chars().all(|c| c.is_ascii_hexdigit()));

        let counter = SearchCache::generation_key(7);
        assert_eq!(counter, "search:gen:7");
        assert!(!counter.starts_with(&prefix));
    }

    #[test]
    fn test_user_prefix_does_not_match_longer_ids() {
        let key_for_70 = SearchCache::cache_key(&SearchRequest::new(70, "q"), 0);
        assert!(!key_for_70.starts_with(&SearchCache::user_prefix(7)));
    }

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let cache = SearchCache::disabled();
        assert!(!cache.is_enabled());
        assert!(!cache.set("k", &1).await);
        assert_eq!(cache.get::<i32>("k").await, None);
        assert_eq!(cache.generation(7).await, None);
        assert_eq!(cache.invalidate_user(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalidation_bumps_generation() {
        let store = Arc::new(MemoryStore::new());
        let cache = SearchCache::new(store.clone(), Duration::from_secs(60));
        assert_eq!(cache.generation(7).await, Some(0));

        let key = SearchCache::cache_key(&request(), 0);
        assert!(cache.set(&key, &1).await);

        assert_eq!(cache.invalidate_user(7).await.unwrap(), 1);
        assert_eq!(cache.generation(7).await, Some(1));
        assert_eq!(cache.generation(8).await, Some(0));
        assert_eq!(cache.get::<i32>(&key).await, None);

        // Only the counter survives the sweep
        assert_eq!(store.keys().await, vec!["search:gen:7".to_string()]);
    }

    #[tokio::test]
    async fn test_unreadable_generation_disables_lookup() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("search:gen:7", "x".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = SearchCache::new(store.clone(), Duration::from_secs(60));

        assert_eq!(cache.generation(7).await, None);
        assert!(cache.invalidate_user(7).await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("search:u:1:x", "{not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = SearchCache::new(store, Duration::from_secs(60));
        assert_eq!(cache.get::<Vec<i32>>("search:u:1:x").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_expires_entries() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_secs(120))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(121)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_delete_prefix() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set("search:u:7:a", "1".into(), ttl).await.unwrap();
        store.set("search:u:7:b", "2".into(), ttl).await.unwrap();
        store.set("search:u:8:a", "3".into(), ttl).await.unwrap();

        assert_eq!(store.delete_prefix("search:u:7:").await.unwrap(), 2);
        assert_eq!(store.keys().await, vec!["search:u:8:a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_counters_do_not_expire() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("search:gen:7").await.unwrap(), 1);
        assert_eq!(store.incr("search:gen:7").await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(store.get("search:gen:7").await.unwrap().as_deref(), Some("2"));
    }
}

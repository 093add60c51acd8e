//! Service configuration loaded from the environment.
//!
//! Provider channel settings live in [`tasknotes_providers::ProviderConfig`];
//! everything the HTTP service itself needs is here.

use std::fmt;
use std::time::Duration;

use tasknotes_core::defaults;

/// Which store backs the search cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// No cache; every search goes to the providers.
    Disabled,
    Redis { url: String },
    /// In-process store, for local runs with a single replica.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Disabled,
            ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
        }
    }
}

/// Event bus settings for the invalidation subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsConfig {
    pub url: String,
    pub exchange: String,
    pub queue: String,
    /// Backoff before reconnecting after the consumer fails.
    pub retry: Duration,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            url: defaults::RABBITMQ_URL.to_string(),
            exchange: defaults::EVENTS_EXCHANGE.to_string(),
            queue: defaults::EVENTS_QUEUE.to_string(),
            retry: Duration::from_secs(defaults::EVENTS_RETRY_SECS),
        }
    }
}

/// HTTP service configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Deadline attached to every search request.
    pub request_timeout: Duration,
    /// Feed the tasks provider into the merged, cached search path.
    pub merge_tasks: bool,
    /// HS256 secret for GraphQL bearer tokens.
    pub jwt_secret: Option<String>,
    pub cache: CacheConfig,
    pub events: EventsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            merge_tasks: false,
            jwt_secret: None,
            cache: CacheConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("merge_tasks", &self.merge_tasks)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("cache", &self.cache)
            .field("events", &self.events)
            .finish()
    }
}

impl AppConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HOST` | `0.0.0.0` | Listen address |
    /// | `PORT` | `8008` | Listen port |
    /// | `REQUEST_TIMEOUT_SECS` | `60` | Deadline for each search |
    /// | `SEARCH_MERGE_TASKS` | `false` | Merge tasks into the unified results |
    /// | `KEY_JWT` | - | HS256 secret for GraphQL bearer tokens |
    /// | `REDIS_URL` | - | Redis URL; unset disables the cache |
    /// | `CACHE_BACKEND` | `redis` | `redis` or `memory` |
    /// | `CACHE_TTL_SECONDS` | `120` | Cache entry TTL |
    /// | `RABBITMQ_URL` | `amqp://rabbitmq:5672` | Event bus URL |
    /// | `EVENTS_EXCHANGE` | `tasknotes.events` | Topic exchange |
    /// | `EVENTS_QUEUE` | `search-service-cache-invalidation` | Durable queue |
    /// | `EVENTS_RETRY_SECS` | `5` | Reconnect backoff |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let positive_secs = |key: &str, default: u64| {
            let secs = non_empty(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default);
            Duration::from_secs(secs)
        };
        let flag = |key: &str| {
            non_empty(key)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false)
        };

        let backend = match non_empty("CACHE_BACKEND").as_deref().map(str::trim) {
            Some(b) if b.eq_ignore_ascii_case("memory") => CacheBackend::Memory,
            _ => match non_empty("REDIS_URL") {
                Some(url) => CacheBackend::Redis { url },
                None => CacheBackend::Disabled,
            },
        };

        let base = Self::default();

        Self {
            host: non_empty("HOST").unwrap_or(base.host),
            port: non_empty("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(base.port),
            request_timeout: positive_secs("REQUEST_TIMEOUT_SECS", defaults::REQUEST_TIMEOUT_SECS),
            merge_tasks: flag("SEARCH_MERGE_TASKS"),
            jwt_secret: non_empty("KEY_JWT"),
            cache: CacheConfig {
                backend,
                ttl: positive_secs("CACHE_TTL_SECONDS", defaults::CACHE_TTL_SECS),
            },
            events: EventsConfig {
                url: non_empty("RABBITMQ_URL").unwrap_or(base.events.url),
                exchange: non_empty("EVENTS_EXCHANGE").unwrap_or(base.events.exchange),
                queue: non_empty("EVENTS_QUEUE").unwrap_or(base.events.queue),
                retry: positive_secs("EVENTS_RETRY_SECS", defaults::EVENTS_RETRY_SECS),
            },
        }
    }

    /// `host:port` to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:8008");
        assert_eq!(config.cache.backend, CacheBackend::Disabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(120));
        assert_eq!(config.events.exchange, "tasknotes.events");
        assert!(!config.merge_tasks);
    }

    #[test]
    fn test_redis_enabled_by_url() {
        let config = config(&[
            ("REDIS_URL", "redis://cache:6379/0"),
            ("CACHE_TTL_SECONDS", "30"),
        ]);
        assert_eq!(
            config.cache.backend,
            CacheBackend::Redis {
                url: "redis://cache:6379/0".to_string()
            }
        );
        assert_eq!(config.cache.ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        let config = config(&[("CACHE_BACKEND", "Memory")]);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[
            ("PORT", "http"),
            ("CACHE_TTL_SECONDS", "-5"),
            ("REQUEST_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.port, 8008);
        assert_eq!(config.cache.ttl, Duration::from_secs(120));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_flags_and_secret() {
        let config = config(&[("SEARCH_MERGE_TASKS", "true"), ("KEY_JWT", "s3cret")]);
        assert!(config.merge_tasks);
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}

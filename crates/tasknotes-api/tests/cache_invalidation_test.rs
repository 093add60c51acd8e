//! Event-driven invalidation against the in-memory cache.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tasknotes_api::{
    EventsConfig, InvalidationSubscriber, MemoryStore, Metrics, SearchCache, SearchService,
};
use tasknotes_core::{CacheStore, Error, RequestSource, Result, SearchRequest};
use tasknotes_search::{mock::MockProvider, SearchEngine};

use helpers::{note, TestApp};

async fn warm(app: &TestApp, user_id: i32, query: &str) {
    let ctx = app.service.context(RequestSource::Internal);
    app.service
        .search(SearchRequest::new(user_id, query), &ctx)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_event_evicts_only_the_owning_user() {
    let app = TestApp::new();
    app.notes
        .set_results(vec![note("n1", "Grocery list", "milk", 1)], 1);
    warm(&app, 7, "grocery").await;
    warm(&app, 7, "milk").await;
    warm(&app, 8, "grocery").await;
    assert_eq!(app.store.len().await, 3);

    let subscriber = InvalidationSubscriber::new(EventsConfig::default(), app.service.clone());
    let evicted = subscriber
        .handle_event("note.updated", br#"{"user_id": 7}"#)
        .await
        .unwrap();

    assert_eq!(evicted, 2);
    let keys = app.store.keys().await;
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], SearchCache::generation_key(7));
    assert!(keys[1].starts_with(&SearchCache::user_prefix(8)));
}

#[tokio::test]
async fn test_user_70_is_not_swept_with_user_7() {
    let app = TestApp::new();
    warm(&app, 7, "a").await;
    warm(&app, 70, "a").await;

    let subscriber = InvalidationSubscriber::new(EventsConfig::default(), app.service.clone());
    let evicted = subscriber
        .handle_event("task.deleted", br#"{"sub": "7"}"#)
        .await
        .unwrap();

    assert_eq!(evicted, 1);
    let keys = app.store.keys().await;
    assert_eq!(keys.len(), 2);
    assert!(keys[1].starts_with("search:u:70:"));
}

#[tokio::test]
async fn test_malformed_events_are_skipped() {
    let app = TestApp::new();
    warm(&app, 7, "a").await;

    let subscriber = InvalidationSubscriber::new(EventsConfig::default(), app.service.clone());
    assert_eq!(subscriber.handle_event("note.updated", b"garbage").await.unwrap(), 0);
    assert_eq!(subscriber.handle_event("note.updated", b"[]").await.unwrap(), 0);
    assert_eq!(
        subscriber
            .handle_event("note.updated", br#"{"note_id": "x"}"#)
            .await
            .unwrap(),
        0
    );
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_search_after_invalidation_recomputes() {
    let app = TestApp::new();
    app.notes.set_results(vec![note("n1", "Old title", "", 1)], 1);
    warm(&app, 7, "title").await;

    app.notes.set_results(vec![note("n1", "New title", "", 2)], 1);
    let subscriber = InvalidationSubscriber::new(EventsConfig::default(), app.service.clone());
    subscriber
        .handle_event("note.updated", br#"{"user_id": 7}"#)
        .await
        .unwrap();

    let ctx = app.service.context(RequestSource::Internal);
    let response = app
        .service
        .search(SearchRequest::new(7, "title"), &ctx)
        .await
        .unwrap();
    assert_eq!(response.results[0].title, "New title");
    assert_eq!(app.notes.call_count(), 2);
}

#[tokio::test]
async fn test_subscriber_shuts_down_while_retrying() {
    let app = TestApp::new();
    let config = EventsConfig {
        // Nothing listens here; the subscriber keeps retrying.
        url: "amqp://127.0.0.1:1".to_string(),
        retry: Duration::from_secs(60),
        ..EventsConfig::default()
    };

    let handle = InvalidationSubscriber::new(config, app.service.clone()).start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("subscriber did not stop")
        .unwrap();
}

/// Store that serves reads but rejects every mutation, like a Redis replica.
#[derive(Default)]
struct ReadOnlyStore {
    inner: MemoryStore,
}

#[async_trait]
impl CacheStore for ReadOnlyStore {
    fn backend(&self) -> &'static str {
        "read-only"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<usize> {
        Err(Error::Cache("READONLY You can't write against a read only replica.".into()))
    }

    async fn incr(&self, _key: &str) -> Result<i64> {
        Err(Error::Cache("READONLY You can't write against a read only replica.".into()))
    }
}

#[tokio::test]
async fn test_failed_eviction_is_an_error() {
    let notes = MockProvider::notes();
    let engine = SearchEngine::new(vec![Arc::new(notes.clone())]);
    let service = SearchService::new(
        engine.clone(),
        engine,
        SearchCache::new(Arc::new(ReadOnlyStore::default()), Duration::from_secs(120)),
        Arc::new(Metrics::new().unwrap()),
        Duration::from_secs(60),
    );
    let subscriber = InvalidationSubscriber::new(EventsConfig::default(), service);

    let err = subscriber
        .handle_event("note.updated", br#"{"user_id": 7}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cache(_)));

    // Unusable events are still acknowledged
    assert_eq!(subscriber.handle_event("note.updated", b"garbage").await.unwrap(), 0);
}

//! Shared setup for router tests: mock providers, in-memory cache, no
//! external services.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use tasknotes_api::{
    build_router, AppState, JwtAuth, MemoryStore, Metrics, SearchCache, SearchService,
};
use tasknotes_core::{ResultKind, UnifiedSearchResult};
use tasknotes_search::{mock::MockProvider, SearchEngine};

pub const JWT_SECRET: &str = "test-secret-key-for-testing-purposes-only";

pub struct TestApp {
    pub router: Router,
    pub service: SearchService,
    pub store: Arc<MemoryStore>,
    pub notes: MockProvider,
    pub tasks: MockProvider,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Tasks are merged into the unified path as well.
    pub fn with_merged_tasks() -> Self {
        Self::build(true)
    }

    fn build(merge_tasks: bool) -> Self {
        let notes = MockProvider::notes();
        let tasks = MockProvider::tasks();
        let store = Arc::new(MemoryStore::new());

        let mut merged = SearchEngine::new(vec![Arc::new(notes.clone())]);
        if merge_tasks {
            merged = merged.with_provider(Arc::new(tasks.clone()));
        }
        let by_kind = SearchEngine::new(vec![Arc::new(notes.clone()), Arc::new(tasks.clone())]);
        let service = SearchService::new(
            merged,
            by_kind,
            SearchCache::new(store.clone(), Duration::from_secs(120)),
            Arc::new(Metrics::new().unwrap()),
            Duration::from_secs(60),
        );

        let state = AppState::new(service.clone(), JwtAuth::new(Some(JWT_SECRET)));
        Self {
            router: build_router(state),
            service,
            store,
            notes,
            tasks,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn note(id: &str, title: &str, content: &str, day: u32) -> UnifiedSearchResult {
    UnifiedSearchResult::new(
        ResultKind::Note,
        id,
        title,
        content,
        Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
    )
}

pub fn task(id: &str, title: &str, day: u32) -> UnifiedSearchResult {
    let mut result = UnifiedSearchResult::new(
        ResultKind::Task,
        id,
        title,
        "",
        Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
    );
    result.completed = Some(false);
    result
}

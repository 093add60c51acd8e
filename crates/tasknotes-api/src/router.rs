//! Router assembly and shared handler state.

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::auth::JwtAuth;
use crate::handlers::{graphql, search, system};
use crate::metrics::{track_requests, Metrics};
use crate::services::SearchService;

/// State shared by every handler. Constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub metrics: Arc<Metrics>,
    pub schema: graphql::SearchSchema,
    pub auth: JwtAuth,
}

impl AppState {
    pub fn new(search: SearchService, auth: JwtAuth) -> Self {
        Self {
            metrics: search.metrics().clone(),
            schema: graphql::build_schema(search.clone()),
            search,
            auth,
        }
    }
}

/// Request ID generator using UUIDv7 (time-ordered).
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // REST search
        .route(
            "/",
            post(search::search_notes).get(search::search_notes_get),
        )
        .route(
            "/search/notes",
            post(search::search_notes).get(search::search_notes_get),
        )
        .route(
            "/search/tasks",
            post(search::search_tasks).get(search::search_tasks_get),
        )
        // GraphQL
        .route(
            "/graphql",
            post(graphql::graphql_handler).get(graphql::graphql_handler),
        )
        // System
        .route("/health", get(system::health_check))
        .route("/metrics", get(system::metrics))
        // Only matched routes are counted, keyed by their template.
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::ORIGIN,
                    header::CONTENT_LENGTH,
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    HeaderName::from_static("x-user-id"),
                ]),
        )
        .with_state(state)
}

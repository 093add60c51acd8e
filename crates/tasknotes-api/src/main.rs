//! tasknotes-search-service: unified notes and tasks search over REST and GraphQL.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use tasknotes_api::{
    build_router, logging, AppConfig, AppState, InvalidationSubscriber, JwtAuth, Metrics,
    SearchCache, SearchService,
};
use tasknotes_providers::{ProviderClients, ProviderConfig};
use tasknotes_search::SearchEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let config = AppConfig::from_env();
    let provider_config = ProviderConfig::from_env();
    info!(?config, "Configuration loaded");

    // Provider channels are required; failing to reach either is fatal.
    let clients = ProviderClients::connect(&provider_config).await?;

    let mut merged = SearchEngine::default().with_provider(Arc::new(clients.notes.clone()));
    if config.merge_tasks {
        merged = merged.with_provider(Arc::new(clients.tasks.clone()));
    }
    let by_kind = SearchEngine::default()
        .with_provider(Arc::new(clients.notes))
        .with_provider(Arc::new(clients.tasks));
    info!(
        merged = ?merged.provider_names(),
        merge_tasks = config.merge_tasks,
        "Search engine ready"
    );

    let cache = SearchCache::from_config(&config.cache).await;
    let metrics = Arc::new(Metrics::new()?);
    let search = SearchService::new(
        merged,
        by_kind,
        cache,
        metrics,
        config.request_timeout,
    );

    let subscriber = if search.cache().is_enabled() {
        Some(InvalidationSubscriber::new(config.events.clone(), search.clone()).start())
    } else {
        info!("Cache disabled, invalidation subscriber not started");
        None
    };

    let auth = JwtAuth::new(config.jwt_secret.as_deref());
    if !auth.is_enabled() {
        warn!("KEY_JWT not set, GraphQL bearer tokens are ignored");
    }

    let app = build_router(AppState::new(search, auth));

    let addr: SocketAddr = config.listen_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = subscriber {
        handle.shutdown().await?;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

//! gRPC-backed [`SearchProvider`] implementations.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info, warn};

use tasknotes_core::{
    Error, ProviderPage, Result, ResultKind, SearchContext, SearchProvider, SearchRequest,
    UnifiedSearchResult,
};

use crate::config::{EndpointConfig, ProviderConfig};
use crate::proto::notes::{NotesSearchServiceClient, SearchNotesRequest};
use crate::proto::tasks::{SearchTasksRequest, TasksSearchServiceClient};

/// Run one provider call within `budget`.
///
/// A zero budget fails without issuing the call. Elapsed budgets and
/// `DEADLINE_EXCEEDED` statuses both surface as [`Error::Timeout`]; any other
/// status becomes [`Error::Upstream`].
pub async fn bounded<T, F>(provider: &str, budget: Duration, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, tonic::Status>>,
{
    let timeout_err = || Error::Timeout {
        provider: provider.to_string(),
        after: budget,
    };

    if budget.is_zero() {
        return Err(timeout_err());
    }

    match tokio::time::timeout(budget, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(status)) if status.code() == tonic::Code::DeadlineExceeded => Err(timeout_err()),
        Ok(Err(status)) => Err(Error::upstream(
            provider,
            format!("{:?}: {}", status.code(), status.message()),
        )),
        Err(_) => Err(timeout_err()),
    }
}

fn with_deadline<T>(message: T, budget: Duration) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(budget);
    request
}

/// Notes search over `notes_search.NotesSearchService`.
#[derive(Debug, Clone)]
pub struct NotesProvider {
    client: NotesSearchServiceClient,
    timeout: Duration,
}

impl NotesProvider {
    pub fn new(channel: Channel, timeout: Duration) -> Self {
        Self {
            client: NotesSearchServiceClient::new(channel),
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for NotesProvider {
    fn name(&self) -> &str {
        "notes"
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Note
    }

    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> Result<ProviderPage> {
        let budget = ctx.budget(self.timeout);
        let start = Instant::now();
        let mut client = self.client.clone();
        let message = SearchNotesRequest::from(request);

        let response = bounded(
            self.name(),
            budget,
            client.search_notes(with_deadline(message, budget)),
        )
        .await
        .inspect_err(|e| {
            warn!(
                provider = self.name(),
                user_id = request.user_id,
                duration_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Provider call failed"
            )
        })?
        .into_inner();

        let results: Vec<UnifiedSearchResult> = response
            .notes
            .into_iter()
            .map(UnifiedSearchResult::from)
            .collect();

        debug!(
            provider = self.name(),
            user_id = request.user_id,
            result_count = results.len(),
            total = response.total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Provider call complete"
        );

        Ok(ProviderPage {
            results,
            total: response.total,
        })
    }
}

/// Task search over `tasks_search.TasksSearchService`.
#[derive(Debug, Clone)]
pub struct TasksProvider {
    client: TasksSearchServiceClient,
    timeout: Duration,
}

impl TasksProvider {
    pub fn new(channel: Channel, timeout: Duration) -> Self {
        Self {
            client: TasksSearchServiceClient::new(channel),
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for TasksProvider {
    fn name(&self) -> &str {
        "tasks"
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Task
    }

    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> Result<ProviderPage> {
        let budget = ctx.budget(self.timeout);
        let start = Instant::now();
        let mut client = self.client.clone();
        let message = SearchTasksRequest::from(request);

        let response = bounded(
            self.name(),
            budget,
            client.search_tasks(with_deadline(message, budget)),
        )
        .await
        .inspect_err(|e| {
            warn!(
                provider = self.name(),
                user_id = request.user_id,
                duration_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Provider call failed"
            )
        })?
        .into_inner();

        let results: Vec<UnifiedSearchResult> = response
            .tasks
            .into_iter()
            .map(UnifiedSearchResult::from)
            .collect();

        debug!(
            provider = self.name(),
            user_id = request.user_id,
            result_count = results.len(),
            total = response.total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Provider call complete"
        );

        Ok(ProviderPage {
            results,
            total: response.total,
        })
    }
}

/// Both provider clients, connected at startup.
#[derive(Debug, Clone)]
pub struct ProviderClients {
    pub notes: NotesProvider,
    pub tasks: TasksProvider,
}

impl ProviderClients {
    /// Dial both providers. Either failing aborts startup.
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let notes = dial("notes", &config.notes, config).await?;
        let tasks = dial("tasks", &config.tasks, config).await?;

        Ok(Self {
            notes: NotesProvider::new(notes, config.timeout),
            tasks: TasksProvider::new(tasks, config.timeout),
        })
    }
}

async fn dial(provider: &str, endpoint: &EndpointConfig, config: &ProviderConfig) -> Result<Channel> {
    let uri = endpoint.uri(config.tls.is_some());
    let mut builder = Endpoint::from_shared(uri.clone())
        .map_err(|e| Error::Config(format!("invalid {} address '{}': {}", provider, uri, e)))?
        .connect_timeout(config.connect_timeout);

    if let Some(tls) = &config.tls {
        let tls_config = tls.client_config(endpoint.server_name.as_deref()).await?;
        builder = builder
            .tls_config(tls_config)
            .map_err(|e| Error::Config(format!("{} TLS setup failed: {}", provider, e)))?;
    }

    let channel = builder
        .connect()
        .await
        .map_err(|e| Error::upstream(provider, format!("connect to {} failed: {}", uri, e)))?;

    info!(
        provider,
        address = %uri,
        tls = config.tls.is_some(),
        "Connected to search provider"
    );
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, tonic::Status>(1)
        };
        let err = bounded("notes", Duration::from_secs(2), slow)
            .await
            .unwrap_err();
        match err {
            Error::Timeout { provider, after } => {
                assert_eq!(provider, "notes");
                assert_eq!(after, Duration::from_secs(2));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bounded_zero_budget_skips_call() {
        let mut called = false;
        let call = async {
            called = true;
            Ok::<_, tonic::Status>(())
        };
        let err = bounded("tasks", Duration::ZERO, call).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(!called);
    }

    #[tokio::test]
    async fn test_bounded_maps_deadline_status_to_timeout() {
        let call = async { Err::<(), _>(tonic::Status::deadline_exceeded("late")) };
        let err = bounded("tasks", Duration::from_secs(1), call)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_bounded_maps_other_status_to_upstream() {
        let call = async { Err::<(), _>(tonic::Status::unavailable("connection refused")) };
        let err = bounded("notes", Duration::from_secs(1), call)
            .await
            .unwrap_err();
        match err {
            Error::Upstream { provider, message } => {
                assert_eq!(provider, "notes");
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bounded_passes_value_through() {
        let call = async { Ok::<_, tonic::Status>("page") };
        let value = bounded("notes", Duration::from_secs(1), call).await.unwrap();
        assert_eq!(value, "page");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_address() {
        let config = ProviderConfig {
            notes: EndpointConfig::new("http://bad address"),
            ..Default::default()
        };
        let err = ProviderClients::connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

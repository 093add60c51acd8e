//! Scripted search provider for deterministic testing.
//!
//! ## Usage
//!
//! ```ignore
//! use tasknotes_search::mock::MockProvider;
//!
//! let notes = MockProvider::notes().with_results(vec![note], 3);
//! let engine = SearchEngine::new(vec![Arc::new(notes.clone())]);
//! engine.unified_search(request, &ctx).await?;
//! assert_eq!(notes.call_count(), 1);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tasknotes_core::{
    defaults, Error, ProviderPage, Result, ResultKind, SearchContext, SearchProvider,
    SearchRequest, UnifiedSearchResult,
};

#[derive(Debug, Clone)]
enum Script {
    Page(ProviderPage),
    Corpus(Vec<UnifiedSearchResult>),
    Fail(String),
    Timeout,
}

/// Provider returning a fixed page (or failure) and recording every request.
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    kind: ResultKind,
    script: Arc<Mutex<Script>>,
    call_log: Arc<Mutex<Vec<SearchRequest>>>,
}

impl MockProvider {
    /// Create an empty provider of the given kind.
    pub fn new(name: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            name: name.into(),
            kind,
            script: Arc::new(Mutex::new(Script::Page(ProviderPage::default()))),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Empty notes provider named "notes".
    pub fn notes() -> Self {
        Self::new("notes", ResultKind::Note)
    }

    /// Empty tasks provider named "tasks".
    pub fn tasks() -> Self {
        Self::new("tasks", ResultKind::Task)
    }

    /// Return `results` with the given provider-reported total.
    pub fn with_results(self, results: Vec<UnifiedSearchResult>, total: i64) -> Self {
        self.set_script(Script::Page(ProviderPage { results, total }));
        self
    }

    /// Serve `corpus` page by page, honoring `skip` and `limit` and capping a
    /// page at [`defaults::PAGE_LIMIT_MAX`] like the real providers do.
    pub fn with_corpus(self, corpus: Vec<UnifiedSearchResult>) -> Self {
        self.set_script(Script::Corpus(corpus));
        self
    }

    /// Fail every call with an upstream error.
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.set_script(Script::Fail(message.into()));
        self
    }

    /// Fail every call with a timeout.
    pub fn timing_out(self) -> Self {
        self.set_script(Script::Timeout);
        self
    }

    /// Replace the page returned by subsequent calls.
    pub fn set_results(&self, results: Vec<UnifiedSearchResult>, total: i64) {
        self.set_script(Script::Page(ProviderPage { results, total }));
    }

    /// Fail subsequent calls with an upstream error.
    pub fn set_failure(&self, message: impl Into<String>) {
        self.set_script(Script::Fail(message.into()));
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<SearchRequest> {
        self.call_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().map(|log| log.len()).unwrap_or(0)
    }

    fn set_script(&self, script: Script) {
        if let Ok(mut current) = self.script.lock() {
            *current = script;
        }
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ResultKind {
        self.kind
    }

    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> Result<ProviderPage> {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(request.clone());
        }

        let script = self
            .script
            .lock()
            .map(|s| s.clone())
            .map_err(|_| Error::Internal("mock script poisoned".to_string()))?;

        match script {
            Script::Page(page) => Ok(page),
            Script::Corpus(corpus) => {
                let total = corpus.len() as i64;
                let skip = usize::try_from(request.skip).unwrap_or(0);
                let limit = request.limit.min(defaults::PAGE_LIMIT_MAX);
                let limit = usize::try_from(limit).unwrap_or(0);
                let results = corpus.into_iter().skip(skip).take(limit).collect();
                Ok(ProviderPage { results, total })
            }
            Script::Fail(message) => Err(Error::upstream(&self.name, message)),
            Script::Timeout => Err(Error::Timeout {
                provider: self.name.clone(),
                after: ctx.budget(std::time::Duration::from_secs(30)),
            }),
        }
    }
}

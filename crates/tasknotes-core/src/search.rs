//! Canonical search request and per-call context.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::defaults;
use crate::error::{Error, Result};

/// The one request shape every transport converts into.
///
/// Every query is scoped by `user_id`; a request without a positive user id
/// is rejected rather than broadened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub user_id: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub limit: i32,
    pub skip: i32,
}

impl SearchRequest {
    /// Create a request for a user with default paging.
    pub fn new(user_id: i32, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id,
            category: None,
            tags: Vec::new(),
            limit: defaults::PAGE_LIMIT,
            skip: 0,
        }
    }

    /// Filter by category. Empty strings are treated as no filter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (!category.is_empty()).then_some(category);
        self
    }

    /// Filter by tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the page size (normalized later).
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page offset (normalized later).
    pub fn with_skip(mut self, skip: i32) -> Self {
        self.skip = skip;
        self
    }

    /// Reject requests that must never reach a provider.
    pub fn validate(&self) -> Result<()> {
        if self.user_id <= 0 {
            return Err(Error::InvalidInput("user_id is required".to_string()));
        }
        if self.query.chars().count() > defaults::QUERY_MAX_CHARS {
            return Err(Error::InvalidInput(format!(
                "query exceeds {} characters",
                defaults::QUERY_MAX_CHARS
            )));
        }
        if let Some(category) = &self.category {
            if category.chars().count() > defaults::CATEGORY_MAX_CHARS {
                return Err(Error::InvalidInput(format!(
                    "category exceeds {} characters",
                    defaults::CATEGORY_MAX_CHARS
                )));
            }
        }
        if self.tags.len() > defaults::TAGS_MAX {
            return Err(Error::InvalidInput(format!(
                "at most {} tags are allowed",
                defaults::TAGS_MAX
            )));
        }
        if let Some(tag) = self
            .tags
            .iter()
            .find(|t| t.chars().count() > defaults::TAG_MAX_CHARS)
        {
            return Err(Error::InvalidInput(format!(
                "tag '{}' exceeds {} characters",
                tag.chars().take(defaults::TAG_MAX_CHARS).collect::<String>(),
                defaults::TAG_MAX_CHARS
            )));
        }
        Ok(())
    }

    /// Clamp paging: non-positive limit becomes the default, limit caps at
    /// the maximum, and skip floors at zero.
    pub fn normalized(mut self) -> Self {
        if self.limit <= 0 {
            self.limit = defaults::PAGE_LIMIT;
        } else if self.limit > defaults::PAGE_LIMIT_MAX {
            self.limit = defaults::PAGE_LIMIT_MAX;
        }
        self.skip = self.skip.max(0);
        self
    }

    /// Validate, then normalize.
    pub fn prepare(self) -> Result<Self> {
        self.validate()?;
        Ok(self.normalized())
    }
}

/// Which transport a request came through; used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSource {
    Rest,
    Graphql,
    Internal,
}

impl RequestSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestSource::Rest => "rest",
            RequestSource::Graphql => "graphql",
            RequestSource::Internal => "internal",
        }
    }
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request context passed alongside a [`SearchRequest`].
#[derive(Debug, Clone, Copy)]
pub struct SearchContext {
    pub source: RequestSource,
    /// Caller deadline. Sub-calls use the tighter of this and their own bound.
    pub deadline: Option<Instant>,
}

impl SearchContext {
    /// Context with no caller deadline.
    pub fn new(source: RequestSource) -> Self {
        Self {
            source,
            deadline: None,
        }
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(source: RequestSource, timeout: Duration) -> Self {
        Self {
            source,
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Time available to a sub-call with its own bound of `per_call`.
    pub fn budget(&self, per_call: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => per_call.min(deadline.saturating_duration_since(Instant::now())),
            None => per_call,
        }
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new(RequestSource::Internal)
    }
}

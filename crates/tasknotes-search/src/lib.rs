//! # tasknotes-search
//!
//! Multi-provider search aggregation for the TaskNotes search service.
//!
//! This crate provides:
//! - Parallel fan-out of one canonical request to every registered provider
//! - A stable relevance ordering (title match, content match, recency)
//! - Re-pagination of the merged set and per-kind total counts
//!
//! ## Example
//!
//! ```ignore
//! use tasknotes_search::{SearchEngine, SearchRequest, SearchContext, RequestSource};
//!
//! let engine = SearchEngine::new(vec![Arc::new(clients.notes)]);
//! let response = engine
//!     .unified_search(
//!         SearchRequest::new(7, "grocery").with_limit(10),
//!         &SearchContext::new(RequestSource::Rest),
//!     )
//!     .await?;
//! ```

pub mod engine;
pub mod ranking;

// Scripted provider for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use tasknotes_core::*;

pub use engine::SearchEngine;
pub use ranking::{paginate, sort_results, Rank};

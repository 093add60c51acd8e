//! # tasknotes-core
//!
//! Core types, traits, and abstractions for the TaskNotes search service.
//!
//! This crate provides the canonical [`SearchRequest`], the unified result
//! model, the error type, and the [`SearchProvider`] / [`CacheStore`] seams
//! that the other crates implement.
//!
//! ## Structured logging
//!
//! Every crate logs with `tracing` using the field names in [`logging`].

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use search::{RequestSource, SearchContext, SearchRequest};
pub use traits::{CacheStore, ProviderPage, SearchProvider};

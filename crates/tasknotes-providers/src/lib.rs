//! # tasknotes-providers
//!
//! gRPC clients for the notes and tasks search services.
//!
//! Each client implements [`tasknotes_core::SearchProvider`], converting the
//! canonical request to the provider's wire message and the provider's
//! records to [`tasknotes_core::UnifiedSearchResult`]. Channels are dialed
//! once at startup by [`ProviderClients::connect`] and shared afterwards.

pub mod client;
pub mod config;
pub mod convert;
pub mod proto;

pub use client::{bounded, NotesProvider, ProviderClients, TasksProvider};
pub use config::{EndpointConfig, ProviderConfig, TlsSettings};

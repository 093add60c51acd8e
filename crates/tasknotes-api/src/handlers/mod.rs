//! HTTP handlers.

pub mod graphql;
pub mod search;
pub mod system;

//! Read-mostly query service over card identification events, reconciled
//! against a static reference dataset of card images, sets and categories.

pub mod api;
pub mod catalog;
pub mod config;
pub mod database_ops;
pub mod enrich;
pub mod error;
pub mod normalization;
pub mod pivot;
pub mod query;
pub mod reconcile;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use database_ops::CardCatalog;
pub use error::{CoreError, CoreResult, ErrorKind, QueryPhase};

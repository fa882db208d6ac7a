//! Datastory client - HTTP adapters for the remote services
//!
//! This crate implements the core ports over reqwest: [`DynamoClient`] for
//! the analysis platform and [`CatalogClient`] for the CKAN-style dataset
//! catalog.

pub mod catalog;
pub mod dynamo;
mod http;

// Re-export main types
pub use catalog::CatalogClient;
pub use dynamo::DynamoClient;

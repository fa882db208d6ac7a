//! Datastory Core - Domain models, configuration, and remote ports
//!
//! This crate contains the domain types shared by the analysis-platform and
//! catalog adapters, the job pipeline, and the command-line front-end.

pub mod analysis;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use analysis::{AnalysisConfig, AnalysisKind};
pub use auth::AccessToken;
pub use error::{DatastoryError, Result};

//! Datastory jobs - Submission and execution monitoring
//!
//! This crate turns a catalog resource into a running analysis on the
//! remote platform and follows it until it finishes.

pub mod models;
pub mod pipeline;
pub mod poller;
pub mod service;
pub mod steps;

#[cfg(test)]
mod testing;

pub use models::{PollError, PollingConfig, PollingState};
pub use pipeline::SubmissionPipeline;
pub use poller::ExecutionPoller;
pub use service::TranscriptionService;
pub use steps::StepTracker;

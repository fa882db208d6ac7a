use chrono::{DateTime, Utc};
use datastory_core::config::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS};
use datastory_core::models::{
    Execution, ExecutionSummary, TranscriptionResult, DEFAULT_TERMINAL_STATUSES,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// What to poll and how often
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollingConfig {
    pub problem_statement_id: String,
    pub task_id: String,
    pub subtask_id: String,

    /// Delay between checks after the initial one
    pub interval: Duration,

    /// Check budget, the initial check included
    pub max_attempts: u32,

    /// Statuses that end polling, compared case-insensitively
    pub stop_on_status: Vec<String>,
}

impl PollingConfig {
    pub fn new(
        problem_statement_id: impl Into<String>,
        task_id: impl Into<String>,
        subtask_id: impl Into<String>,
    ) -> Self {
        Self {
            problem_statement_id: problem_statement_id.into(),
            task_id: task_id.into(),
            subtask_id: subtask_id.into(),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            stop_on_status: DEFAULT_TERMINAL_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Poll the subtask a submission produced
    pub fn for_result(result: &TranscriptionResult) -> Self {
        Self::new(&result.problem_statement_id, &result.task_id, &result.subtask_id)
    }

    /// Zero falls back to the default interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.interval = self.effective_interval();
        self
    }

    /// Zero falls back to the default attempt cap
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self.max_attempts = self.effective_max_attempts();
        self
    }

    /// Interval the poller actually waits, never zero
    pub fn effective_interval(&self) -> Duration {
        if self.interval.is_zero() {
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        } else {
            self.interval
        }
    }

    /// Attempt cap the poller actually enforces, never zero
    pub fn effective_max_attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            DEFAULT_POLL_MAX_ATTEMPTS
        } else {
            self.max_attempts
        }
    }

    pub fn with_stop_on_status(mut self, statuses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop_on_status = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any execution has reached one of the stop statuses
    pub fn is_terminal(&self, executions: &[Execution]) -> bool {
        executions.iter().any(|e| e.status_in(&self.stop_on_status))
    }
}

/// Error recorded in [`PollingState`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollError {
    #[error("Polling timeout: Maximum attempts ({max_attempts}) reached")]
    Timeout { max_attempts: u32 },

    /// A single check failed; polling carries on
    #[error("{message}")]
    Check { message: String },
}

/// Snapshot of the poller; `Default` is the idle state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PollingState {
    pub executions: Vec<Execution>,
    pub is_polling: bool,
    pub is_complete: bool,
    pub error: Option<PollError>,
    pub attempts: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PollingState {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self.error, Some(PollError::Timeout { .. }))
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary::from_executions(&self.executions)
    }

    /// Last execution in the order the platform returned them
    pub fn latest_execution(&self) -> Option<&Execution> {
        self.executions.last()
    }

    pub fn has_successful_execution(&self) -> bool {
        self.executions.iter().any(Execution::is_successful)
    }

    pub fn has_failed_execution(&self) -> bool {
        self.executions.iter().any(Execution::is_failed)
    }
}

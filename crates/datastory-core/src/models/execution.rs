use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::problem::TimePeriod;

/// Statuses that end polling unless the caller configures otherwise
pub const DEFAULT_TERMINAL_STATUSES: [&str; 4] = ["SUCCESS", "FAILURE", "FAILED", "CANCELLED"];

/// Statuses counted as a successful run
pub const SUCCESS_STATUSES: [&str; 1] = ["SUCCESS"];

/// Statuses counted as a failed run
pub const FAILURE_STATUSES: [&str; 3] = ["FAILURE", "FAILED", "CANCELLED"];

/// One remote run attempt of a subtask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,

    #[serde(default)]
    pub modelid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<HashMap<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runid: Option<String>,

    /// Free-form status reported by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Fraction of the run completed, 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_progress: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

impl Execution {
    /// Case-insensitive membership test of the status against `statuses`.
    /// An execution without a status never matches.
    pub fn status_in<S: AsRef<str>>(&self, statuses: &[S]) -> bool {
        match &self.status {
            Some(status) => statuses.iter().any(|s| s.as_ref().eq_ignore_ascii_case(status)),
            None => false,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status_in(&SUCCESS_STATUSES)
    }

    pub fn is_failed(&self) -> bool {
        self.status_in(&FAILURE_STATUSES)
    }

    pub fn progress(&self) -> f64 {
        self.run_progress.unwrap_or(0.0)
    }
}

/// Aggregate counts over a set of executions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    /// Mean of `run_progress`, missing values counted as 0
    pub progress: f64,
}

impl ExecutionSummary {
    pub fn from_executions(executions: &[Execution]) -> Self {
        if executions.is_empty() {
            return Self::default();
        }

        let total = executions.len();
        let completed = executions.iter().filter(|e| e.is_successful()).count();
        let failed = executions.iter().filter(|e| e.is_failed()).count();
        let progress = executions.iter().map(Execution::progress).sum::<f64>() / total as f64;

        Self {
            total,
            running: total - completed - failed,
            completed,
            failed,
            progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub model_id: String,
}

/// Model thread created by a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub modelid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<HashMap<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSubtaskResponse {
    #[serde(default)]
    pub thread: Option<Thread>,
    #[serde(default)]
    pub executions: Vec<Execution>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionsResponse {
    #[serde(default)]
    pub executions: Vec<Execution>,
}

/// Model input/output descriptor attached to a registered output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelIo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub io_type: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Resource produced by a finished execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputResource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_coverage: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_io: Option<ModelIo>,
    pub resource: OutputResource,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(id: &str, status: Option<&str>, progress: Option<f64>) -> Execution {
        Execution {
            id: id.to_string(),
            modelid: "m".to_string(),
            bindings: None,
            runid: None,
            status: status.map(str::to_string),
            run_progress: progress,
            results: None,
            selected: None,
        }
    }

    #[test]
    fn test_status_matching_is_case_insensitive() {
        let e = execution("e1", Some("success"), None);
        assert!(e.is_successful());
        assert!(e.status_in(&DEFAULT_TERMINAL_STATUSES));
        assert!(!e.is_failed());

        let e = execution("e2", Some("Cancelled"), None);
        assert!(e.is_failed());
    }

    #[test]
    fn test_missing_status_never_terminal() {
        let e = execution("e1", None, Some(0.5));
        assert!(!e.status_in(&DEFAULT_TERMINAL_STATUSES));
        assert!(!e.is_successful());
        assert!(!e.is_failed());
    }

    #[test]
    fn test_summary_counts() {
        let executions = vec![
            execution("a", Some("SUCCESS"), Some(1.0)),
            execution("b", Some("FAILURE"), Some(0.5)),
            execution("c", Some("RUNNING"), None),
        ];
        let summary = ExecutionSummary::from_executions(&executions);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.running, 1);
        assert!((summary.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        assert_eq!(ExecutionSummary::from_executions(&[]), ExecutionSummary::default());
    }

    #[test]
    fn test_execution_deserializes_sparse_payload() {
        let e: Execution = serde_json::from_str(r#"{"id":"x","modelid":"m"}"#).unwrap();
        assert_eq!(e.id, "x");
        assert!(e.status.is_none());
        assert_eq!(e.progress(), 0.0);
    }

    #[test]
    fn test_output_type_field_renamed() {
        let output: ExecutionOutput = serde_json::from_str(
            r#"{"model_io":{"id":"i","name":"n","type":"file","variables":[]},
                "resource":{"id":"r","name":"out.json","url":"http://x/out.json","type":"json"}}"#,
        )
        .unwrap();
        assert_eq!(output.model_io.unwrap().io_type, "file");
        assert_eq!(output.resource.resource_type.as_deref(), Some("json"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn status_strategy() -> impl Strategy<Value = Option<String>> {
            prop_oneof![
                Just(None),
                Just(Some("SUCCESS".to_string())),
                Just(Some("failed".to_string())),
                Just(Some("CANCELLED".to_string())),
                Just(Some("RUNNING".to_string())),
                Just(Some("waiting".to_string())),
            ]
        }

        proptest! {
            #[test]
            fn summary_partitions_total(
                statuses in proptest::collection::vec(status_strategy(), 0..20),
                progress in 0.0f64..=1.0,
            ) {
                let executions: Vec<Execution> = statuses
                    .iter()
                    .enumerate()
                    .map(|(i, s)| execution(&i.to_string(), s.as_deref(), Some(progress)))
                    .collect();
                let summary = ExecutionSummary::from_executions(&executions);
                prop_assert_eq!(summary.total, executions.len());
                prop_assert_eq!(summary.running + summary.completed + summary.failed, summary.total);
                prop_assert!(summary.progress >= 0.0 && summary.progress <= 1.0 + 1e-9);
            }
        }
    }
}

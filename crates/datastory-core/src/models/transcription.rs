use serde::{Deserialize, Serialize};

use super::catalog::Resource;
use super::problem::dataset_task_name;
use crate::analysis::AnalysisKind;

/// Progress of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    Error,
}

/// UI-facing record of one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionStep {
    pub id: String,
    pub title: String,
    pub status: StepStatus,
    pub message: String,
}

impl TranscriptionStep {
    pub fn pending(id: impl Into<String>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: StepStatus::Pending,
            message: message.into(),
        }
    }
}

/// What to create on the analysis platform for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub task_name: String,
    pub subtask_name: String,
    pub problem_statement_id: String,
    /// Registry key of the analysis type, resolved at submission time
    pub analysis_type: String,
}

impl TranscriptionConfig {
    /// Default naming for a resource: the task is shared per dataset title and
    /// the subtask is named after the analysis
    pub fn for_resource(kind: AnalysisKind, problem_statement_id: &str, resource: &Resource) -> Self {
        Self {
            task_name: dataset_task_name(&resource.name),
            subtask_name: format!("{} - {}", kind.config().name, resource.name),
            problem_statement_id: problem_statement_id.to_string(),
            analysis_type: kind.key().to_string(),
        }
    }
}

/// Identifiers of a submitted subtask and where to watch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub problem_statement_id: String,
    pub task_id: String,
    pub subtask_id: String,
    pub dashboard_url: String,
    pub region: String,
}

/// Dashboard page listing the runs of a subtask
pub fn dashboard_url(
    base_url: &str,
    region: &str,
    problem_statement_id: &str,
    task_id: &str,
    subtask_id: &str,
) -> String {
    format!(
        "{}/{}/modeling/problem_statement/{}/{}/{}/runs",
        base_url.trim_end_matches('/'),
        region,
        problem_statement_id,
        task_id,
        subtask_id
    )
}

use datastory_core::analysis::{AnalysisConfig, AnalysisKind};
use datastory_core::auth::AccessToken;
use datastory_core::error::{DatastoryError, Result};
use datastory_core::models::{
    dashboard_url, DatasetResource, NewSubtask, NewTask, ProblemStatement, Resource, StepStatus,
    SubmitRequest, TranscriptionConfig, TranscriptionResult, TranscriptionStep,
};
use datastory_core::ports::AnalysisApi;
use std::sync::Arc;
use tokio::sync::watch;

use crate::steps::StepTracker;

const STEP_TASKS: &str = "step1";
const STEP_SETUP: &str = "step2";
const STEP_SUBMIT: &str = "step3";

fn initial_steps() -> Vec<TranscriptionStep> {
    vec![
        TranscriptionStep::pending(
            STEP_TASKS,
            "Creating task and subtask",
            "Preparing to create task and subtask...",
        ),
        TranscriptionStep::pending(
            STEP_SETUP,
            "Setting up model configuration",
            "Waiting for task creation...",
        ),
        TranscriptionStep::pending(STEP_SUBMIT, "Submitting analysis", "Waiting for model setup..."),
    ]
}

/// Creates the remote objects a runnable subtask needs and submits it
pub struct SubmissionPipeline {
    api: Arc<dyn AnalysisApi>,
    dashboard_url: String,
    steps: StepTracker,
}

impl SubmissionPipeline {
    pub fn new(api: Arc<dyn AnalysisApi>, dashboard_url: impl Into<String>) -> Self {
        Self {
            api,
            dashboard_url: dashboard_url.into(),
            steps: StepTracker::new(),
        }
    }

    pub fn steps(&self) -> Vec<TranscriptionStep> {
        self.steps.snapshot()
    }

    pub fn subscribe_steps(&self) -> watch::Receiver<Vec<TranscriptionStep>> {
        self.steps.subscribe()
    }

    pub fn clear_steps(&self) {
        self.steps.clear();
    }

    /// Run the three steps for `resource`.
    ///
    /// An unknown analysis type fails before any remote call and before the
    /// step list is initialized. A failure in a later step marks that step as
    /// errored and leaves the following ones pending.
    pub async fn run(
        &self,
        resource: &Resource,
        config: &TranscriptionConfig,
        problem_statement: &ProblemStatement,
        token: &AccessToken,
    ) -> Result<TranscriptionResult> {
        let kind = AnalysisKind::from_key(&config.analysis_type)?;

        self.steps.initialize(initial_steps());
        tracing::info!(
            analysis = %kind,
            resource_id = %resource.id,
            problem_statement_id = %config.problem_statement_id,
            "Starting submission"
        );

        let outcome = self
            .execute(kind.config(), resource, config, problem_statement, token)
            .await;

        match &outcome {
            Ok(result) => tracing::info!(
                task_id = %result.task_id,
                subtask_id = %result.subtask_id,
                "Analysis submitted"
            ),
            Err(e) => {
                tracing::error!(error = %e, "Submission aborted");
                self.steps.fail_active(&e.to_string());
            }
        }

        outcome
    }

    async fn execute(
        &self,
        analysis: &AnalysisConfig,
        resource: &Resource,
        config: &TranscriptionConfig,
        problem_statement: &ProblemStatement,
        token: &AccessToken,
    ) -> Result<TranscriptionResult> {
        let ps_id = config.problem_statement_id.as_str();
        let dataset_id = resource.dataset.id.as_str();

        // Step 1: reuse the dataset's task when one exists
        self.steps
            .update(STEP_TASKS, "Creating task and subtask...", StepStatus::Active);

        let task_id = match self
            .api
            .find_existing_task(ps_id, dataset_id, &resource.name, token)
            .await
        {
            Some(task) => {
                tracing::debug!(task = %task.name, "Reusing existing task");
                task.id.ok_or_else(|| DatastoryError::missing_id("task"))?
            }
            None => {
                let task = NewTask {
                    name: config.task_name.clone(),
                    dates: problem_statement.dates.clone(),
                };
                self.api
                    .create_task(ps_id, &task, token)
                    .await?
                    .id
                    .ok_or_else(|| DatastoryError::missing_id("task"))?
            }
        };

        let subtask = NewSubtask {
            name: config.subtask_name.clone(),
            driving_variables: analysis.driving_variables.clone(),
            response_variables: analysis.response_variables.clone(),
            dates: problem_statement.dates.clone(),
            dataset_id: dataset_id.to_string(),
        };
        let subtask_id = self
            .api
            .create_subtask(ps_id, &task_id, &subtask, token)
            .await?
            .id
            .ok_or_else(|| DatastoryError::missing_id("subtask"))?;

        self.steps.update(
            STEP_TASKS,
            "Task and subtask created successfully!",
            StepStatus::Completed,
        );

        // Step 2
        self.steps.update(
            STEP_SETUP,
            "Setting up model configuration...",
            StepStatus::Active,
        );

        let mut setup = analysis.setup_request.clone();
        let bound = setup.bind_input(
            &analysis.input_data_id,
            dataset_id,
            DatasetResource {
                id: resource.id.clone(),
                url: resource.url.clone(),
            },
        );
        if !bound {
            tracing::warn!(
                slot = %analysis.input_data_id,
                "Setup template has no input slot for the resource"
            );
        }

        self.api
            .setup_model(ps_id, &task_id, &subtask_id, &setup, token)
            .await?;

        self.steps.update(
            STEP_SETUP,
            "Model configuration setup complete!",
            StepStatus::Completed,
        );

        // Step 3
        self.steps
            .update(STEP_SUBMIT, "Submitting analysis...", StepStatus::Active);

        let request = SubmitRequest {
            model_id: analysis.model_id.clone(),
        };
        self.api
            .submit_subtask(ps_id, &task_id, &subtask_id, &request, token)
            .await?;

        self.steps.update(
            STEP_SUBMIT,
            "Analysis submitted successfully!",
            StepStatus::Completed,
        );

        Ok(TranscriptionResult {
            dashboard_url: dashboard_url(
                &self.dashboard_url,
                &problem_statement.regionid,
                ps_id,
                &task_id,
                &subtask_id,
            ),
            problem_statement_id: ps_id.to_string(),
            task_id,
            subtask_id,
            region: problem_statement.regionid.clone(),
        })
    }
}

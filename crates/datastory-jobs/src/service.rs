use datastory_core::analysis::{analysis_types, AnalysisConfig, AnalysisKind};
use datastory_core::auth::AccessToken;
use datastory_core::config::{
    LayeredConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS,
};
use datastory_core::error::{DatastoryError, Result};
use datastory_core::models::{
    ExecutionOutput, NewProblemStatement, ProblemStatement, Resource, TranscriptionConfig,
    TranscriptionResult, TranscriptionStep,
};
use datastory_core::ports::AnalysisApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::models::{PollingConfig, PollingState};
use crate::pipeline::SubmissionPipeline;
use crate::poller::ExecutionPoller;

/// Single entry point for submitting transcriptions and following them
///
/// Combines a [`SubmissionPipeline`] and an [`ExecutionPoller`]. A successful
/// submission arms the poller with the new subtask; polling itself starts
/// only when [`TranscriptionService::start_polling`] is called.
pub struct TranscriptionService {
    api: Arc<dyn AnalysisApi>,
    pipeline: SubmissionPipeline,
    poller: ExecutionPoller,
    credential: Option<AccessToken>,
    poll_interval: Duration,
    poll_max_attempts: u32,
    problem_statements: Vec<ProblemStatement>,
    result: Option<TranscriptionResult>,
    submission_started: bool,
}

impl TranscriptionService {
    pub fn new(api: Arc<dyn AnalysisApi>, dashboard_url: impl Into<String>) -> Self {
        Self {
            pipeline: SubmissionPipeline::new(Arc::clone(&api), dashboard_url),
            poller: ExecutionPoller::new(Arc::clone(&api)),
            api,
            credential: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            problem_statements: Vec::new(),
            result: None,
            submission_started: false,
        }
    }

    /// Build from resolved configuration: dashboard URL, polling defaults
    /// and credential
    pub fn from_config(api: Arc<dyn AnalysisApi>, config: &LayeredConfig) -> Self {
        let (interval, max_attempts) = config.polling_defaults();
        Self::new(api, config.dashboard_url.value.clone())
            .with_polling(interval, max_attempts)
            .with_credential(config.access_token().cloned())
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_max_attempts = max_attempts;
        self
    }

    pub fn with_credential(mut self, credential: Option<AccessToken>) -> Self {
        self.set_credential(credential);
        self
    }

    pub fn set_credential(&mut self, credential: Option<AccessToken>) {
        self.poller.set_credential(credential.clone());
        self.credential = credential;
    }

    fn token(&self) -> Result<&AccessToken> {
        self.credential.as_ref().ok_or(DatastoryError::MissingCredential)
    }

    /// Registered analysis types, for pickers and listings
    pub fn analysis_types(&self) -> impl Iterator<Item = (AnalysisKind, &'static AnalysisConfig)> {
        analysis_types()
    }

    /// Problem statements from the last fetch
    pub fn problem_statements(&self) -> &[ProblemStatement] {
        &self.problem_statements
    }

    pub async fn refresh_problem_statements(&mut self) -> Result<&[ProblemStatement]> {
        let statements = self.api.list_problem_statements(self.token()?).await?;
        tracing::debug!(count = statements.len(), "Fetched problem statements");
        self.problem_statements = statements;
        Ok(&self.problem_statements)
    }

    /// Create a problem statement, then refetch the list
    pub async fn create_problem_statement(
        &mut self,
        data: &NewProblemStatement,
    ) -> Result<ProblemStatement> {
        let created = self.api.create_problem_statement(data, self.token()?).await?;
        tracing::info!(name = %created.name, "Created problem statement");

        if let Err(e) = self.refresh_problem_statements().await {
            tracing::warn!(error = %e, "Failed to refresh problem statements");
        }
        Ok(created)
    }

    /// Submit `resource` for analysis.
    ///
    /// Only one submission is accepted per service until
    /// [`reset_transcription`](Self::reset_transcription). On success the
    /// result is kept and the poller is armed for the new subtask.
    pub async fn start_transcription(
        &mut self,
        resource: &Resource,
        config: &TranscriptionConfig,
        problem_statement: &ProblemStatement,
    ) -> Result<TranscriptionResult> {
        let token = self.token()?.clone();
        AnalysisKind::from_key(&config.analysis_type)?;
        if self.submission_started {
            return Err(DatastoryError::SubmissionInProgress);
        }
        self.submission_started = true;

        let result = self
            .pipeline
            .run(resource, config, problem_statement, &token)
            .await?;

        let polling = PollingConfig::for_result(&result)
            .with_interval(self.poll_interval)
            .with_max_attempts(self.poll_max_attempts);
        self.poller.set_config(Some(polling));
        self.result = Some(result.clone());

        Ok(result)
    }

    /// Forget the current submission and return the poller to idle; safe in
    /// any state, including while polling
    pub fn reset_transcription(&mut self) {
        self.pipeline.clear_steps();
        self.result = None;
        self.poller.reset_polling();
        self.poller.set_config(None);
        self.submission_started = false;
    }

    pub fn current_result(&self) -> Option<&TranscriptionResult> {
        self.result.as_ref()
    }

    pub fn steps(&self) -> Vec<TranscriptionStep> {
        self.pipeline.steps()
    }

    pub fn subscribe_steps(&self) -> watch::Receiver<Vec<TranscriptionStep>> {
        self.pipeline.subscribe_steps()
    }

    pub fn poller(&self) -> &ExecutionPoller {
        &self.poller
    }

    pub fn polling_state(&self) -> PollingState {
        self.poller.state()
    }

    pub async fn start_polling(&self) -> Result<()> {
        self.poller.start_polling().await
    }

    pub fn stop_polling(&self) {
        self.poller.stop_polling();
    }

    /// Register the outputs of one execution of the current submission
    pub async fn register_outputs(&self, execution_id: &str) -> Result<Vec<ExecutionOutput>> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| DatastoryError::missing_id("transcription result"))?;

        let outputs = self
            .api
            .register_outputs(
                &result.problem_statement_id,
                &result.task_id,
                &result.subtask_id,
                execution_id,
                self.token()?,
            )
            .await?;

        tracing::info!(execution_id, count = outputs.len(), "Registered execution outputs");
        Ok(outputs)
    }

    /// Register the outputs of the latest polled execution
    pub async fn register_latest_outputs(&self) -> Result<Vec<ExecutionOutput>> {
        let execution_id = self
            .poller
            .state()
            .latest_execution()
            .map(|e| e.id.clone())
            .ok_or_else(|| DatastoryError::missing_id("execution"))?;
        self.register_outputs(&execution_id).await
    }
}

use async_trait::async_trait;
use datastory_core::auth::AccessToken;
use datastory_core::config::DEFAULT_ANALYSIS_API_URL;
use datastory_core::error::Result;
use datastory_core::models::{
    Execution, ExecutionOutput, ExecutionsResponse, NewProblemStatement, NewSubtask, NewTask,
    ProblemStatement, SetupRequest, SubmitRequest, SubmitSubtaskResponse, Subtask, Task,
};
use datastory_core::ports::AnalysisApi;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::http;

/// Analysis platform client
pub struct DynamoClient {
    /// Base URL including the API version (e.g., "http://localhost:3000/v1")
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl DynamoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create with default localhost URL
    pub fn localhost() -> Self {
        Self::new(DEFAULT_ANALYSIS_API_URL)
    }

    /// Wrap an existing reqwest client (custom timeouts, proxies)
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn subtask_path(problem_statement_id: &str, task_id: &str, subtask_id: &str) -> String {
        format!(
            "problemStatements/{}/tasks/{}/subtasks/{}",
            problem_statement_id, task_id, subtask_id
        )
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        token: &AccessToken,
    ) -> Result<(String, reqwest::Response)> {
        let url = http::join(&self.base_url, path);
        tracing::debug!(%method, url = %url, "Analysis API request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(token.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = http::send(&url, request).await?;
        Ok((url, response))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> Result<T> {
        let (url, response) = self.execute(Method::GET, path, None, token).await?;
        http::decode(&url, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, token: &AccessToken) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        let (url, response) = self.execute(Method::POST, path, Some(body), token).await?;
        http::decode(&url, response).await
    }
}

#[async_trait]
impl AnalysisApi for DynamoClient {
    async fn list_problem_statements(&self, token: &AccessToken) -> Result<Vec<ProblemStatement>> {
        self.get("problemStatements", token).await
    }

    async fn create_problem_statement(
        &self,
        data: &NewProblemStatement,
        token: &AccessToken,
    ) -> Result<ProblemStatement> {
        self.post("problemStatements", data, token).await
    }

    async fn list_tasks(&self, problem_statement_id: &str, token: &AccessToken) -> Result<Vec<Task>> {
        self.get(&format!("problemStatements/{}/tasks", problem_statement_id), token)
            .await
    }

    async fn create_task(
        &self,
        problem_statement_id: &str,
        data: &NewTask,
        token: &AccessToken,
    ) -> Result<Task> {
        self.post(&format!("problemStatements/{}/tasks", problem_statement_id), data, token)
            .await
    }

    async fn create_subtask(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        data: &NewSubtask,
        token: &AccessToken,
    ) -> Result<Subtask> {
        self.post(
            &format!("problemStatements/{}/tasks/{}/subtasks", problem_statement_id, task_id),
            data,
            token,
        )
        .await
    }

    async fn setup_model(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        request: &SetupRequest,
        token: &AccessToken,
    ) -> Result<()> {
        let path = format!(
            "{}/setup",
            Self::subtask_path(problem_statement_id, task_id, subtask_id)
        );
        // The setup endpoint's response body carries nothing we use
        self.execute(Method::POST, &path, Some(serde_json::to_vec(request)?), token)
            .await?;
        Ok(())
    }

    async fn submit_subtask(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        request: &SubmitRequest,
        token: &AccessToken,
    ) -> Result<SubmitSubtaskResponse> {
        let path = format!(
            "{}/submit",
            Self::subtask_path(problem_statement_id, task_id, subtask_id)
        );
        self.post(&path, request, token).await
    }

    async fn list_executions(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        token: &AccessToken,
    ) -> Result<Vec<Execution>> {
        let path = format!(
            "{}/executions",
            Self::subtask_path(problem_statement_id, task_id, subtask_id)
        );
        let response: ExecutionsResponse = self.get(&path, token).await?;
        Ok(response.executions)
    }

    async fn register_outputs(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        execution_id: &str,
        token: &AccessToken,
    ) -> Result<Vec<ExecutionOutput>> {
        let path = format!(
            "{}/executions/{}/outputs",
            Self::subtask_path(problem_statement_id, task_id, subtask_id),
            execution_id
        );
        let (url, response) = self.execute(Method::POST, &path, None, token).await?;
        http::decode(&url, response).await
    }
}

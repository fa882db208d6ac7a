//! Port trait definitions
//!
//! These traits define the interfaces that remote adapters must implement.

use async_trait::async_trait;

use crate::auth::AccessToken;
use crate::error::Result;
use crate::models::{
    Execution, ExecutionOutput, NewProblemStatement, NewResource, NewSubtask, NewTask, Package,
    PackageChanges, PackageSearchResult, ProblemStatement, CatalogResource, ResourceChanges,
    SetupRequest, SubmitRequest, SubmitSubtaskResponse, Subtask, Task, dataset_task_name,
};

/// Port for the remote analysis platform
///
/// Every call is authenticated independently with the supplied token and
/// surfaces non-2xx responses as `DatastoryError::RemoteRequest`.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// List all problem statements visible to the caller
    async fn list_problem_statements(&self, token: &AccessToken) -> Result<Vec<ProblemStatement>>;

    /// Create a problem statement; the platform assigns its id
    async fn create_problem_statement(
        &self,
        data: &NewProblemStatement,
        token: &AccessToken,
    ) -> Result<ProblemStatement>;

    async fn list_tasks(&self, problem_statement_id: &str, token: &AccessToken) -> Result<Vec<Task>>;

    async fn create_task(
        &self,
        problem_statement_id: &str,
        data: &NewTask,
        token: &AccessToken,
    ) -> Result<Task>;

    async fn create_subtask(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        data: &NewSubtask,
        token: &AccessToken,
    ) -> Result<Subtask>;

    /// Send the model configuration for a subtask
    async fn setup_model(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        request: &SetupRequest,
        token: &AccessToken,
    ) -> Result<()>;

    /// Start the configured model for a subtask
    async fn submit_subtask(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        request: &SubmitRequest,
        token: &AccessToken,
    ) -> Result<SubmitSubtaskResponse>;

    /// Current executions of a subtask, in the order the platform returns them
    async fn list_executions(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        token: &AccessToken,
    ) -> Result<Vec<Execution>>;

    /// Register the outputs of a finished execution as resources
    async fn register_outputs(
        &self,
        problem_statement_id: &str,
        task_id: &str,
        subtask_id: &str,
        execution_id: &str,
        token: &AccessToken,
    ) -> Result<Vec<ExecutionOutput>>;

    /// Find the task previously created for a dataset title.
    ///
    /// Lookup failures are logged and reported as `None` so callers fall back
    /// to creating a new task.
    async fn find_existing_task(
        &self,
        problem_statement_id: &str,
        dataset_id: &str,
        title: &str,
        token: &AccessToken,
    ) -> Option<Task> {
        let expected = dataset_task_name(title);
        match self.list_tasks(problem_statement_id, token).await {
            Ok(tasks) => tasks.into_iter().find(|task| task.name == expected),
            Err(e) => {
                tracing::error!(
                    problem_statement_id,
                    dataset_id,
                    error = %e,
                    "Error finding existing task"
                );
                None
            }
        }
    }
}

/// Port for the dataset catalog action API
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn package_search(&self, query: &str, rows: usize, start: usize)
        -> Result<PackageSearchResult>;

    async fn package_show(&self, id: &str) -> Result<Package>;

    async fn package_update(&self, id: &str, changes: &PackageChanges) -> Result<Package>;

    async fn resource_create(&self, resource: &NewResource) -> Result<CatalogResource>;

    async fn resource_update(&self, id: &str, changes: &ResourceChanges) -> Result<CatalogResource>;
}

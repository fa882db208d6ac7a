//! Scripted in-memory analysis platform for unit tests

use async_trait::async_trait;
use datastory_core::auth::AccessToken;
use datastory_core::error::{DatastoryError, Result};
use datastory_core::models::{
    Execution, ExecutionOutput, NewProblemStatement, NewSubtask, NewTask, OutputResource,
    ProblemStatement, SetupRequest, SubmitRequest, SubmitSubtaskResponse, Subtask, Task, Thread,
    TimePeriod,
};
use datastory_core::ports::AnalysisApi;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

type Scripted = std::result::Result<Vec<Execution>, (u16, String)>;

#[derive(Default)]
pub(crate) struct ScriptedApi {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, (u16, String)>>,
    tasks: Mutex<Vec<Task>>,
    problem_statements: Mutex<Vec<ProblemStatement>>,
    executions: Mutex<VecDeque<Scripted>>,
    execution_delay: Mutex<Option<Duration>>,
    pub(crate) setup_requests: Mutex<Vec<SetupRequest>>,
}

pub(crate) fn execution(id: &str, status: &str) -> Execution {
    Execution {
        id: id.to_string(),
        modelid: "model".to_string(),
        bindings: None,
        runid: None,
        status: Some(status.to_string()),
        run_progress: None,
        results: None,
        selected: None,
    }
}

pub(crate) fn period() -> TimePeriod {
    TimePeriod::new("2024-01-01T00:00:00Z", "2024-12-31T23:59:59Z")
}

pub(crate) fn token() -> AccessToken {
    AccessToken::new("test-token")
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every call to `method` fail with the given status and body
    pub(crate) fn fail(self, method: &'static str, status: u16, body: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(method, (status, body.to_string()));
        self
    }

    pub(crate) fn with_task(self, id: &str, name: &str) -> Self {
        self.tasks.lock().unwrap().push(Task {
            id: Some(id.to_string()),
            name: name.to_string(),
            dates: period(),
            subtasks: None,
        });
        self
    }

    /// Queue responses for `list_executions`; the last one repeats forever
    pub(crate) fn with_statuses(self, rounds: &[&[&str]]) -> Self {
        {
            let mut queue = self.executions.lock().unwrap();
            for round in rounds {
                let executions = round
                    .iter()
                    .enumerate()
                    .map(|(i, status)| execution(&format!("e{}", i + 1), status))
                    .collect();
                queue.push_back(Ok(executions));
            }
        }
        self
    }

    pub(crate) fn with_check_error(self, status: u16, body: &str) -> Self {
        self.executions
            .lock()
            .unwrap()
            .push_back(Err((status, body.to_string())));
        self
    }

    pub(crate) fn with_execution_delay(self, delay: Duration) -> Self {
        *self.execution_delay.lock().unwrap() = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == method).count()
    }

    fn record(&self, method: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.failures.lock().unwrap().get(method) {
            Some((status, body)) => Err(DatastoryError::RemoteRequest {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }

    fn next_executions(&self) -> Scripted {
        let mut queue = self.executions.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Ok(Vec::new()))
        } else {
            queue.front().cloned().unwrap_or(Ok(Vec::new()))
        }
    }
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn list_problem_statements(&self, _token: &AccessToken) -> Result<Vec<ProblemStatement>> {
        self.record("list_problem_statements")?;
        Ok(self.problem_statements.lock().unwrap().clone())
    }

    async fn create_problem_statement(
        &self,
        data: &NewProblemStatement,
        _token: &AccessToken,
    ) -> Result<ProblemStatement> {
        self.record("create_problem_statement")?;
        let mut statements = self.problem_statements.lock().unwrap();
        let created = ProblemStatement {
            id: Some(format!("ps{}", statements.len() + 1)),
            name: data.name.clone(),
            regionid: data.regionid.clone(),
            dates: data.dates.clone(),
            tasks: None,
        };
        statements.push(created.clone());
        Ok(created)
    }

    async fn list_tasks(&self, _ps: &str, _token: &AccessToken) -> Result<Vec<Task>> {
        self.record("list_tasks")?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, _ps: &str, data: &NewTask, _token: &AccessToken) -> Result<Task> {
        self.record("create_task")?;
        Ok(Task {
            id: Some("t-new".to_string()),
            name: data.name.clone(),
            dates: data.dates.clone(),
            subtasks: None,
        })
    }

    async fn create_subtask(
        &self,
        _ps: &str,
        _task_id: &str,
        data: &NewSubtask,
        _token: &AccessToken,
    ) -> Result<Subtask> {
        self.record("create_subtask")?;
        Ok(Subtask {
            id: Some("st-new".to_string()),
            name: data.name.clone(),
            driving_variables: data.driving_variables.clone(),
            response_variables: data.response_variables.clone(),
            dates: data.dates.clone(),
            dataset_id: data.dataset_id.clone(),
        })
    }

    async fn setup_model(
        &self,
        _ps: &str,
        _task_id: &str,
        _subtask_id: &str,
        request: &SetupRequest,
        _token: &AccessToken,
    ) -> Result<()> {
        self.record("setup_model")?;
        self.setup_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn submit_subtask(
        &self,
        _ps: &str,
        _task_id: &str,
        _subtask_id: &str,
        request: &SubmitRequest,
        _token: &AccessToken,
    ) -> Result<SubmitSubtaskResponse> {
        self.record("submit_subtask")?;
        Ok(SubmitSubtaskResponse {
            thread: Some(Thread {
                name: None,
                modelid: request.model_id.clone(),
                datasets: None,
                parameters: None,
            }),
            executions: Vec::new(),
        })
    }

    async fn list_executions(
        &self,
        _ps: &str,
        _task_id: &str,
        _subtask_id: &str,
        _token: &AccessToken,
    ) -> Result<Vec<Execution>> {
        self.record("list_executions")?;
        let delay = *self.execution_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.next_executions()
            .map_err(|(status, body)| DatastoryError::RemoteRequest { status, body })
    }

    async fn register_outputs(
        &self,
        _ps: &str,
        _task_id: &str,
        _subtask_id: &str,
        execution_id: &str,
        _token: &AccessToken,
    ) -> Result<Vec<ExecutionOutput>> {
        self.record("register_outputs")?;
        Ok(vec![ExecutionOutput {
            model_io: None,
            resource: OutputResource {
                id: format!("{}-out", execution_id),
                name: "transcript.json".to_string(),
                url: format!("https://files/{}/transcript.json", execution_id),
                time_period: None,
                spatial_coverage: None,
                selected: None,
                resource_type: None,
            },
        }])
    }
}

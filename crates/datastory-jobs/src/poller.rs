//! Execution polling state machine
//!
//! [`ExecutionPoller`] samples the executions of one subtask until one of
//! them reaches a stop status or the attempt budget runs out:
//!
//! ```text
//! Idle -> Polling -> {Complete | Errored | TimedOut | Stopped} -> Idle (reset)
//! ```
//!
//! The recurring checks run in a spawned task owned by the poller. Each tick
//! awaits its check before the next one is scheduled, so two checks never
//! overlap. Every start, stop and reset bumps a generation counter, and a
//! check only writes its outcome if the generation it started under is still
//! current. Late responses after a stop or reset are therefore discarded.

use chrono::Utc;
use datastory_core::auth::AccessToken;
use datastory_core::error::{DatastoryError, Result};
use datastory_core::models::Execution;
use datastory_core::ports::AnalysisApi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{PollError, PollingConfig, PollingState};

/// Polls the executions of one subtask
pub struct ExecutionPoller {
    shared: Arc<Shared>,
    task: Mutex<Option<PollTask>>,
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// State reachable from both the poller handle and its polling task
struct Shared {
    api: Arc<dyn AnalysisApi>,
    config: watch::Sender<Option<PollingConfig>>,
    credential: watch::Sender<Option<AccessToken>>,
    state: watch::Sender<PollingState>,
    generation: AtomicU64,
}

impl ExecutionPoller {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                config: watch::Sender::new(None),
                credential: watch::Sender::new(None),
                state: watch::Sender::new(PollingState::default()),
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn with_config(self, config: Option<PollingConfig>) -> Self {
        self.shared.config.send_replace(config);
        self
    }

    pub fn with_credential(self, credential: Option<AccessToken>) -> Self {
        self.shared.credential.send_replace(credential);
        self
    }

    /// Replace the live configuration. A running polling task picks up new
    /// identifiers on its next tick; clearing the configuration stops polling.
    pub fn set_config(&self, config: Option<PollingConfig>) {
        let cleared = config.is_none();
        self.shared.config.send_replace(config);
        if cleared {
            self.stop_polling();
        }
    }

    pub fn set_credential(&self, credential: Option<AccessToken>) {
        self.shared.credential.send_replace(credential);
    }

    pub fn config(&self) -> Option<PollingConfig> {
        self.shared.config.borrow().clone()
    }

    pub fn state(&self) -> PollingState {
        self.shared.state.borrow().clone()
    }

    pub fn is_polling(&self) -> bool {
        self.shared.state.borrow().is_polling
    }

    /// Config and credential are present and no polling is running
    pub fn can_start(&self) -> bool {
        self.shared.config.borrow().is_some()
            && self.shared.credential.borrow().is_some()
            && !self.is_polling()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollingState> {
        self.shared.state.subscribe()
    }

    /// Start polling.
    ///
    /// Does nothing without a configuration or a credential. The first check
    /// runs before this returns: if it already finds a stop status polling
    /// ends right there, and if it fails polling stops and the error is
    /// returned. Otherwise a background task keeps checking at the configured
    /// interval.
    pub async fn start_polling(&self) -> Result<()> {
        let Some(config) = self.config() else {
            tracing::debug!("No polling configuration, not starting");
            return Ok(());
        };
        if self.shared.credential.borrow().is_none() {
            tracing::debug!("No access token, not starting polling");
            return Ok(());
        }

        self.cancel_task();
        let generation = self.shared.begin();
        let interval = config.effective_interval();
        let max_attempts = config.effective_max_attempts();

        tracing::info!(
            subtask_id = %config.subtask_id,
            interval_ms = interval.as_millis() as u64,
            max_attempts,
            "Starting execution polling"
        );

        match self.shared.check(generation).await {
            Ok(true) => {
                tracing::info!(subtask_id = %config.subtask_id, "Executions already finished");
                self.shared.finish(generation, None);
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "Initial execution check failed");
                self.shared.finish(generation, None);
                return Err(e);
            }
        }

        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        // A stop or reset may have landed while the initial check was running
        if self.shared.current_generation() != generation {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.shared),
            generation,
            interval,
            max_attempts,
            cancel.clone(),
        ));
        *slot = Some(PollTask { cancel, handle });

        Ok(())
    }

    /// Fetch the executions once and record the outcome.
    ///
    /// Returns whether any execution reached a stop status. Failures are
    /// recorded in the state and returned.
    pub async fn check_executions(&self) -> Result<bool> {
        let generation = self.shared.current_generation();
        self.shared.check(generation).await
    }

    /// Stop polling; safe to call at any time, any number of times
    pub fn stop_polling(&self) {
        self.cancel_task();
        self.shared.state.send_if_modified(|state| {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            let was_polling = state.is_polling;
            state.is_polling = false;
            was_polling
        });
    }

    /// Stop polling and return to the idle state
    pub fn reset_polling(&self) {
        self.cancel_task();
        self.shared.state.send_modify(|state| {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            *state = PollingState::default();
        });
    }

    /// Wait until no polling task is running and return the final state
    pub async fn wait_until_stopped(&self) -> PollingState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| !state.is_polling).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    fn cancel_task(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}

impl Drop for ExecutionPoller {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

impl Shared {
    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Enter the polling state under a fresh generation
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.is_polling = true;
            state.is_complete = false;
            state.error = None;
            state.attempts = 0;
        });
        generation
    }

    /// Leave the polling state, if `generation` is still current
    fn finish(&self, generation: u64, error: Option<PollError>) {
        self.state.send_if_modified(|state| {
            if self.current_generation() != generation {
                return false;
            }
            state.is_polling = false;
            if error.is_some() {
                state.error = error;
            }
            true
        });
    }

    async fn fetch(&self) -> Result<(PollingConfig, Vec<Execution>)> {
        let config = self
            .config
            .borrow()
            .clone()
            .ok_or_else(|| DatastoryError::ConfigMissing {
                key: "polling configuration".to_string(),
            })?;
        let credential = self
            .credential
            .borrow()
            .clone()
            .ok_or(DatastoryError::MissingCredential)?;

        let executions = self
            .api
            .list_executions(
                &config.problem_statement_id,
                &config.task_id,
                &config.subtask_id,
                &credential,
            )
            .await?;

        Ok((config, executions))
    }

    async fn check(&self, generation: u64) -> Result<bool> {
        let outcome = self.fetch().await;

        let mut applied = false;
        let result = match outcome {
            Ok((config, executions)) => {
                let complete = config.is_terminal(&executions);
                self.state.send_if_modified(|state| {
                    if self.current_generation() != generation {
                        return false;
                    }
                    state.executions = executions;
                    state.is_complete = complete;
                    state.last_updated = Some(Utc::now());
                    state.attempts += 1;
                    state.error = None;
                    applied = true;
                    true
                });
                Ok(complete)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_if_modified(|state| {
                    if self.current_generation() != generation {
                        return false;
                    }
                    state.error = Some(PollError::Check { message });
                    state.last_updated = Some(Utc::now());
                    state.attempts += 1;
                    applied = true;
                    true
                });
                Err(e)
            }
        };

        if !applied {
            tracing::debug!(generation, "Discarding stale execution check");
        }
        result
    }
}

async fn run(
    shared: Arc<Shared>,
    generation: u64,
    interval: Duration,
    max_attempts: u32,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if shared.current_generation() != generation {
            break;
        }

        if shared.config.borrow().is_none() {
            tracing::debug!("Polling configuration cleared");
            shared.finish(generation, None);
            break;
        }

        let attempts = shared.state.borrow().attempts;
        if attempts >= max_attempts {
            tracing::warn!(max_attempts, "Polling timed out");
            shared.finish(generation, Some(PollError::Timeout { max_attempts }));
            break;
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = shared.check(generation) => outcome,
        };

        match outcome {
            Ok(true) => {
                tracing::info!(attempts = attempts + 1, "Executions reached a stop status");
                shared.finish(generation, None);
                break;
            }
            Ok(false) => {}
            Err(e) => {
                // Recorded in the state; the next tick retries
                tracing::warn!(error = %e, "Execution check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{token, ScriptedApi};
    use datastory_core::config::DEFAULT_POLL_INTERVAL_MS;

    fn config() -> PollingConfig {
        PollingConfig::new("ps1", "t1", "st1").with_interval(Duration::from_millis(1000))
    }

    fn poller(api: &Arc<ScriptedApi>, config: PollingConfig) -> ExecutionPoller {
        ExecutionPoller::new(api.clone())
            .with_config(Some(config))
            .with_credential(Some(token()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_first_check_never_arms_timer() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["SUCCESS"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();

        let state = poller.state();
        assert!(!state.is_polling);
        assert!(state.is_complete);
        assert_eq!(state.attempts, 1);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.count("list_executions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausting_attempts_times_out_after_exactly_n_checks() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config().with_max_attempts(4));

        poller.start_polling().await.unwrap();
        let state = poller.wait_until_stopped().await;

        assert_eq!(api.count("list_executions"), 4);
        assert!(!state.is_polling);
        assert!(!state.is_complete);
        assert!(state.is_timed_out());
        assert_eq!(state.error, Some(PollError::Timeout { max_attempts: 4 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_polls_at_default_rate() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let mut zeroed = PollingConfig::new("ps1", "t1", "st1");
        zeroed.interval = Duration::ZERO;
        zeroed.max_attempts = 2;
        let poller = poller(&api, zeroed);

        poller.start_polling().await.unwrap();
        assert!(poller.state().is_polling);

        time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS / 2)).await;
        assert_eq!(api.count("list_executions"), 1);

        let state = poller.wait_until_stopped().await;
        assert_eq!(api.count("list_executions"), 2);
        assert!(!state.is_polling);
        assert!(state.is_timed_out());
        assert!(poller.can_start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_configured_status() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[
            &["RUNNING"],
            &["RUNNING"],
            &["SUCCESS"],
        ]));
        let poller = poller(
            &api,
            config().with_max_attempts(3).with_stop_on_status(["SUCCESS"]),
        );

        poller.start_polling().await.unwrap();
        let state = poller.wait_until_stopped().await;

        assert_eq!(api.count("list_executions"), 3);
        assert!(state.is_complete);
        assert!(!state.has_error());
        assert!(state.has_successful_execution());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_errors_do_not_stop_polling() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses(&[&["RUNNING"]])
                .with_check_error(502, "bad gateway")
                .with_statuses(&[&["RUNNING", "FAILED"]]),
        );
        let poller = poller(&api, config().with_max_attempts(10));
        let mut rx = poller.subscribe();

        poller.start_polling().await.unwrap();

        // The failed tick is recorded but polling continues
        let errored = rx.wait_for(|s| s.has_error()).await.unwrap().clone();
        assert!(errored.is_polling);
        assert_eq!(errored.attempts, 2);

        let state = poller.wait_until_stopped().await;
        assert_eq!(api.count("list_executions"), 3);
        assert!(state.is_complete);
        assert!(state.has_failed_execution());
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_initial_check_stops_and_returns_error() {
        let api = Arc::new(ScriptedApi::new().with_check_error(500, "boom"));
        let poller = poller(&api, config());

        let err = poller.start_polling().await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let state = poller.state();
        assert!(!state.is_polling);
        assert_eq!(state.attempts, 1);
        assert!(matches!(state.error, Some(PollError::Check { .. })));

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("list_executions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_config_or_credential_is_noop() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));

        let without_config = ExecutionPoller::new(api.clone()).with_credential(Some(token()));
        without_config.start_polling().await.unwrap();
        assert!(!without_config.can_start());

        let without_token = ExecutionPoller::new(api.clone()).with_config(Some(config()));
        without_token.start_polling().await.unwrap();
        assert!(!without_token.can_start());

        assert!(api.calls().is_empty());
        assert_eq!(without_token.state(), PollingState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_mid_poll_returns_to_idle() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();
        assert!(poller.is_polling());
        assert!(!poller.can_start());

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(api.count("list_executions"), 3);

        poller.reset_polling();
        assert_eq!(poller.state(), PollingState::default());
        assert!(poller.can_start());

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("list_executions"), 3);
        assert_eq!(poller.state(), PollingState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_timeout_returns_to_idle() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config().with_max_attempts(2));

        poller.start_polling().await.unwrap();
        assert!(poller.wait_until_stopped().await.has_error());

        poller.reset_polling();
        assert_eq!(poller.state(), PollingState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_keeps_results() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();
        poller.stop_polling();
        poller.stop_polling();

        let state = poller.state();
        assert!(!state.is_polling);
        assert_eq!(state.executions.len(), 1);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.count("list_executions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_config_stops_polling() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();
        poller.set_config(None);

        assert!(!poller.is_polling());
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.count("list_executions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_reset_is_discarded() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses(&[&["SUCCESS"]])
                .with_execution_delay(Duration::from_secs(3)),
        );
        let poller = Arc::new(poller(&api, config()));

        let background = Arc::clone(&poller);
        let check = tokio::spawn(async move { background.check_executions().await });
        tokio::task::yield_now().await;
        assert_eq!(api.count("list_executions"), 1);

        poller.reset_polling();
        let complete = check.await.unwrap().unwrap();

        // The check itself succeeded, but its result never reached the state
        assert!(complete);
        assert_eq!(poller.state(), PollingState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_checks_never_overlap() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses(&[&["RUNNING"]])
                .with_execution_delay(Duration::from_millis(2500)),
        );
        let poller = poller(&api, config().with_max_attempts(3));

        poller.start_polling().await.unwrap();
        let state = poller.wait_until_stopped().await;

        // Each check takes longer than the interval, yet exactly one runs per tick
        assert_eq!(api.count("list_executions"), 3);
        assert_eq!(state.attempts, 3);
        assert!(state.is_timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_poller_cancels_task() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();
        drop(poller);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("list_executions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_identifiers_are_used_on_next_tick() {
        let api = Arc::new(ScriptedApi::new().with_statuses(&[&["RUNNING"], &["SUCCESS"]]));
        let poller = poller(&api, config());

        poller.start_polling().await.unwrap();
        poller.set_config(Some(PollingConfig::new("ps1", "t1", "st2")));
        assert!(poller.is_polling());

        let state = poller.wait_until_stopped().await;
        assert!(state.is_complete);
        assert_eq!(poller.config().map(|c| c.subtask_id), Some("st2".to_string()));
    }
}

//! Executions command implementation

use super::CommandContext;
use crate::cli::ExecutionsArgs;
use crate::output::OutputWriter;
use crate::output_types::ExecutionRow;
use crate::progress::{describe, PollProgress};
use anyhow::{Context, Result};
use datastory_core::error::DatastoryError;
use datastory_jobs::{ExecutionPoller, PollError, PollingConfig, PollingState};

pub async fn execute(args: ExecutionsArgs, ctx: &CommandContext) -> Result<()> {
    let token = ctx.token()?;
    let (interval, max_attempts) = ctx.config.polling_defaults();
    let subtask = &args.subtask;

    let poller = ExecutionPoller::new(ctx.analysis_api())
        .with_config(Some(
            PollingConfig::new(&subtask.problem, &subtask.task, &subtask.subtask)
                .with_interval(interval)
                .with_max_attempts(max_attempts),
        ))
        .with_credential(Some(token));

    let state = if args.watch {
        poller
            .start_polling()
            .await
            .context("Failed to check executions")?;
        follow_polling(&poller, &ctx.output).await
    } else {
        poller
            .check_executions()
            .await
            .context("Failed to check executions")?;
        poller.state()
    };

    if ctx.output.is_json() {
        ctx.output.result(&state)?;
    } else {
        report(&state, &ctx.output)?;
    }

    ensure_not_timed_out(&state)
}

/// Render poller updates until polling stops; Ctrl-C stops it early
pub async fn follow_polling(poller: &ExecutionPoller, output: &OutputWriter) -> PollingState {
    let max_attempts = poller.config().map(|c| c.max_attempts).unwrap_or_default();
    let progress = PollProgress::new(max_attempts, !output.is_json());
    let mut updates = poller.subscribe();

    let state = loop {
        let state = updates.borrow_and_update().clone();
        progress.update(&state);
        if !state.is_polling {
            break state;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break poller.state();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping polling");
                poller.stop_polling();
            }
        }
    };

    progress.finish(&state);
    if let Some(PollError::Check { message }) = &state.error {
        output.warning(format!("Last check failed: {}", message));
    }
    state
}

/// Human-readable execution table and summary
pub fn report(state: &PollingState, output: &OutputWriter) -> Result<()> {
    output.section("Executions");
    output.table(state.executions.iter().map(ExecutionRow::from).collect())?;
    output.kv("Checks", state.attempts);
    output.kv("Summary", describe(state));
    if let Some(updated) = state.last_updated {
        output.kv("Last updated", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

pub fn ensure_not_timed_out(state: &PollingState) -> Result<()> {
    match &state.error {
        Some(PollError::Timeout { max_attempts }) => Err(DatastoryError::PollingTimeout {
            max_attempts: *max_attempts,
        }
        .into()),
        _ => Ok(()),
    }
}

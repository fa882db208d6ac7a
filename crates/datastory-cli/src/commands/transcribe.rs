//! Transcribe command implementation

use super::executions::{ensure_not_timed_out, follow_polling, report};
use super::CommandContext;
use crate::cli::TranscribeArgs;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{OutputRow, TranscribeOutput};
use crate::progress::SubmissionProgress;
use anyhow::{Context, Result};
use datastory_core::analysis::AnalysisKind;
use datastory_core::error::Result as DatastoryResult;
use datastory_core::models::{
    ProblemStatement, Resource, TranscriptionConfig, TranscriptionResult,
};
use datastory_core::ports::CatalogApi;
use datastory_jobs::TranscriptionService;

pub async fn execute(args: TranscribeArgs, ctx: &CommandContext) -> Result<()> {
    let output = &ctx.output;
    let kind = AnalysisKind::from_key(&args.analysis)?;
    ctx.token()?;

    // Resolve the resource through the catalog
    let package = ctx
        .catalog()
        .package_show(&args.dataset)
        .await
        .with_context(|| format!("Failed to load dataset {}", args.dataset))?;
    let catalog_resource = package
        .resource(&args.resource)
        .ok_or_else(|| errors::resource_not_found(&args.dataset, &args.resource))?;
    let resource = Resource::from_catalog(&package, catalog_resource);

    let mut service = TranscriptionService::from_config(ctx.analysis_api(), &ctx.config);
    service
        .refresh_problem_statements()
        .await
        .context("Failed to list problem statements")?;
    let problem = service
        .problem_statements()
        .iter()
        .find(|ps| ps.id.as_deref() == Some(args.problem.as_str()))
        .cloned()
        .ok_or_else(|| errors::problem_not_found(&args.problem))?;

    let config = TranscriptionConfig::for_resource(kind, &args.problem, &resource);
    output.info(format!(
        "Submitting '{}' for {}",
        resource.name,
        kind.config().name
    ));

    let submission = submit(&mut service, &resource, &config, &problem, output)
        .await
        .context("Submission failed")?;

    if !output.is_json() {
        output.success("Analysis submitted");
        output.kv("Task", &submission.task_id);
        output.kv("Subtask", &submission.subtask_id);
        output.kv("Dashboard", &submission.dashboard_url);
    }

    if args.no_wait {
        if output.is_json() {
            output.result(TranscribeOutput {
                submission,
                polling: None,
                outputs: Vec::new(),
            })?;
        }
        return Ok(());
    }

    service
        .start_polling()
        .await
        .context("Failed to check executions")?;
    let state = follow_polling(service.poller(), output).await;
    ensure_not_timed_out(&state)?;

    let outputs = if args.register_outputs && state.has_successful_execution() {
        service
            .register_latest_outputs()
            .await
            .context("Failed to register outputs")?
    } else {
        if args.register_outputs {
            output.warning("No successful execution; outputs were not registered");
        }
        Vec::new()
    };

    if output.is_json() {
        output.result(TranscribeOutput {
            submission,
            polling: Some(state),
            outputs,
        })?;
    } else {
        report(&state, output)?;
        if !outputs.is_empty() {
            output.section("Registered Outputs");
            output.table(outputs.iter().map(OutputRow::from).collect())?;
        }
    }

    Ok(())
}

/// Run the submission while mirroring step updates onto spinners
async fn submit(
    service: &mut TranscriptionService,
    resource: &Resource,
    config: &TranscriptionConfig,
    problem: &ProblemStatement,
    output: &OutputWriter,
) -> DatastoryResult<TranscriptionResult> {
    let mut steps = service.subscribe_steps();
    let mut progress = SubmissionProgress::new(!output.is_json());

    let outcome = {
        let submission = service.start_transcription(resource, config, problem);
        tokio::pin!(submission);

        loop {
            tokio::select! {
                outcome = &mut submission => break outcome,
                Ok(()) = steps.changed() => progress.render(&steps.borrow_and_update()),
            }
        }
    };

    progress.render(&service.steps());
    progress.finish();
    outcome
}

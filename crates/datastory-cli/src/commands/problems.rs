//! Problems command implementation

use super::CommandContext;
use crate::cli::{CreateProblemArgs, ProblemsArgs, ProblemsCommand};
use crate::output_types::ProblemRow;
use anyhow::{bail, Context, Result};
use datastory_core::models::NewProblemStatement;
use datastory_jobs::TranscriptionService;

pub async fn execute(args: ProblemsArgs, ctx: &CommandContext) -> Result<()> {
    let mut service = TranscriptionService::from_config(ctx.analysis_api(), &ctx.config);
    ctx.token()?;

    match args.command {
        ProblemsCommand::List => list(&mut service, ctx).await,
        ProblemsCommand::Create(args) => create(args, &mut service, ctx).await,
    }
}

async fn list(service: &mut TranscriptionService, ctx: &CommandContext) -> Result<()> {
    let statements = service
        .refresh_problem_statements()
        .await
        .context("Failed to list problem statements")?;

    let rows: Vec<ProblemRow> = statements.iter().map(ProblemRow::from).collect();
    ctx.output.section(format!("Problem Statements ({})", rows.len()));
    ctx.output.table(rows)
}

async fn create(
    args: CreateProblemArgs,
    service: &mut TranscriptionService,
    ctx: &CommandContext,
) -> Result<()> {
    if args.end < args.start {
        bail!("End date {} is before start date {}", args.end, args.start);
    }

    let data = NewProblemStatement::from_days(&args.name, &args.region, args.start, args.end);
    let created = service
        .create_problem_statement(&data)
        .await
        .context("Failed to create problem statement")?;

    if ctx.output.is_json() {
        ctx.output.result(&created)?;
    } else {
        ctx.output.success(format!("Created problem statement '{}'", created.name));
        ctx.output.kv("ID", created.id.as_deref().unwrap_or("-"));
        ctx.output.kv("Region", &created.regionid);
        ctx.output.kv(
            "Period",
            format!("{} to {}", created.dates.start_date, created.dates.end_date),
        );
    }

    Ok(())
}

//! Outputs command implementation

use super::CommandContext;
use crate::cli::OutputsArgs;
use crate::output_types::OutputRow;
use anyhow::{Context, Result};

pub async fn execute(args: OutputsArgs, ctx: &CommandContext) -> Result<()> {
    let token = ctx.token()?;
    let subtask = &args.subtask;

    let outputs = ctx
        .analysis_api()
        .register_outputs(
            &subtask.problem,
            &subtask.task,
            &subtask.subtask,
            &args.execution,
            &token,
        )
        .await
        .with_context(|| format!("Failed to register outputs of execution {}", args.execution))?;

    ctx.output.section(format!("Registered Outputs ({})", outputs.len()));
    ctx.output.table(outputs.iter().map(OutputRow::from).collect())
}

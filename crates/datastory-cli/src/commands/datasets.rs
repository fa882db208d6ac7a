//! Datasets command implementation

use super::CommandContext;
use crate::cli::{DatasetsArgs, DatasetsCommand, SearchArgs, ShowDatasetArgs, StoryArgs};
use crate::output_types::{PackageRow, ResourceRow, SearchOutput};
use anyhow::{Context, Result};
use datastory_core::models::PackageChanges;
use datastory_core::ports::CatalogApi;

pub async fn execute(args: DatasetsArgs, ctx: &CommandContext) -> Result<()> {
    match args.command {
        DatasetsCommand::Search(args) => search(args, ctx).await,
        DatasetsCommand::Show(args) => show(args, ctx).await,
        DatasetsCommand::Story(args) => story(args, ctx).await,
    }
}

async fn search(args: SearchArgs, ctx: &CommandContext) -> Result<()> {
    let query = args.query.unwrap_or_default();
    let found = ctx
        .catalog()
        .package_search(&query, args.rows, args.start)
        .await
        .context("Failed to search datasets")?;

    let output = SearchOutput {
        count: found.count,
        results: found.results.iter().map(PackageRow::from).collect(),
    };

    if ctx.output.is_json() {
        ctx.output.result(output)?;
    } else {
        ctx.output.section(format!("Datasets ({} found)", output.count));
        ctx.output.table(output.results)?;
    }
    Ok(())
}

async fn show(args: ShowDatasetArgs, ctx: &CommandContext) -> Result<()> {
    let package = ctx
        .catalog()
        .package_show(&args.id)
        .await
        .with_context(|| format!("Failed to load dataset {}", args.id))?;

    if ctx.output.is_json() {
        return ctx.output.result(&package);
    }

    ctx.output.section(package.display_title());
    ctx.output.kv("ID", &package.id);
    ctx.output.kv("Name", &package.name);
    if let Some(author) = &package.author {
        ctx.output.kv("Author", author);
    }
    ctx.output.kv(
        "Story",
        package.notes.as_deref().filter(|n| !n.is_empty()).unwrap_or("(none)"),
    );

    ctx.output.section("Resources");
    ctx.output
        .table(package.resources.iter().map(ResourceRow::from).collect())
}

async fn story(args: StoryArgs, ctx: &CommandContext) -> Result<()> {
    let package = ctx
        .catalog()
        .package_update(&args.id, &PackageChanges::notes(args.notes))
        .await
        .with_context(|| format!("Failed to update the story of {}", args.id))?;

    if ctx.output.is_json() {
        ctx.output.result(&package)?;
    } else {
        ctx.output
            .success(format!("Updated story for '{}'", package.display_title()));
    }
    Ok(())
}

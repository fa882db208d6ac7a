//! Command implementations

mod analyses;
mod config;
mod datasets;
mod executions;
mod outputs;
mod problems;
mod transcribe;

use crate::cli::{Cli, Commands};
use crate::config_loader;
use crate::errors;
use crate::output::OutputWriter;
use anyhow::Result;
use datastory_client::{CatalogClient, DynamoClient};
use datastory_core::auth::AccessToken;
use datastory_core::config::LayeredConfig;
use datastory_core::ports::AnalysisApi;
use std::sync::Arc;

/// Resolved configuration and output mode shared by every command
pub struct CommandContext {
    pub config: LayeredConfig,
    pub output: OutputWriter,
}

impl CommandContext {
    pub fn token(&self) -> Result<AccessToken> {
        self.config
            .access_token()
            .cloned()
            .ok_or_else(|| anyhow::Error::new(errors::missing_token()))
    }

    pub fn analysis_api(&self) -> Arc<dyn AnalysisApi> {
        Arc::new(DynamoClient::new(self.config.analysis_api_url.value.clone()))
    }

    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::new(self.config.catalog_url.value.clone())
            .with_token(self.config.access_token().cloned())
    }
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    // The registry is static; listing it must work even with a broken config
    if matches!(cli.command, Commands::Analyses) {
        return analyses::execute(&output);
    }

    let config = config_loader::load_config(&cli)?;
    let ctx = CommandContext { config, output };

    match cli.command {
        Commands::Analyses => analyses::execute(&ctx.output),
        Commands::Problems(args) => problems::execute(args, &ctx).await,
        Commands::Datasets(args) => datasets::execute(args, &ctx).await,
        Commands::Transcribe(args) => transcribe::execute(args, &ctx).await,
        Commands::Executions(args) => executions::execute(args, &ctx).await,
        Commands::Outputs(args) => outputs::execute(args, &ctx).await,
        Commands::Config => config::execute(&ctx),
    }
}

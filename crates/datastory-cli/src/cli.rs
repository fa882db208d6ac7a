use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Datastory - Dataset stories and remote analysis jobs
#[derive(Parser, Debug)]
#[command(name = "datastory")]
#[command(about = "Browse catalog datasets and run remote analyses on their resources", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./datastory.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Access token for the analysis platform
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Analysis API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Dataset catalog base URL
    #[arg(long, global = true, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the supported analysis types
    Analyses,

    /// Manage problem statements
    Problems(ProblemsArgs),

    /// Browse catalog datasets and edit their stories
    Datasets(DatasetsArgs),

    /// Submit a dataset resource for analysis and follow its executions
    Transcribe(TranscribeArgs),

    /// Show the executions of a subtask
    Executions(ExecutionsArgs),

    /// Register the outputs of a finished execution
    Outputs(OutputsArgs),

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct ProblemsArgs {
    #[command(subcommand)]
    pub command: ProblemsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProblemsCommand {
    /// List problem statements
    List,

    /// Create a problem statement
    Create(CreateProblemArgs),
}

#[derive(Parser, Debug)]
pub struct CreateProblemArgs {
    /// Problem statement name
    #[arg(long)]
    pub name: String,

    /// Region identifier (e.g., "texas")
    #[arg(long)]
    pub region: String,

    /// First day covered (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day covered (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,
}

#[derive(Parser, Debug)]
pub struct DatasetsArgs {
    #[command(subcommand)]
    pub command: DatasetsCommand,
}

#[derive(Subcommand, Debug)]
pub enum DatasetsCommand {
    /// Search datasets (all datasets when no query is given)
    Search(SearchArgs),

    /// Show a dataset and its resources
    Show(ShowDatasetArgs),

    /// Replace the story text of a dataset
    Story(StoryArgs),
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: Option<String>,

    /// Number of results to return
    #[arg(long, default_value = "20")]
    pub rows: usize,

    /// Offset of the first result
    #[arg(long, default_value = "0")]
    pub start: usize,
}

#[derive(Parser, Debug)]
pub struct ShowDatasetArgs {
    /// Dataset id or name
    pub id: String,
}

#[derive(Parser, Debug)]
pub struct StoryArgs {
    /// Dataset id or name
    pub id: String,

    /// New story text
    #[arg(long)]
    pub notes: String,
}

#[derive(Parser, Debug)]
pub struct TranscribeArgs {
    /// Dataset id or name
    #[arg(long)]
    pub dataset: String,

    /// Resource id within the dataset
    #[arg(long)]
    pub resource: String,

    /// Problem statement id
    #[arg(long)]
    pub problem: String,

    /// Analysis type key
    #[arg(long, default_value = "audioTranscription")]
    pub analysis: String,

    /// Return after submitting instead of waiting for the executions
    #[arg(long)]
    pub no_wait: bool,

    /// Register the outputs of the latest execution once it succeeds
    #[arg(long)]
    pub register_outputs: bool,
}

#[derive(Parser, Debug)]
pub struct SubtaskArgs {
    /// Problem statement id
    #[arg(long)]
    pub problem: String,

    /// Task id
    #[arg(long)]
    pub task: String,

    /// Subtask id
    #[arg(long)]
    pub subtask: String,
}

#[derive(Parser, Debug)]
pub struct ExecutionsArgs {
    #[command(flatten)]
    pub subtask: SubtaskArgs,

    /// Keep polling until an execution reaches a terminal status
    #[arg(long)]
    pub watch: bool,
}

#[derive(Parser, Debug)]
pub struct OutputsArgs {
    #[command(flatten)]
    pub subtask: SubtaskArgs,

    /// Execution id
    #[arg(long)]
    pub execution: String,
}

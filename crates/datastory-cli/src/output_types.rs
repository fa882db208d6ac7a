use datastory_core::analysis::{AnalysisConfig, AnalysisKind};
use datastory_core::models::{
    CatalogResource, Execution, ExecutionOutput, Package, ProblemStatement, TranscriptionResult,
};
use datastory_jobs::PollingState;
use serde::Serialize;
use tabled::Tabled;

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

/// Row for the analyses command
#[derive(Debug, Serialize, Tabled)]
pub struct AnalysisRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(skip)]
    pub model_id: String,
}

impl AnalysisRow {
    pub fn new(kind: AnalysisKind, config: &AnalysisConfig) -> Self {
        Self {
            key: kind.key().to_string(),
            name: format!("{} {}", config.icon, config.name),
            description: config.description.clone(),
            model_id: config.model_id.clone(),
        }
    }
}

/// Row for problem statement listings
#[derive(Debug, Serialize, Tabled)]
pub struct ProblemRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Start")]
    pub start_date: String,
    #[tabled(rename = "End")]
    pub end_date: String,
}

impl From<&ProblemStatement> for ProblemRow {
    fn from(ps: &ProblemStatement) -> Self {
        Self {
            id: or_dash(ps.id.as_deref()),
            name: ps.name.clone(),
            region: ps.regionid.clone(),
            start_date: ps.dates.start_date.clone(),
            end_date: ps.dates.end_date.clone(),
        }
    }
}

/// Row for dataset search results
#[derive(Debug, Serialize, Tabled)]
pub struct PackageRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Resources")]
    pub resources: usize,
    #[tabled(rename = "Modified")]
    pub modified: String,
}

impl From<&Package> for PackageRow {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.clone(),
            title: package.display_title().to_string(),
            resources: package.num_resources.max(package.resources.len()),
            modified: or_dash(package.metadata_modified.as_deref()),
        }
    }
}

/// Output for datasets search
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub count: usize,
    pub results: Vec<PackageRow>,
}

/// Row for a dataset's resources
#[derive(Debug, Serialize, Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Format")]
    pub format: String,
    #[tabled(rename = "URL")]
    pub url: String,
}

impl From<&CatalogResource> for ResourceRow {
    fn from(resource: &CatalogResource) -> Self {
        Self {
            id: resource.id.clone(),
            name: or_dash(resource.name.as_deref()),
            format: or_dash(resource.format.as_deref()),
            url: resource.url.clone(),
        }
    }
}

/// Row for execution listings
#[derive(Debug, Serialize, Tabled)]
pub struct ExecutionRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Progress")]
    pub progress: String,
    #[tabled(rename = "Run")]
    pub run_id: String,
}

impl From<&Execution> for ExecutionRow {
    fn from(execution: &Execution) -> Self {
        Self {
            id: execution.id.clone(),
            status: or_dash(execution.status.as_deref()),
            progress: format!("{:.0}%", execution.progress() * 100.0),
            run_id: or_dash(execution.runid.as_deref()),
        }
    }
}

/// Row for registered outputs
#[derive(Debug, Serialize, Tabled)]
pub struct OutputRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "URL")]
    pub url: String,
}

impl From<&ExecutionOutput> for OutputRow {
    fn from(output: &ExecutionOutput) -> Self {
        Self {
            id: output.resource.id.clone(),
            name: output.resource.name.clone(),
            url: output.resource.url.clone(),
        }
    }
}

/// Row for the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Output for the transcribe command
#[derive(Debug, Serialize)]
pub struct TranscribeOutput {
    pub submission: TranscriptionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ExecutionOutput>,
}

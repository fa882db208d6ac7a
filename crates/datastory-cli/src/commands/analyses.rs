//! Analyses command implementation

use crate::output::OutputWriter;
use crate::output_types::AnalysisRow;
use anyhow::Result;
use datastory_core::analysis::analysis_types;

pub fn execute(output: &OutputWriter) -> Result<()> {
    let rows: Vec<AnalysisRow> = analysis_types()
        .map(|(kind, config)| AnalysisRow::new(kind, config))
        .collect();

    output.section("Analysis Types");
    output.table(rows)
}

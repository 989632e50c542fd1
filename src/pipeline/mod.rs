pub mod csv_out;

use serde::Serialize;
use tracing::info;

use crate::common::error::Result;
use crate::config::PipelineConfig;
use crate::sources::{fiscal_workbook, population, rankings, tax_burden};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    pub output_path: String,
}

/// Runs the four stages in order: workbook load, ranking merge, web
/// enrichment, write. Each stage executes exactly once; any failure aborts
/// the run with no partial output.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;

    let span = tracing::info_span!("stage", name = "fiscal_workbook");
    let fiscal = {
        let _enter = span.enter();
        fiscal_workbook::load(&config.workbook)?
    };

    let span = tracing::info_span!("stage", name = "ranking_merge");
    let mut merged = {
        let _enter = span.enter();
        let ranks = rankings::load(&config.rankings)?;
        let merged = ranks.left_join(&fiscal)?;
        info!(
            "After ranking merge: {} rows, {} columns",
            merged.row_count(),
            merged.columns().len()
        );
        merged
    };

    let span = tracing::info_span!("stage", name = "tax_burden");
    merged = {
        let _enter = span.enter();
        let burden = tax_burden::fetch(&config.tax_burden, &client)?;
        let merged = merged.left_join(&burden)?;
        info!(
            "After tax burden join: {} rows, {} columns",
            merged.row_count(),
            merged.columns().len()
        );
        merged
    };

    let span = tracing::info_span!("stage", name = "population");
    merged = {
        let _enter = span.enter();
        let population = population::fetch(&config.population, &client)?;
        let merged = merged.left_join(&population)?;
        info!(
            "After population join: {} rows, {} columns",
            merged.row_count(),
            merged.columns().len()
        );
        merged
    };

    csv_out::write(&merged, &config.output.path)?;
    info!("Wrote combined table to {}", config.output.path);

    Ok(RunSummary {
        rows: merged.row_count(),
        columns: merged.columns().len(),
        output_path: config.output.path.clone(),
    })
}

use tracing::info;

use crate::common::error::{PipelineError, Result};
use crate::config::PopulationConfig;
use crate::domain::{CellValue, StateTable};

pub const POPULATION_RENAMES: &[(&str, &str)] = &[("NAME", "State"), ("state", "num")];

/// Fetches population estimates from the Census API. The API key is read
/// from the environment and appended to the request URL here, never stored
/// in configuration.
pub fn fetch(cfg: &PopulationConfig, client: &reqwest::blocking::Client) -> Result<StateTable> {
    let key = std::env::var(&cfg.key_env_var)?;
    info!("Fetching population estimates from {}", cfg.url);
    let url = format!("{}&key={}", cfg.url, key);
    let body = client.get(&url).send()?.error_for_status()?.text()?;
    parse_population_json(&body)
}

/// The response is a JSON array of string arrays; the first array names the
/// columns and is dropped from the data.
pub fn parse_population_json(body: &str) -> Result<StateTable> {
    let rows: Vec<Vec<String>> = serde_json::from_str(body)?;
    let (header, data) = rows
        .split_first()
        .ok_or_else(|| PipelineError::Layout("population response has no header row".to_string()))?;

    let mut table = StateTable::new(header.clone());
    for row in data {
        table.push_row(row.iter().map(|cell| CellValue::from_raw(cell)).collect())?;
    }
    table.rename_columns(POPULATION_RENAMES);
    table.select(&["State", "POP_2020"])
}

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::common::error::{PipelineError, Result};

/// All source selectors live here as named configuration. The defaults are
/// the 2020 reference layout; there is no schema validation downstream, so a
/// source whose layout moves must be re-described here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workbook: WorkbookConfig,
    pub rankings: RankingsConfig,
    pub tax_burden: TaxBurdenConfig,
    pub population: PopulationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    pub path: String,
    /// Worksheet to read; first sheet when unset.
    pub sheet: Option<String>,
    /// Comma-separated spreadsheet column letters. The first entry is the
    /// category-label column, the rest are one column per state.
    pub column_letters: String,
    /// Sheet row indices excluded from the read.
    pub skip_rows: Vec<usize>,
    /// Trailing sheet rows dropped before the skip list is applied.
    pub skip_footer: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingsConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaxBurdenConfig {
    pub url: String,
    /// Position of the burden table among all tables on the page.
    pub table_index: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub url: String,
    /// Environment variable holding the API key appended to the request.
    pub key_env_var: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: "./data/2020_State_Local_Revs_Expns.xlsx".to_string(),
            sheet: None,
            column_letters: "B,H,M,R,W,AB,AG,AL,AQ,BA,BF,BK,BP,BU,BZ,CE,CJ,CO,CT,CY,\
                             DD,DI,DN,DS,DX,EC,EH,EM,ER,EW,FB,FG,FL,FQ,FV,GA,GF,GK,GP,GU,\
                             GZ,HE,HJ,HO,HT,HY,ID,II,IN,IS,IX"
                .to_string(),
            skip_rows: default_skip_rows(),
            skip_footer: 53,
        }
    }
}

/// Blank and unneeded sheet rows in the 2020 workbook layout.
fn default_skip_rows() -> Vec<usize> {
    let mut rows: Vec<usize> = (0..9).chain(10..15).chain(41..80).chain(90..97).collect();
    rows.extend_from_slice(&[
        16, 18, 23, 39, 98, 100, 102, 105, 106, 112, 116, 117, 119, 123, 124, 130, 131, 133,
        135, 138, 140, 141, 142,
    ]);
    rows.sort_unstable();
    rows
}

impl Default for RankingsConfig {
    fn default() -> Self {
        Self {
            path: "./data/State_Rankings.csv".to_string(),
        }
    }
}

impl Default for TaxBurdenConfig {
    fn default() -> Self {
        Self {
            url: "https://taxfoundation.org/tax-burden-by-state-2022/".to_string(),
            table_index: 2,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            url: "http://api.census.gov/data/2021/pep/population?get=NAME,POP_2020&for=state:*"
                .to_string(),
            key_env_var: "CENSUS_API_KEY".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./data/Ranks_Tax_ROI_2020_State_local.csv".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Falls back to the built-in reference selectors when no config file
    /// exists at `path`.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_skip_rows_are_sorted_and_unique() {
        let rows = default_skip_rows();
        let mut sorted = rows.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(rows, sorted);
        assert!(rows.contains(&0));
        assert!(rows.contains(&142));
        assert!(!rows.contains(&9));
        assert!(!rows.contains(&15));
    }

    #[test]
    fn test_load_or_default_uses_defaults_when_file_missing() {
        let config = PipelineConfig::load_or_default("no/such/config.toml").unwrap();
        assert_eq!(config.workbook.skip_footer, 53);
        assert_eq!(config.tax_burden.table_index, 2);
        assert_eq!(config.population.key_env_var, "CENSUS_API_KEY");
    }

    #[test]
    fn test_partial_config_keeps_unset_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[output]\npath = \"out/combined.csv\"").unwrap();

        let config = PipelineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.output.path, "out/combined.csv");
        assert_eq!(config.rankings.path, "./data/State_Rankings.csv");
        assert_eq!(config.workbook.skip_footer, 53);
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let err = PipelineConfig::load("no/such/config.toml").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}

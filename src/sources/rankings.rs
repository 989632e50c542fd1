use tracing::info;

use crate::common::error::Result;
use crate::config::RankingsConfig;
use crate::domain::{CellValue, StateTable};

/// Raw ranking-file headers mapped to canonical names. Party-control columns
/// pass through untouched as categorical text.
pub const RANKING_RENAMES: &[(&str, &str)] = &[
    ("Revenue1", "Total_Revenue"),
    ("Health", "Health_Score"),
    ("Overall Gov’t. Services Rank", "Overall_Rank"),
    ("Total Score", "Total_Score"),
    ("Education", "Education_Score"),
    ("Safety", "Safety_Score"),
    ("Economy", "Economy_Score"),
    ("Infrastructure & Pollution", "Infra_Pollution_Score"),
    ("2020 Vote", "Vote_2020"),
];

/// Reads the ranking file. The source is expected to carry exactly one row
/// per state for all 50 states; nothing here checks that.
pub fn load(cfg: &RankingsConfig) -> Result<StateTable> {
    info!("Reading state rankings from {}", cfg.path);
    let mut reader = csv::Reader::from_path(&cfg.path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut table = StateTable::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(CellValue::from_raw).collect())?;
    }
    table.rename_columns(RANKING_RENAMES);
    info!("Loaded {} ranking rows", table.row_count());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_applies_rename_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rankings.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "State,Overall Gov’t. Services Rank,Total Score,Revenue1,Health,Legislature,Governor"
        )
        .unwrap();
        writeln!(file, "Texas,5,61.62,100,23,Republican,Republican").unwrap();
        writeln!(file, "Ohio,12,58.50,90,17,Republican,Republican").unwrap();

        let table = load(&RankingsConfig {
            path: path.to_str().unwrap().to_string(),
        })
        .unwrap();

        assert_eq!(
            table.columns(),
            &[
                "State",
                "Overall_Rank",
                "Total_Score",
                "Total_Revenue",
                "Health_Score",
                "Legislature",
                "Governor"
            ]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value("Texas", "Overall_Rank"), Some(&CellValue::Int(5)));
        assert_eq!(
            table.value("Ohio", "Total_Score"),
            Some(&CellValue::Float(58.50))
        );
        assert_eq!(
            table.value("Texas", "Governor"),
            Some(&CellValue::Text("Republican".to_string()))
        );
    }
}

use calamine::{open_workbook, Data, Reader, Xlsx};
use tracing::info;

use crate::common::error::{PipelineError, Result};
use crate::config::WorkbookConfig;
use crate::domain::{CellValue, StateTable, STATE_KEY};

/// Abbreviated workbook categories mapped to fully qualified expenditure
/// names. Two historical spellings of the natural-resources row map to the
/// same final column.
pub const EXPENDITURE_RENAMES: &[(&str, &str)] = &[
    ("Health", "Health_Expenditures"),
    ("Education", "Education_Expenditures"),
    ("Public_welfare", "Public_Welfare_Expenditures"),
    ("Hospitals", "Hospital_Expenditures"),
    ("Highways", "Highway_Expenditures"),
    ("Police_protection", "Police_Expenditures"),
    ("Correction", "Corrections_Expenditures"),
    ("Natural_Resources", "Natural_Resources_Expenditures"),
    ("Natural_resources", "Natural_Resources_Expenditures"),
    ("Parks_and_recreation", "Parks_Rec_Expenditures"),
    ("Governmental_administration", "Govt_Admin_Expenditures"),
];

/// Reads the fiscal workbook and normalizes it into one row per state.
pub fn load(cfg: &WorkbookConfig) -> Result<StateTable> {
    info!("Reading fiscal workbook from {}", cfg.path);
    let mut workbook: Xlsx<_> = open_workbook(&cfg.path)?;
    let sheet = match &cfg.sheet {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::Layout("workbook has no worksheets".to_string()))?,
    };
    let range = workbook.worksheet_range(&sheet)?;
    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    let columns = parse_column_letters(&cfg.column_letters)?;
    let table = normalize_grid(&grid, &columns, &cfg.skip_rows, cfg.skip_footer)?;
    info!(
        "Loaded {} states with {} fiscal columns",
        table.row_count(),
        table.columns().len() - 1
    );
    Ok(table)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Int(*i),
        // Whole-number amounts come back from the sheet as floats
        Data::Float(f) if f.fract() == 0.0 => CellValue::Int(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::from_raw(s),
        other => CellValue::Text(other.to_string()),
    }
}

/// Converts a comma-separated spreadsheet letter list ("B,H,AB") into
/// zero-based column indices.
pub fn parse_column_letters(letters: &str) -> Result<Vec<usize>> {
    letters
        .split(',')
        .map(|token| {
            let token = token.trim();
            let mut index = 0usize;
            for ch in token.chars() {
                if !ch.is_ascii_alphabetic() {
                    return Err(PipelineError::Layout(format!(
                        "invalid column letter '{}'",
                        token
                    )));
                }
                index = index * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
            }
            if index == 0 {
                return Err(PipelineError::Layout("empty column letter".to_string()));
            }
            Ok(index - 1)
        })
        .collect()
}

/// Applies the fixed row/column selection to the raw sheet grid and
/// transposes it into one row per state.
///
/// The first kept row supplies state names; its label-column cell is the
/// sheet's units note and is ignored. Each following kept row is one fiscal
/// category: label in the first selected column, one value per state. There
/// is no layout validation; selectors that no longer line up with the sheet
/// produce garbage columns rather than errors.
pub fn normalize_grid(
    grid: &[Vec<CellValue>],
    column_indices: &[usize],
    skip_rows: &[usize],
    skip_footer: usize,
) -> Result<StateTable> {
    if column_indices.len() < 2 {
        return Err(PipelineError::Layout(
            "need a label column and at least one state column".to_string(),
        ));
    }
    let body_len = grid.len().saturating_sub(skip_footer);
    let kept: Vec<&Vec<CellValue>> = grid[..body_len]
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip_rows.contains(i))
        .map(|(_, row)| row)
        .collect();
    let (header, categories) = kept
        .split_first()
        .ok_or_else(|| PipelineError::Layout("no rows left after skip filtering".to_string()))?;

    let cell_at =
        |row: &Vec<CellValue>, col: usize| row.get(col).cloned().unwrap_or(CellValue::Null);

    let states: Vec<String> = column_indices[1..]
        .iter()
        .map(|&c| cell_at(header, c).to_string().trim().to_string())
        .collect();

    let mut columns = vec![STATE_KEY.to_string()];
    let mut state_rows: Vec<Vec<CellValue>> = states
        .iter()
        .map(|s| vec![CellValue::Text(s.clone())])
        .collect();

    for row in categories {
        let label = cell_at(row, column_indices[0]).to_string();
        columns.push(label.trim().replace(' ', "_"));
        for (state_idx, &col) in column_indices[1..].iter().enumerate() {
            state_rows[state_idx].push(cell_at(row, col));
        }
    }

    let mut table = StateTable::new(columns);
    for row in state_rows {
        table.push_row(row)?;
    }
    table.rename_columns(EXPENDITURE_RENAMES);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_parse_column_letters() {
        assert_eq!(parse_column_letters("B,H,AB,IX").unwrap(), vec![1, 7, 27, 257]);
        assert_eq!(parse_column_letters("A").unwrap(), vec![0]);
        assert!(parse_column_letters("B,3").is_err());
        assert!(parse_column_letters("B,,H").is_err());
    }

    #[test]
    fn test_normalize_grid_transposes_and_renames() {
        // Column 0 is noise the letter list skips; 1 holds labels; 2 and 4
        // hold two states with a filler column between them.
        let grid = vec![
            vec![text("junk"), text("skip me"), CellValue::Null, CellValue::Null, CellValue::Null],
            vec![
                CellValue::Null,
                text("thousands of dollars"),
                text(" Texas "),
                CellValue::Null,
                text("Ohio"),
            ],
            vec![
                CellValue::Null,
                text("Total Revenue"),
                CellValue::Int(100),
                CellValue::Null,
                CellValue::Int(50),
            ],
            vec![
                CellValue::Null,
                text(" Natural resources "),
                CellValue::Int(7),
                CellValue::Null,
                CellValue::Int(3),
            ],
            vec![text("footer"), text("footer"), CellValue::Null, CellValue::Null, CellValue::Null],
        ];

        let table = normalize_grid(&grid, &[1, 2, 4], &[0], 1).unwrap();
        assert_eq!(
            table.columns(),
            &["State", "Total_Revenue", "Natural_Resources_Expenditures"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value("Texas", "Total_Revenue"), Some(&CellValue::Int(100)));
        assert_eq!(
            table.value("Ohio", "Natural_Resources_Expenditures"),
            Some(&CellValue::Int(3))
        );
    }

    #[test]
    fn test_normalize_grid_needs_rows_after_filtering() {
        let grid = vec![vec![text("only row")]];
        let err = normalize_grid(&grid, &[0, 1], &[0], 0).unwrap_err();
        assert!(matches!(err, PipelineError::Layout(_)));
    }

    #[test]
    fn test_cell_value_keeps_whole_floats_integral() {
        assert_eq!(cell_value(&Data::Float(1234.0)), CellValue::Int(1234));
        assert_eq!(cell_value(&Data::Float(8.25)), CellValue::Float(8.25));
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::String("  Alaska ".to_string())), text("Alaska"));
    }
}

use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::common::error::{PipelineError, Result};
use crate::config::TaxBurdenConfig;
use crate::domain::{CellValue, StateTable};

pub const BURDEN_RENAMES: &[(&str, &str)] = &[("2020Rate", "2020_Tax_Burden")];

/// Fetches the tax-burden page and reduces the target table to state name
/// plus burden percentage. The percentage stays text ("8.2%").
pub fn fetch(cfg: &TaxBurdenConfig, client: &reqwest::blocking::Client) -> Result<StateTable> {
    info!("Fetching tax burden table from {}", cfg.url);
    let body = client.get(&cfg.url).send()?.error_for_status()?.text()?;
    parse_burden_table(&body, cfg.table_index)
}

/// Extracts the table at `table_index` among all tables on the page.
///
/// Selecting by position is a contract with the remote page: a page with too
/// few tables fails loudly here, while a reordered page that still has
/// enough tables silently yields the wrong one.
pub fn parse_burden_table(html: &str, table_index: usize) -> Result<StateTable> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let tables: Vec<ElementRef> = document.select(&table_sel).collect();
    let table = tables.get(table_index).ok_or_else(|| {
        PipelineError::Layout(format!(
            "page has {} tables, wanted index {}",
            tables.len(),
            table_index
        ))
    })?;

    let mut header_rows: Vec<Vec<String>> = Vec::new();
    let mut data_rows: Vec<Vec<String>> = Vec::new();
    for row in table.select(&row_sel) {
        let mut is_header = false;
        let mut cells: Vec<String> = Vec::new();
        for cell in row.select(&cell_sel) {
            if cell.value().name() == "th" {
                is_header = true;
            }
            let text = cell.text().collect::<String>().trim().to_string();
            let span: usize = cell
                .value()
                .attr("colspan")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            // Spanned header cells repeat their text across every column
            // they cover, mirroring how the year row sits above rate/rank
            // pairs.
            for _ in 0..span {
                cells.push(text.clone());
            }
        }
        if cells.is_empty() {
            continue;
        }
        if is_header {
            header_rows.push(cells);
        } else {
            data_rows.push(cells);
        }
    }

    if header_rows.len() < 2 {
        return Err(PipelineError::Layout(format!(
            "burden table has {} header rows, expected a caption row above year and metric rows",
            header_rows.len()
        )));
    }

    // The top header row is a spanning caption; column names come from
    // concatenating the remaining header rows per column. Empty header cells
    // contribute nothing, so the state column flattens to "State" and the
    // rate column to "2020Rate".
    let levels = &header_rows[1..];
    let width = levels.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut columns = Vec::with_capacity(width);
    for i in 0..width {
        let mut name = String::new();
        for level in levels {
            if let Some(text) = level.get(i) {
                name.push_str(text);
            }
        }
        columns.push(name);
    }

    let mut table = StateTable::new(columns);
    let n_cols = table.columns().len();
    for cells in data_rows {
        let mut row: Vec<CellValue> = cells.iter().map(|s| CellValue::from_raw(s)).collect();
        row.truncate(n_cols);
        row.resize(n_cols, CellValue::Null);
        table.push_row(row)?;
    }
    table.rename_columns(BURDEN_RENAMES);

    let burden = table.select(&["State", "2020_Tax_Burden"])?;
    if burden.row_count() == 0 {
        warn!("Tax burden table parsed to zero rows - the page structure may have changed");
    }
    Ok(burden)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table><tr><th>Unrelated</th></tr><tr><td>first</td></tr></table>
        <table><tr><th>Also unrelated</th></tr><tr><td>second</td></tr></table>
        <table>
          <thead>
            <tr><th colspan="5">State-Local Tax Burdens, Calendar Year 2020</th></tr>
            <tr><th></th><th colspan="2">2020</th><th colspan="2">2019</th></tr>
            <tr><th>State</th><th>Rate</th><th>Rank</th><th>Rate</th><th>Rank</th></tr>
          </thead>
          <tbody>
            <tr><td>Texas</td><td>8.2%</td><td>6</td><td>8.0%</td><td>7</td></tr>
            <tr><td>Ohio</td><td>10.0%</td><td>24</td><td>9.8%</td><td>22</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_selects_table_by_position() {
        let table = parse_burden_table(PAGE, 2).unwrap();
        assert_eq!(table.columns(), &["State", "2020_Tax_Burden"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.value("Texas", "2020_Tax_Burden"),
            Some(&CellValue::Text("8.2%".to_string()))
        );
        assert_eq!(
            table.value("Ohio", "2020_Tax_Burden"),
            Some(&CellValue::Text("10.0%".to_string()))
        );
    }

    #[test]
    fn test_parse_fails_loudly_when_table_missing() {
        let err = parse_burden_table(PAGE, 7).unwrap_err();
        assert!(matches!(err, PipelineError::Layout(_)));
    }

    #[test]
    fn test_parse_rejects_single_row_header() {
        let err = parse_burden_table(PAGE, 0).unwrap_err();
        assert!(matches!(err, PipelineError::Layout(_)));
    }
}

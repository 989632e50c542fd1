use std::fs;
use std::path::Path;

use crate::common::error::Result;
use crate::domain::StateTable;

/// Writes the table as CSV with a leading unlabeled row-index column.
/// Creates parent directories and truncates any existing file; null cells
/// become empty fields.
pub fn write(table: &StateTable, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = Vec::with_capacity(table.columns().len() + 1);
    header.push(String::new());
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header)?;

    for (index, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
        record.push(index.to_string());
        record.extend(row.iter().map(|cell| cell.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

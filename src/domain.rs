use std::collections::HashMap;
use std::fmt;

use crate::common::error::{PipelineError, Result};

/// Column every merge is keyed on.
pub const STATE_KEY: &str = "State";

/// A single cell of the working table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Coerces raw source text: empty becomes null, numeric-looking text
    /// becomes a number, anything else stays text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Column-ordered table of state records, one row per state.
#[derive(Debug, Clone)]
pub struct StateTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl StateTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Appends a row, rejecting arity mismatches against the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::Layout(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Applies a fixed rename map. Only columns whose current name matches a
    /// map entry change, so applying the same map twice is a no-op.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from == column) {
                *column = (*to).to_string();
            }
        }
    }

    /// Projects the table down to the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<StateTable> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| PipelineError::MissingColumn((*name).to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(StateTable {
            columns: names.iter().map(|s| s.to_string()).collect(),
            rows,
        })
    }

    /// Cell lookup by state name and column, for spot checks.
    pub fn value(&self, state: &str, column: &str) -> Option<&CellValue> {
        let key_idx = self.column_index(STATE_KEY)?;
        let col_idx = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| row[key_idx].as_text() == Some(state))
            .map(|row| &row[col_idx])
    }

    /// Left join on the state column. Every left row appears exactly once in
    /// the result, in order; right-side attributes of unmatched states are
    /// null. Non-key columns present on both sides get `_x`/`_y` suffixes.
    /// If the right side repeats a state, the first occurrence wins.
    pub fn left_join(&self, right: &StateTable) -> Result<StateTable> {
        let left_key = self.column_index(STATE_KEY).ok_or_else(|| {
            PipelineError::MissingColumn(format!("{} (left side of join)", STATE_KEY))
        })?;
        let right_key = right.column_index(STATE_KEY).ok_or_else(|| {
            PipelineError::MissingColumn(format!("{} (right side of join)", STATE_KEY))
        })?;

        let overlap: Vec<&String> = right
            .columns
            .iter()
            .enumerate()
            .filter(|&(i, c)| i != right_key && self.columns.contains(c))
            .map(|(_, c)| c)
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + right.columns.len() - 1);
        for (i, c) in self.columns.iter().enumerate() {
            if i != left_key && overlap.contains(&c) {
                columns.push(format!("{}_x", c));
            } else {
                columns.push(c.clone());
            }
        }
        for (i, c) in right.columns.iter().enumerate() {
            if i == right_key {
                continue;
            }
            if overlap.contains(&c) {
                columns.push(format!("{}_y", c));
            } else {
                columns.push(c.clone());
            }
        }

        let mut by_state: HashMap<&str, &Vec<CellValue>> = HashMap::new();
        for row in &right.rows {
            if let Some(name) = row[right_key].as_text() {
                by_state.entry(name).or_insert(row);
            }
        }

        let mut joined = StateTable::new(columns);
        for row in &self.rows {
            let key = row[left_key].as_text().ok_or_else(|| {
                PipelineError::Layout(format!("null or non-text {} cell in join key", STATE_KEY))
            })?;
            let mut out = row.clone();
            match by_state.get(key) {
                Some(matched) => {
                    for (i, cell) in matched.iter().enumerate() {
                        if i != right_key {
                            out.push(cell.clone());
                        }
                    }
                }
                None => out.extend(std::iter::repeat(CellValue::Null).take(right.columns.len() - 1)),
            }
            joined.push_row(out)?;
        }
        Ok(joined)
    }
}

//! Forward-only tabular cursor abstraction
//!
//! The filter reads rows through `RowCursor` so any result-set source
//! (a database driver, a CSV reader, an in-memory table) can feed it.
//! Ordinals are 1-based, matching SQL result-set conventions.

use crate::error::{Result, RowguardError};

/// Forward-only, single-pass cursor over tabular data
pub trait RowCursor {
    /// Number of columns in every row
    fn column_count(&self) -> Result<usize>;

    /// Name of the column at a 1-based ordinal
    fn column_name(&self, ordinal: usize) -> Result<String>;

    /// Move to the next row; `false` once exhausted
    fn advance(&mut self) -> Result<bool>;

    /// Raw value of the current row at a 1-based ordinal
    fn value(&self, ordinal: usize) -> Result<serde_json::Value>;
}

/// In-memory cursor for tests and fixture data
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
    position: Option<usize>,
}

impl MemoryCursor {
    /// Build a cursor; every row must have exactly one value per column
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    ) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(RowguardError::Cursor(format!(
                "row {} has {} values, expected {}",
                index,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            position: None,
        })
    }

    fn check_ordinal(&self, ordinal: usize) -> Result<usize> {
        if ordinal == 0 || ordinal > self.columns.len() {
            return Err(RowguardError::Cursor(format!(
                "column ordinal {} out of range 1..={}",
                ordinal,
                self.columns.len()
            )));
        }
        Ok(ordinal - 1)
    }
}

impl RowCursor for MemoryCursor {
    fn column_count(&self) -> Result<usize> {
        Ok(self.columns.len())
    }

    fn column_name(&self, ordinal: usize) -> Result<String> {
        let index = self.check_ordinal(ordinal)?;
        Ok(self.columns[index].clone())
    }

    fn advance(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value(&self, ordinal: usize) -> Result<serde_json::Value> {
        let index = self.check_ordinal(ordinal)?;
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| RowguardError::Cursor("cursor is not positioned on a row".into()))?;
        Ok(row[index].clone())
    }
}

//! Row and result types produced by the decrypt filter

use serde::{Deserialize, Serialize};

/// Placeholder substituted for a protected cell the caller cannot decrypt
pub const RESTRICTED: &str = "[RESTRICTED]";

/// A single record: one textual cell per column, `None` for SQL null
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Cell text at a 0-based column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// Whether the cell at `index` was masked by the filter
    pub fn is_restricted(&self, index: usize) -> bool {
        self.get(index) == Some(RESTRICTED)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<Option<String>> {
        self.cells
    }
}

/// Ordered rows accepted by a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Column names in ordinal order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 0-based index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Textual form of a raw cell value; null stays null
///
/// Strings are taken verbatim, every other JSON value uses its JSON text.
pub fn cell_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&serde_json::Value::Null), None);
        assert_eq!(cell_text(&serde_json::json!("Smith")), Some("Smith".into()));
        assert_eq!(cell_text(&serde_json::json!(90210)), Some("90210".into()));
        assert_eq!(cell_text(&serde_json::json!(true)), Some("true".into()));
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new(vec![Some("James".into()), Some(RESTRICTED.into()), None]);
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0), Some("James"));
        assert!(row.is_restricted(1));
        assert!(!row.is_restricted(0));
        assert_eq!(row.get(2), None);
        assert_eq!(row.get(9), None);
        assert_eq!(
            row.into_cells(),
            vec![Some("James".to_string()), Some(RESTRICTED.to_string()), None]
        );
    }

    #[test]
    fn test_rowset_column_index() {
        let set = RowSet::new(vec!["first".into(), "last".into()]);
        assert_eq!(set.column_index("last"), Some(1));
        assert_eq!(set.column_index("zip"), None);
        assert!(set.is_empty());
    }
}

//! Diagnostic result types
//!
//! Rows are kept in the server's textual representation. Column order and
//! row order are exactly what the server sent.

use std::sync::Arc;
use std::time::Duration;

/// Rows returned by one diagnostic statement
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticResult {
    /// Column names, shared with every row
    pub columns: Arc<[String]>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Wall-clock time spent on the round trip
    pub execution_time: Duration,
}

/// A single result row: column name → text value (`None` for NULL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl DiagnosticResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>, execution_time: Duration) -> Self {
        let columns: Arc<[String]> = columns.into();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self {
            columns,
            rows,
            execution_time,
        }
    }

    /// An empty result with no columns (used by statements that return nothing)
    pub fn empty(execution_time: Duration) -> Self {
        Self::new(Vec::new(), Vec::new(), execution_time)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Results compare equal on content; timing is ignored.
    pub fn same_rows(&self, other: &DiagnosticResult) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, mut values: Vec<Option<String>>) -> Self {
        values.resize(columns.len(), None);
        Self { columns, values }
    }

    /// Text value of the named column. Returns `None` when the column is
    /// missing or the value is NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values[idx].as_deref()
    }

    /// Column names in server order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Values in column order
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// `(column, value)` pairs in server order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}

//! Rectangular result tables.
//!
//! A [`ResultTable`] holds named, ordered columns and ordered rows of JSON
//! values. Column types are heterogeneous; a cell may be any JSON value,
//! including the nested record lists carried by the constructor column.
//!
//! ```text
//! pipeline payload ──► coerce_payload ──► ResultTable ──► normalize ──► expand
//! ```

mod coerce;

pub use coerce::{coerce_payload, payload_kind};

use serde::Serialize;
use serde_json::{Map, Value};

/// Errors raised while building or reshaping a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Cannot process results of type: {0}")]
    UnsupportedShape(String),

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("column '{column}' has {found} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        found: usize,
        expected: usize,
    },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
}

pub type TableResult<T> = Result<T, TableError>;

/// A rectangular table of JSON cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// Build a table, checking that every row matches the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> TableResult<Self> {
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a one-row table from a single record.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            columns: record.keys().cloned().collect(),
            rows: vec![record.values().cloned().collect()],
        }
    }

    /// Build a table from a list of records.
    ///
    /// Columns appear in first-seen key order across all records; a record
    /// missing a column gets `null` in that cell.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let records: Vec<&Map<String, Value>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Remove a column and return its values, or `None` if it does not exist.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Append a column on the right.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> TableResult<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                column: name,
                found: values.len(),
                expected: self.rows.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.columns.push(name);
        Ok(())
    }

    /// Keep only the rows for which `keep` returns true, preserving order.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// The table in its wire shape: `{"columns": [...], "rows": [[...]]}`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self.rows,
        })
    }
}

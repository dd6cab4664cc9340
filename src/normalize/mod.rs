//! Table normalization.
//!
//! Cleans a coerced result table before constructor expansion:
//!
//! 1. Rows whose constructor cell is a bare number (or digits-only text) are
//!    dropped. Upstream emits these when it has no constructor list for a
//!    row and leaks the season year into the column instead.
//! 2. Exact duplicate rows are dropped, comparing every column except the
//!    constructor column. First occurrences survive, in order.
//! 3. When both a year and a season column exist, rows where they disagree
//!    are dropped and the season column is removed. Duplicates are dropped
//!    again, since rows may have differed only in how the season was written.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::ResultTable;

/// Column names the normalizer looks for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Column holding per-row constructor record lists.
    pub constructor_column: String,

    /// Canonical year column.
    pub year_column: String,

    /// Redundant season column, reconciled against the year column.
    pub season_column: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            constructor_column: "ConstructorTable".to_string(),
            year_column: "year".to_string(),
            season_column: "season".to_string(),
        }
    }
}

/// Row counts removed by each normalization step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub input_rows: usize,
    pub numeric_constructor_rows: usize,
    pub duplicate_rows: usize,
    pub season_mismatch_rows: usize,
    pub season_column_dropped: bool,
}

impl NormalizeReport {
    pub fn rows_removed(&self) -> usize {
        self.numeric_constructor_rows + self.duplicate_rows + self.season_mismatch_rows
    }
}

/// Normalize a table. See the module docs for the steps.
pub fn normalize(table: ResultTable, config: &NormalizeConfig) -> ResultTable {
    normalize_with_report(table, config).0
}

/// Normalize a table and report what each step removed.
pub fn normalize_with_report(
    mut table: ResultTable,
    config: &NormalizeConfig,
) -> (ResultTable, NormalizeReport) {
    let mut report = NormalizeReport {
        input_rows: table.num_rows(),
        ..Default::default()
    };

    if table.num_rows() == 0 {
        return (table, report);
    }

    let constructor_idx = table.column_index(&config.constructor_column);

    if let Some(idx) = constructor_idx {
        let before = table.num_rows();
        table.retain_rows(|row| !is_numeric_artifact(&row[idx]));
        report.numeric_constructor_rows = before - table.num_rows();
        tracing::debug!(
            dropped = report.numeric_constructor_rows,
            rows = table.num_rows(),
            "removed numeric constructor cells"
        );
    }

    report.duplicate_rows = drop_duplicates(&mut table, constructor_idx);

    if let (Some(year), Some(season)) = (
        table.column_index(&config.year_column),
        table.column_index(&config.season_column),
    ) {
        let before = table.num_rows();
        table.retain_rows(|row| values_agree(&row[year], &row[season]));
        table.drop_column(&config.season_column);
        report.season_mismatch_rows = before - table.num_rows();
        report.season_column_dropped = true;

        // Rows that differed only in how the season was written are now equal
        let constructor_idx = table.column_index(&config.constructor_column);
        report.duplicate_rows += drop_duplicates(&mut table, constructor_idx);

        if report.season_mismatch_rows > 0 {
            tracing::warn!(
                dropped = report.season_mismatch_rows,
                "dropped rows where year and season disagree"
            );
        }
    }

    (table, report)
}

/// True for a constructor cell that is a bare number or digits-only text.
pub fn is_numeric_artifact(cell: &Value) -> bool {
    match cell {
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Drop repeated rows, keeping first occurrences. Returns how many went.
fn drop_duplicates(table: &mut ResultTable, constructor_idx: Option<usize>) -> usize {
    if table.num_columns() <= usize::from(constructor_idx.is_some()) {
        return 0;
    }
    let before = table.num_rows();
    let mut seen = HashSet::new();
    table.retain_rows(|row| seen.insert(row_key(row, constructor_idx)));
    let dropped = before - table.num_rows();
    tracing::debug!(dropped, rows = table.num_rows(), "dropped duplicate rows");
    dropped
}

/// Dedup key for a row, skipping the constructor column.
fn row_key(row: &[Value], skip: Option<usize>) -> String {
    let cells: Vec<&Value> = row
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(_, v)| v)
        .collect();
    // Serializing a slice of JSON values cannot fail.
    serde_json::to_string(&cells).unwrap_or_default()
}

/// Year/season equality. Upstream mixes `2021` and `"2021"`, so scalars are
/// compared by numeric value when both parse as numbers.
fn values_agree(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (scalar_number(a), scalar_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn scalar_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

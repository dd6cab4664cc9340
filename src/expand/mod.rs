//! Constructor field expansion.
//!
//! Each row of a result table may carry a list of constructor records in
//! the constructor column. The list arrives in one of several encodings:
//!
//! ```text
//! [{"constructorId": "ferrari", ...}]          structured list
//! "[{\"constructorId\": \"ferrari\", ...}]"    JSON text
//! "[{'constructorId': 'ferrari', ...}]"        literal text
//! "garbage" / 2021 / null / {...}              unusable
//! ```
//!
//! Expansion resolves every cell to a list, picks the record of the target
//! constructor, drops the constructor column and inlines the picked
//! record's fields as flat columns. Nested fields are named by their path,
//! e.g. `Constructor.nationality`.
//!
//! Expansion never fails. Unusable cells resolve to no record, and a
//! flattening fault leaves the table without new columns.

pub mod literal;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::table::{ResultTable, TableError};

use self::literal::{parse_literal, LiteralError};

/// Which constructor to inline and where to find it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExpandConfig {
    /// Column holding per-row constructor record lists.
    pub constructor_column: String,

    /// Identifier of the constructor whose fields are inlined.
    pub target_id: String,

    /// Record field compared against `target_id`.
    pub match_field: String,

    /// Deepest nesting flattened before expansion is abandoned.
    pub max_depth: usize,

    /// Appended to an inlined field name that clashes with an existing column.
    pub collision_suffix: String,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            constructor_column: "ConstructorTable".to_string(),
            target_id: "ferrari".to_string(),
            match_field: "constructorId".to_string(),
            max_depth: 16,
            collision_suffix: "_constructor".to_string(),
        }
    }
}

/// Errors raised while flattening picked records.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("field '{path}' nests deeper than {max_depth} levels")]
    TooDeep { path: String, max_depth: usize },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// How a constructor cell was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEncoding {
    Structured,
    JsonText,
    LiteralText,
    NotAList,
    Unparsable,
}

/// A constructor cell resolved to its record list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCell {
    /// The cell already held a list.
    Structured(Vec<Value>),
    /// The cell held JSON text of a list.
    JsonText(Vec<Value>),
    /// The cell held literal-syntax text of a list.
    LiteralText(Vec<Value>),
    /// The cell, or what it parsed to, is not a list.
    NotAList(&'static str),
    /// The cell is text neither parser accepts.
    Unparsable(String),
}

impl ResolvedCell {
    pub fn encoding(&self) -> CellEncoding {
        match self {
            Self::Structured(_) => CellEncoding::Structured,
            Self::JsonText(_) => CellEncoding::JsonText,
            Self::LiteralText(_) => CellEncoding::LiteralText,
            Self::NotAList(_) => CellEncoding::NotAList,
            Self::Unparsable(_) => CellEncoding::Unparsable,
        }
    }

    /// The resolved entries; empty for unusable cells.
    pub fn into_entries(self) -> Vec<Value> {
        match self {
            Self::Structured(v) | Self::JsonText(v) | Self::LiteralText(v) => v,
            Self::NotAList(_) | Self::Unparsable(_) => Vec::new(),
        }
    }
}

/// Resolve a constructor cell: structured, then JSON text, then literal text.
pub fn resolve_cell(cell: &Value) -> ResolvedCell {
    let text = match cell {
        Value::Array(items) => return ResolvedCell::Structured(items.clone()),
        Value::String(s) => s,
        other => return ResolvedCell::NotAList(crate::table::payload_kind(other)),
    };

    let parsed = match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok((value, CellEncoding::JsonText)),
        Err(json_err) => match parse_literal(text) {
            Ok(value) => Ok((value, CellEncoding::LiteralText)),
            Err(literal_err) => Err((json_err, literal_err)),
        },
    };

    match parsed {
        Ok((Value::Array(items), CellEncoding::JsonText)) => ResolvedCell::JsonText(items),
        Ok((Value::Array(items), _)) => ResolvedCell::LiteralText(items),
        Ok((other, _)) => ResolvedCell::NotAList(crate::table::payload_kind(&other)),
        Err((json_err, literal_err)) => ResolvedCell::Unparsable(describe_parse_failure(
            &json_err,
            &literal_err,
        )),
    }
}

fn describe_parse_failure(json_err: &serde_json::Error, literal_err: &LiteralError) -> String {
    format!("json: {json_err}; literal: {literal_err}")
}

/// Pick the entry whose match field equals the target identifier.
pub fn select_entry(entries: Vec<Value>, config: &ExpandConfig) -> Map<String, Value> {
    entries
        .into_iter()
        .find_map(|entry| match entry {
            Value::Object(map)
                if map.get(&config.match_field).and_then(Value::as_str)
                    == Some(config.target_id.as_str()) =>
            {
                Some(map)
            }
            _ => None,
        })
        .unwrap_or_default()
}

/// Expand the constructor column of `table`. See the module docs.
pub fn expand(mut table: ResultTable, config: &ExpandConfig) -> ResultTable {
    let Some(cells) = table.drop_column(&config.constructor_column) else {
        tracing::debug!(column = %config.constructor_column, "no constructor column");
        return table;
    };

    let selected: Vec<Map<String, Value>> = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let resolved = resolve_cell(cell);
            match &resolved {
                ResolvedCell::Unparsable(reason) => {
                    tracing::warn!(row, %reason, "unparsable constructor cell");
                }
                ResolvedCell::NotAList(kind) => {
                    tracing::debug!(row, kind, "constructor cell is not a list");
                }
                _ => {}
            }
            select_entry(resolved.into_entries(), config)
        })
        .collect();

    if selected.iter().all(Map::is_empty) {
        tracing::debug!(target_id = %config.target_id, "no rows matched target constructor");
        return table;
    }

    match merge_flattened(&table, &selected, config) {
        Ok(merged) => {
            tracing::debug!(
                added = merged.num_columns() - table.num_columns(),
                "inlined constructor fields"
            );
            merged
        }
        Err(e) => {
            tracing::warn!(error = %e, "constructor expansion skipped");
            table
        }
    }
}

fn merge_flattened(
    table: &ResultTable,
    selected: &[Map<String, Value>],
    config: &ExpandConfig,
) -> Result<ResultTable, ExpandError> {
    let columns = flatten_records(selected, config.max_depth, &config.collision_suffix)?;

    let mut merged = table.clone();
    for (name, values) in columns {
        let name = unique_name(name, &config.collision_suffix, |n| merged.has_column(n));
        merged.push_column(name, values)?;
    }
    Ok(merged)
}

/// `name`, or `name` plus `suffix` if taken, then a counter after that.
fn unique_name(name: String, suffix: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&name) {
        return name;
    }
    let base = format!("{name}{suffix}");
    if !taken(&base) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Flatten records into named columns, in first-seen field order.
///
/// Missing fields are `null`. Nested objects contribute one column per leaf,
/// named by the dotted path to it; arrays and empty objects stay as values.
/// A path repeated within one record (a literal `"a.b"` key next to a nested
/// `a.b`) gets `collision_suffix` like a clashing table column.
pub fn flatten_records(
    records: &[Map<String, Value>],
    max_depth: usize,
    collision_suffix: &str,
) -> Result<Vec<(String, Vec<Value>)>, ExpandError> {
    let mut flat_rows = Vec::with_capacity(records.len());
    let mut names: Vec<String> = Vec::new();

    for record in records {
        let mut fields = Vec::new();
        flatten_into(record, "", 1, max_depth, collision_suffix, &mut fields)?;
        for (name, _) in &fields {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        flat_rows.push(fields);
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = flat_rows
                .iter()
                .map(|fields| {
                    fields
                        .iter()
                        .find(|(n, _)| *n == name)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Value::Null)
                })
                .collect();
            (name, values)
        })
        .collect();

    Ok(columns)
}

fn flatten_into(
    map: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    suffix: &str,
    out: &mut Vec<(String, Value)>,
) -> Result<(), ExpandError> {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                if depth >= max_depth {
                    return Err(ExpandError::TooDeep { path, max_depth });
                }
                flatten_into(inner, &path, depth + 1, max_depth, suffix, out)?;
            }
            other => {
                let path = unique_name(path, suffix, |n| out.iter().any(|(p, _)| p == n));
                out.push((path, other.clone()));
            }
        }
    }
    Ok(())
}

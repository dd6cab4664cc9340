//! Coercion of pipeline payloads into tables.
//!
//! The data pipeline hands back whatever its upstream produced. Three shapes
//! are accepted:
//!
//! - a table: `{"columns": ["a", ...], "rows": [[...], ...]}`, passed through
//! - a single record (any other JSON object), which becomes one row
//! - a list of records, one row per record
//!
//! Anything else is a shape error.

use serde_json::{Map, Value};

use super::{ResultTable, TableError, TableResult};

/// Turn a pipeline payload into a [`ResultTable`].
pub fn coerce_payload(payload: &Value) -> TableResult<ResultTable> {
    match payload {
        Value::Object(map) => match table_parts(map) {
            Some((columns, rows)) => ResultTable::new(columns, rows),
            None => Ok(ResultTable::from_record(map)),
        },
        Value::Array(items) => {
            let records: Option<Vec<&Map<String, Value>>> =
                items.iter().map(Value::as_object).collect();
            match records {
                Some(records) => Ok(ResultTable::from_records(records)),
                None => Err(TableError::UnsupportedShape(payload_kind(payload).to_string())),
            }
        }
        other => Err(TableError::UnsupportedShape(payload_kind(other).to_string())),
    }
}

/// Short name of a payload's shape, used in shape errors and logs.
pub fn payload_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(items) if items.iter().all(Value::is_object) => "list of records",
        Value::Array(_) => "list",
        Value::Object(map) if table_parts(map).is_some() => "table",
        Value::Object(_) => "record",
    }
}

/// Split a table-shaped object into its columns and rows.
///
/// The object must have exactly the keys `columns` (array of strings) and
/// `rows` (array of arrays); otherwise it is treated as a plain record.
fn table_parts(map: &Map<String, Value>) -> Option<(Vec<String>, Vec<Vec<Value>>)> {
    if map.len() != 2 {
        return None;
    }
    let columns = map.get("columns")?.as_array()?;
    let rows = map.get("rows")?.as_array()?;

    let columns: Vec<String> = columns
        .iter()
        .map(|c| c.as_str().map(str::to_string))
        .collect::<Option<_>>()?;
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|r| r.as_array().cloned())
        .collect::<Option<_>>()?;

    Some((columns, rows))
}

//! Values exchanged between the controller and its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured intent extracted from a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Data endpoint the query maps to, e.g. `constructor_standings`.
    pub endpoint: String,

    /// Endpoint parameters, e.g. `{"season": "2021"}`.
    #[serde(default)]
    pub params: Map<String, Value>,

    #[serde(default)]
    pub confidence: f64,

    /// Which interpreter produced this (model name, rule set, ...).
    #[serde(default)]
    pub source: String,

    /// Diagnostic steps taken while interpreting, returned to the caller.
    #[serde(default)]
    pub trace: Vec<String>,
}

/// What to fetch from the data pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRequirements {
    pub endpoint: String,

    #[serde(default)]
    pub params: Map<String, Value>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A data pipeline response in its unified form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,

    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PipelineResult {
    /// The data, if the pipeline succeeded and returned any.
    ///
    /// A result without data is a failure whatever its `success` flag says.
    pub fn usable_data(&self) -> Option<&Value> {
        match &self.data {
            Some(Value::Null) | None => None,
            Some(data) if self.success => Some(data),
            Some(_) => None,
        }
    }

    /// The payload to tabulate: `data["results"]` when present, else `data`.
    pub fn payload(&self) -> Option<&Value> {
        let data = self.usable_data()?;
        match data {
            Value::Object(map) => Some(map.get("results").unwrap_or(data)),
            other => Some(other),
        }
    }

    /// Why this result is unusable.
    pub fn failure_message(&self) -> String {
        match &self.error {
            Some(error) if !error.is_empty() => error.clone(),
            _ => "No data returned".to_string(),
        }
    }
}

/// Outcome of running generated analysis code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub success: bool,

    /// Analysis output on success, error description on failure.
    pub output: Value,

    /// The code as actually executed, after any rewriting by the executor.
    pub executed_code: String,
}

impl Execution {
    /// The failure text of an unsuccessful execution.
    pub fn error_message(&self) -> String {
        match &self.output {
            Value::String(s) => s.clone(),
            Value::Null => "execution produced no output".to_string(),
            other => other.to_string(),
        }
    }
}

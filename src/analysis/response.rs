//! Request and response shapes of the analysis endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AnalysisError;

/// Label carried by every failure response.
pub const FAILURE_LABEL: &str = "Analysis failed";

/// One analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub query: String,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// The outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success(AnalysisSuccess),
    Failure(AnalysisFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSuccess {
    /// Always `true`.
    pub success: bool,
    /// Output of the executed analysis code.
    pub data: Value,
    pub executed_code: String,
    pub query_trace: Vec<String>,
    /// Seconds since the request started.
    pub processing_time: f64,
    /// Pipeline metadata.
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    /// Always `false`.
    pub success: bool,
    /// Always [`FAILURE_LABEL`].
    pub error: String,
    pub details: String,
    pub processing_time: f64,
}

impl AnalysisFailure {
    pub fn new(error: &AnalysisError, processing_time: f64) -> Self {
        Self {
            success: false,
            error: FAILURE_LABEL.to_string(),
            details: error.to_string(),
            processing_time,
        }
    }
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn processing_time(&self) -> f64 {
        match self {
            Self::Success(s) => s.processing_time,
            Self::Failure(f) => f.processing_time,
        }
    }

    pub fn as_success(&self) -> Option<&AnalysisSuccess> {
        match self {
            Self::Success(s) => Some(s),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&AnalysisFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    /// The response in its wire shape.
    pub fn to_value(&self) -> Value {
        // Plain structs of JSON-compatible fields always serialize
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

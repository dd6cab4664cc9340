//! Protocol types for analyst worker communication.
//!
//! Every message is one JSON object per line. Requests carry a unique id
//! that the worker echoes back on the matching response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collaborators::DataRequirements;
use crate::table::ResultTable;

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "query.interpret").
    pub method: String,
    /// Method-specific parameters.
    pub params: Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// Error codes the worker reports.
pub mod codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
    pub const UPSTREAM_FAILED: &str = "UPSTREAM_FAILED";
    pub const WORKER_EXITED: &str = "WORKER_EXITED";
    pub const UNKNOWN: &str = "UNKNOWN";
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Parameters for `query.interpret`.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretParams<'a> {
    pub query: &'a str,
}

/// Parameters for `data.fetch`.
#[derive(Debug, Clone, Serialize)]
pub struct FetchParams<'a> {
    pub endpoint: &'a str,
    pub params: &'a Map<String, Value>,
    pub metadata: &'a Map<String, Value>,
}

impl<'a> From<&'a DataRequirements> for FetchParams<'a> {
    fn from(req: &'a DataRequirements) -> Self {
        Self {
            endpoint: &req.endpoint,
            params: &req.params,
            metadata: &req.metadata,
        }
    }
}

/// Parameters for `code.generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateCodeParams<'a> {
    pub query: &'a str,
    pub table: &'a ResultTable,
}

/// Parameters for `code.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteCodeParams<'a> {
    pub code: &'a str,
    pub table: &'a ResultTable,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response from `code.generate`. The code may be wrapped in a fenced block.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCodeResponse {
    pub code: String,
}

/// Response from `code.execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteCodeResponse {
    pub success: bool,
    /// Analysis output on success, error text on failure.
    #[serde(default)]
    pub output: Value,
    /// The code after sandbox rewriting; absent when unchanged.
    #[serde(default)]
    pub executed_code: Option<String>,
}

// ============================================================================
// Method Names
// ============================================================================

/// Worker method names.
pub mod methods {
    pub const INTERPRET: &str = "query.interpret";
    pub const FETCH: &str = "data.fetch";
    pub const GENERATE_CODE: &str = "code.generate";
    pub const EXECUTE_CODE: &str = "code.execute";
}

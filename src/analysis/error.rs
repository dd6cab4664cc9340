//! Analysis failure taxonomy.

use std::fmt;
use std::time::Duration;

use crate::table::TableError;

/// Every way an analysis request can fail.
///
/// The `Display` text is what callers see as the failure `details`.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Query interpretation failed: {0}")]
    Interpretation(String),

    /// Query or result adaptation failed.
    #[error("Query adaptation failed: {0}")]
    Adaptation(String),

    #[error("Pipeline processing failed: {0}")]
    PipelineFailure(String),

    #[error("Failed to process data: {0}")]
    Shape(#[from] TableError),

    #[error("Failed to process data: No data available after processing")]
    EmptyResult,

    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Code execution failed: {0}")]
    CodeExecution(String),

    /// A panic or any fault outside the taxonomy.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The awaited collaborator stages, for error attribution and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Interpret,
    Fetch,
    GenerateCode,
    ExecuteCode,
}

impl Stage {
    /// Wrap a collaborator failure in this stage's error kind.
    pub fn error(self, message: impl Into<String>) -> AnalysisError {
        let message = message.into();
        match self {
            Stage::Interpret => AnalysisError::Interpretation(message),
            Stage::Fetch => AnalysisError::PipelineFailure(message),
            Stage::GenerateCode => AnalysisError::CodeGeneration(message),
            Stage::ExecuteCode => AnalysisError::CodeExecution(message),
        }
    }

    /// The error for this stage exceeding `limit`.
    pub fn timed_out(self, limit: Duration) -> AnalysisError {
        self.error(format!("{self} timed out after {} seconds", format_secs(limit)))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Interpret => "query interpretation",
            Stage::Fetch => "data fetch",
            Stage::GenerateCode => "code generation",
            Stage::ExecuteCode => "code execution",
        })
    }
}

/// Whole seconds as `60`, fractions trimmed as `0.25`.
pub(crate) fn format_secs(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        d.as_secs().to_string()
    } else {
        let s = format!("{:.3}", d.as_secs_f64());
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

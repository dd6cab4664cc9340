//! Natural-language analysis requests, end to end.
//!
//! An [`Analyzer`] runs every request through a fixed sequence of stages:
//!
//! ```text
//! query ─► interpret ─► adapt query ─► fetch ─► adapt result
//!        ─► coerce ─► normalize ─► expand ─► generate code ─► execute ─► response
//! ```
//!
//! Stages run strictly in order, once each. The first failing stage ends the
//! request with a uniform failure response:
//!
//! ```json
//! {"success": false, "error": "Analysis failed", "details": "...", "processing_time": 0.42}
//! ```
//!
//! Awaited collaborator stages are bounded by the configured stage timeout.
//! Panics inside any stage are caught and reported as unexpected errors.
//!
//! # Example
//!
//! ```ignore
//! use podium::analysis::{AnalysisRequest, Analyzer, AnalyzerConfig};
//! use podium::collaborators::Collaborators;
//!
//! let analyzer = Analyzer::new(Collaborators::with_backend(backend), AnalyzerConfig::default());
//! let response = analyzer
//!     .analyze(AnalysisRequest::new("How many points did Ferrari score in 2021?"))
//!     .await;
//! println!("{}", response.to_value());
//! ```

mod controller;
mod error;
mod response;

pub use controller::{prepare_table, Analyzer, AnalyzerConfig};
pub use error::{AnalysisError, AnalysisResult, Stage};
pub(crate) use error::format_secs;
pub use response::{
    AnalysisFailure, AnalysisRequest, AnalysisResponse, AnalysisSuccess, FAILURE_LABEL,
};

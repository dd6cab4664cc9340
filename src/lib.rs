//! # podium
//!
//! Natural-language analytics over a motorsport statistics dataset.
//!
//! ## Architecture
//!
//! A free-text question runs through a fixed sequence of stages. External
//! collaborators (query interpretation, the data pipeline, code synthesis
//! and its sandbox) sit behind traits; podium owns the sequencing, the
//! failure handling and the cleanup of whatever the data pipeline returns.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          web (axum) / bin (clap)  ──►  Analyzer          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [collaborators: interpret, fetch]
//! ┌─────────────────────────────────────────────────────────┐
//! │     PipelineResult ──► table::coerce_payload             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [normalize, expand]
//! ┌─────────────────────────────────────────────────────────┐
//! │       ResultTable (flat, deduplicated, one team)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [collaborators: generate, execute]
//! ┌─────────────────────────────────────────────────────────┐
//! │          AnalysisResponse  ──►  history (SQLite)         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod collaborators;
pub mod config;
pub mod expand;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod table;
pub mod web;
pub mod worker;

pub use analysis::{AnalysisRequest, AnalysisResponse, Analyzer, AnalyzerConfig};
pub use table::ResultTable;

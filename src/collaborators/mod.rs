//! Collaborator seams of the analysis pipeline.
//!
//! The controller never interprets queries, fetches data or runs code
//! itself. It drives six collaborators, one per stage:
//!
//! | Stage            | Trait              | Async |
//! |------------------|--------------------|-------|
//! | interpret        | [`QueryInterpreter`] | yes |
//! | adapt query      | [`QueryAdapter`]     | no  |
//! | fetch            | [`DataFetcher`]      | yes |
//! | adapt result     | [`ResultAdapter`]    | no  |
//! | generate code    | [`CodeGenerator`]    | yes |
//! | execute code     | [`CodeExecutor`]     | yes |
//!
//! The adapters have in-process standard implementations. The async stages
//! are served by [`crate::worker::WorkerBackend`] in production and by
//! hand-written mocks in tests.

mod adapters;
mod hash;
mod types;

pub use adapters::{StandardQueryAdapter, StandardResultAdapter};
pub use hash::compute_hash;
pub use types::{DataRequirements, Execution, Interpretation, PipelineResult};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::table::ResultTable;
use crate::worker::WorkerError;

/// Errors reported by collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("{0}")]
    Failed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Extracts structured intent from a free-text query.
#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    async fn interpret(&self, query: &str) -> CollaboratorResult<Interpretation>;
}

/// Derives fetch requirements from an interpretation.
pub trait QueryAdapter: Send + Sync {
    fn adapt_query(&self, interpretation: &Interpretation) -> CollaboratorResult<DataRequirements>;
}

/// Fetches raw data from the data pipeline.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    async fn fetch(&self, requirements: &DataRequirements) -> CollaboratorResult<Value>;
}

/// Converts a raw pipeline response into a [`PipelineResult`].
pub trait ResultAdapter: Send + Sync {
    /// `started` is when the request began, for timing metadata.
    fn adapt_result(&self, raw: Value, started: Instant) -> CollaboratorResult<PipelineResult>;
}

/// Synthesizes analysis code for a table and a question about it.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate_code(&self, table: &ResultTable, query: &str) -> CollaboratorResult<String>;
}

/// Runs generated analysis code against a table.
///
/// A reported failure is an `Ok(Execution { success: false, .. })`; `Err` is
/// reserved for failing to reach the executor at all.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute_code(&self, code: &str, table: &ResultTable) -> CollaboratorResult<Execution>;
}

/// The full set of collaborators an analyzer drives.
#[derive(Clone)]
pub struct Collaborators {
    pub interpreter: Arc<dyn QueryInterpreter>,
    pub query_adapter: Arc<dyn QueryAdapter>,
    pub fetcher: Arc<dyn DataFetcher>,
    pub result_adapter: Arc<dyn ResultAdapter>,
    pub generator: Arc<dyn CodeGenerator>,
    pub executor: Arc<dyn CodeExecutor>,
}

impl Collaborators {
    /// Serve every async stage from one backend, with the standard adapters.
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: QueryInterpreter + DataFetcher + CodeGenerator + CodeExecutor + 'static,
    {
        Self {
            interpreter: backend.clone(),
            query_adapter: Arc::new(StandardQueryAdapter),
            fetcher: backend.clone(),
            result_adapter: Arc::new(StandardResultAdapter),
            generator: backend.clone(),
            executor: backend,
        }
    }
}

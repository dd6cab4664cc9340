//! Collaborator implementations backed by the analyst worker.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::protocol::{
    methods, ExecuteCodeParams, ExecuteCodeResponse, FetchParams, GenerateCodeParams,
    GenerateCodeResponse, InterpretParams,
};
use super::WorkerClient;
use crate::collaborators::{
    CodeExecutor, CodeGenerator, CollaboratorError, CollaboratorResult, DataFetcher,
    DataRequirements, Execution, Interpretation, QueryInterpreter,
};
use crate::table::ResultTable;

/// Serves the interpret, fetch, generate and execute stages over one worker.
///
/// # Example
///
/// ```ignore
/// let client = WorkerClient::spawn_with_settings(&settings).await?;
/// let backend = Arc::new(WorkerBackend::new(Arc::new(client)));
/// let analyzer = Analyzer::new(Collaborators::with_backend(backend), config);
/// ```
pub struct WorkerBackend {
    client: Arc<WorkerClient>,
}

impl WorkerBackend {
    pub fn new(client: Arc<WorkerClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &WorkerClient {
        &self.client
    }
}

#[async_trait]
impl QueryInterpreter for WorkerBackend {
    async fn interpret(&self, query: &str) -> CollaboratorResult<Interpretation> {
        Ok(self
            .client
            .request(methods::INTERPRET, InterpretParams { query })
            .await?)
    }
}

#[async_trait]
impl DataFetcher for WorkerBackend {
    async fn fetch(&self, requirements: &DataRequirements) -> CollaboratorResult<Value> {
        Ok(self
            .client
            .request(methods::FETCH, FetchParams::from(requirements))
            .await?)
    }
}

#[async_trait]
impl CodeGenerator for WorkerBackend {
    async fn generate_code(&self, table: &ResultTable, query: &str) -> CollaboratorResult<String> {
        let resp: GenerateCodeResponse = self
            .client
            .request(methods::GENERATE_CODE, GenerateCodeParams { query, table })
            .await?;

        let code = extract_code_block(&resp.code);
        if code.is_empty() {
            return Err(CollaboratorError::InvalidResponse(
                "worker returned no code".to_string(),
            ));
        }
        Ok(code)
    }
}

#[async_trait]
impl CodeExecutor for WorkerBackend {
    async fn execute_code(&self, code: &str, table: &ResultTable) -> CollaboratorResult<Execution> {
        let resp: ExecuteCodeResponse = self
            .client
            .request(methods::EXECUTE_CODE, ExecuteCodeParams { code, table })
            .await?;

        Ok(Execution {
            success: resp.success,
            output: resp.output,
            executed_code: resp.executed_code.unwrap_or_else(|| code.to_string()),
        })
    }
}

/// Unwrap the first fenced code block in model output.
///
/// Prefers a block tagged `python`/`py`, then any fenced block; text with no
/// fence is taken as code as-is.
pub fn extract_code_block(text: &str) -> String {
    let patterns = [r"(?s)```(?:python|py)[ \t]*\r?\n(.*?)```", r"(?s)```[^\n]*\n(.*?)```"];
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(body) = re.captures(text).and_then(|c| c.get(1)) {
            return body.as_str().trim().to_string();
        }
    }
    text.trim().to_string()
}

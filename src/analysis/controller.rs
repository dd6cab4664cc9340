//! The request controller.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::Value;
use tracing::Instrument;

use super::error::{AnalysisError, AnalysisResult, Stage};
use super::response::{AnalysisFailure, AnalysisRequest, AnalysisResponse, AnalysisSuccess};
use crate::collaborators::{CollaboratorResult, Collaborators};
use crate::config::Settings;
use crate::expand::{self, ExpandConfig};
use crate::history::{HistorySession, HistoryStore};
use crate::normalize::{self, NormalizeConfig};
use crate::table::{self, ResultTable};

/// Tunables of the request controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub normalize: NormalizeConfig,
    pub expand: ExpandConfig,
    /// Upper bound on each awaited collaborator stage.
    pub stage_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            expand: ExpandConfig::default(),
            stage_timeout: Duration::from_secs(60),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            normalize: settings.normalize.clone(),
            expand: settings.expand_config(),
            stage_timeout: settings.stage_timeout(),
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }
}

/// Runs analysis requests through the collaborator stages.
///
/// One `Analyzer` serves any number of concurrent requests; requests share
/// nothing mutable.
#[derive(Clone)]
pub struct Analyzer {
    collaborators: Collaborators,
    config: AnalyzerConfig,
    history: Option<HistoryStore>,
}

impl Analyzer {
    pub fn new(collaborators: Collaborators, config: AnalyzerConfig) -> Self {
        Self {
            collaborators,
            config,
            history: None,
        }
    }

    /// Record every finished request in `store`.
    pub fn with_history(mut self, store: HistoryStore) -> Self {
        self.history = Some(store);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn history(&self) -> Option<&HistoryStore> {
        self.history.as_ref()
    }

    /// Analyze one request.
    ///
    /// Never fails: every error and panic is rendered as a failure response.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResponse {
        let started = Instant::now();
        let span = tracing::info_span!("analyze", query = %request.query);

        async {
            let session = self.open_history().await;

            let outcome = AssertUnwindSafe(self.run(&request.query, started))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(AnalysisError::Unexpected(panic_message(&*panic))));

            let response = match outcome {
                Ok(success) => AnalysisResponse::Success(success),
                Err(error) => {
                    tracing::warn!(error = %error, "analysis failed");
                    AnalysisResponse::Failure(AnalysisFailure::new(
                        &error,
                        started.elapsed().as_secs_f64(),
                    ))
                }
            };
            tracing::info!(
                success = response.is_success(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis finished"
            );

            if let Some(session) = session {
                record_history(session, &request.query, &response).await;
            }
            response
        }
        .instrument(span)
        .await
    }

    async fn run(&self, query: &str, started: Instant) -> AnalysisResult<AnalysisSuccess> {
        let c = &self.collaborators;

        let interpretation = self
            .stage(Stage::Interpret, c.interpreter.interpret(query))
            .await?;
        tracing::debug!(
            endpoint = %interpretation.endpoint,
            trace_len = interpretation.trace.len(),
            "query interpreted"
        );

        let requirements = c
            .query_adapter
            .adapt_query(&interpretation)
            .map_err(|e| AnalysisError::Adaptation(e.to_string()))?;

        let raw = self.stage(Stage::Fetch, c.fetcher.fetch(&requirements)).await?;

        let pipeline = c
            .result_adapter
            .adapt_result(raw, started)
            .map_err(|e| AnalysisError::Adaptation(e.to_string()))?;
        let payload = pipeline
            .payload()
            .ok_or_else(|| AnalysisError::PipelineFailure(pipeline.failure_message()))?;

        let table = prepare_table(payload, &self.config.normalize, &self.config.expand)?;
        tracing::debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "table prepared"
        );

        let code = self
            .stage(Stage::GenerateCode, c.generator.generate_code(&table, query))
            .await?;
        let execution = self
            .stage(Stage::ExecuteCode, c.executor.execute_code(&code, &table))
            .await?;
        if !execution.success {
            return Err(AnalysisError::CodeExecution(execution.error_message()));
        }

        Ok(AnalysisSuccess {
            success: true,
            data: execution.output,
            executed_code: execution.executed_code,
            query_trace: interpretation.trace,
            processing_time: started.elapsed().as_secs_f64(),
            metadata: pipeline.metadata,
        })
    }

    /// Await a collaborator stage under the stage timeout.
    async fn stage<T, F>(&self, stage: Stage, fut: F) -> AnalysisResult<T>
    where
        F: Future<Output = CollaboratorResult<T>>,
    {
        tracing::debug!(%stage, "stage started");
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(stage.error(e.to_string())),
            Err(_) => Err(stage.timed_out(self.config.stage_timeout)),
        }
    }

    async fn open_history(&self) -> Option<HistorySession> {
        let store = self.history.as_ref()?;
        match store.open_session().await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "history unavailable for this request");
                None
            }
        }
    }
}

/// Coerce, normalize and expand a pipeline payload.
///
/// Fails on an unsupported payload shape, or when nothing survives cleaning.
pub fn prepare_table(
    payload: &Value,
    normalize_config: &NormalizeConfig,
    expand_config: &ExpandConfig,
) -> AnalysisResult<ResultTable> {
    let table = table::coerce_payload(payload)?;
    let table = normalize::normalize(table, normalize_config);
    let table = expand::expand(table, expand_config);
    if table.is_empty() {
        return Err(AnalysisError::EmptyResult);
    }
    Ok(table)
}

async fn record_history(session: HistorySession, query: &str, response: &AnalysisResponse) {
    match session
        .finish(query.to_string(), response.is_success(), response.to_value())
        .await
    {
        Ok(id) => tracing::debug!(id, "recorded request history"),
        Err(e) => tracing::warn!(error = %e, "failed to record request history"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

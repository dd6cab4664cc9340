//! In-process adapters between collaborator shapes.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};

use super::hash::compute_hash;
use super::{
    CollaboratorError, CollaboratorResult, DataRequirements, Interpretation, PipelineResult,
    QueryAdapter, ResultAdapter,
};
use crate::table::payload_kind;

/// Turns an [`Interpretation`] into [`DataRequirements`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardQueryAdapter;

impl QueryAdapter for StandardQueryAdapter {
    fn adapt_query(&self, interpretation: &Interpretation) -> CollaboratorResult<DataRequirements> {
        let endpoint = interpretation.endpoint.trim();
        if endpoint.is_empty() {
            return Err(CollaboratorError::Failed(
                "interpretation has no endpoint".to_string(),
            ));
        }

        let mut metadata = Map::new();
        metadata.insert("confidence".into(), json!(interpretation.confidence));
        metadata.insert("source".into(), json!(interpretation.source));
        metadata.insert("timestamp".into(), json!(unix_seconds()));
        metadata.insert("trace_len".into(), json!(interpretation.trace.len()));

        Ok(DataRequirements {
            endpoint: endpoint.to_string(),
            params: interpretation.params.clone(),
            metadata,
        })
    }
}

/// Turns a raw pipeline response into a [`PipelineResult`].
///
/// The raw response is an object shaped like
/// `{"success": bool, "data": ..., "error": "...", "metadata": {...}}`.
/// Data is discarded unless `success` is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResultAdapter;

impl ResultAdapter for StandardResultAdapter {
    fn adapt_result(&self, raw: Value, started: Instant) -> CollaboratorResult<PipelineResult> {
        let Value::Object(mut raw) = raw else {
            return Err(CollaboratorError::InvalidResponse(format!(
                "expected a pipeline response object, got {}",
                payload_kind(&raw)
            )));
        };

        let success = raw.get("success").and_then(Value::as_bool).unwrap_or(false);
        let data = match raw.remove("data") {
            Some(Value::Null) | None => None,
            Some(data) if success => Some(data),
            Some(_) => None,
        };
        let error = match raw.remove("error") {
            Some(Value::Null) | None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        let mut metadata = match raw.remove("metadata") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        metadata.insert("source".into(), json!("pipeline"));
        metadata.insert(
            "processing_time".into(),
            json!(started.elapsed().as_secs_f64()),
        );
        if let Some(key) = data.as_ref().and_then(|d| compute_hash(d).ok()) {
            metadata.insert("cache_key".into(), json!(key));
        }

        Ok(PipelineResult {
            success,
            data,
            error,
            metadata,
        })
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

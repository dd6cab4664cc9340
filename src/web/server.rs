//! Axum web server for the analysis API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::analysis::{AnalysisRequest, Analyzer};
use crate::history::HistoryEntry;

/// Default number of history entries returned.
const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 500;

/// Application state shared across handlers
pub struct AppState {
    pub analyzer: Analyzer,
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/history", get(history))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(
    analyzer: Analyzer,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(AppState { analyzer }));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "podium listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// API Handlers
// ============================================================================

/// POST /api/v1/analyze - Run one analysis request
///
/// Always 200; failures are reported in the body.
async fn analyze(State(state): State<Arc<AppState>>, Json(req): Json<AnalysisRequest>) -> Json<Value> {
    let response = state.analyzer.analyze(req).await;
    Json(response.to_value())
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HistoryResponse {
    entries: Vec<HistoryEntry>,
}

/// GET /api/v1/history?limit=N - Most recent requests, newest first
async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, (StatusCode, String)> {
    let Some(store) = state.analyzer.history() else {
        return Err((
            StatusCode::NOT_FOUND,
            "request history is disabled".to_string(),
        ));
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    store
        .recent(limit)
        .await
        .map(|entries| Json(HistoryResponse { entries }))
        .map_err(|e| {
            tracing::error!(error = %e, "failed to read request history");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

/// GET /api/health
async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

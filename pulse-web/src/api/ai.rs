//! AI narrative report endpoint
//!
//! Forwards the current in-memory dataset plus a template selector to the
//! configured completion endpoint and returns the text verbatim. Failures of
//! any kind surface as one generic analysis error; there is no retry and no
//! caching.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::error::ApiError;
use crate::services::{AiClient, AnalysisKind};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(alias = "analysisType")]
    pub analysis_type: AnalysisKind,
}

/// POST /api/ai/report
pub async fn report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = AiClient::from_config(&state.config.ai).map_err(|e| {
        error!("AI client unavailable: {}", e);
        ApiError::Upstream("Analysis failed".to_string())
    })?;

    let snapshot = state.read_model.snapshot().await;
    let analysis = client
        .generate(request.analysis_type, &snapshot.sessions, &snapshot.responses)
        .await
        .map_err(|e| {
            error!("Analysis request failed: {}", e);
            ApiError::Upstream("Analysis failed".to_string())
        })?;

    Ok(Json(json!({ "analysis": analysis })))
}

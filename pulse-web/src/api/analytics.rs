//! Analytics endpoints, computed over read-model snapshots

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{self, Overview, RatingBucket, SessionMetrics, TrendPoint};
use crate::error::ApiError;
use crate::AppState;

/// Per-session analytics payload
#[derive(Debug, Serialize)]
pub struct SessionAnalytics {
    pub metrics: SessionMetrics,
    pub ratings: Vec<RatingBucket>,
    pub trend: Vec<TrendPoint>,
}

/// GET /api/analytics/overview
pub async fn overview(State(state): State<AppState>) -> Json<Overview> {
    let snapshot = state.read_model.snapshot().await;
    Json(analytics::overview(&snapshot.sessions, &snapshot.responses))
}

/// GET /api/analytics/sessions/:id
pub async fn session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionAnalytics>, ApiError> {
    let snapshot = state.read_model.snapshot().await;
    let session = snapshot
        .sessions
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;

    let own: Vec<_> = snapshot
        .responses
        .iter()
        .filter(|r| r.session_id == id)
        .cloned()
        .collect();

    Ok(Json(SessionAnalytics {
        metrics: analytics::session_metrics(session, &own),
        ratings: analytics::rating_distribution(&own),
        trend: analytics::daily_trend(&own),
    }))
}

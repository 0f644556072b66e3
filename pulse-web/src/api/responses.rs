//! Admin response listing endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use pulse_common::models::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::responses;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResponseQuery {
    pub session_id: Option<Uuid>,
}

/// GET /api/responses?session_id=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ResponseQuery>,
) -> Result<Json<Vec<Response>>, ApiError> {
    let responses = responses::list_responses(&state.db, query.session_id).await?;
    Ok(Json(responses))
}

/// GET /api/responses/recent — newest-first notification feed (max 10)
pub async fn recent(State(state): State<AppState>) -> Json<Vec<Response>> {
    let snapshot = state.read_model.snapshot().await;
    Json(snapshot.recent)
}

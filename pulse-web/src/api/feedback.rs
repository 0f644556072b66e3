//! Public submission endpoints, addressed by share token
//!
//! No authentication: the share token in the URL is the only gate, as on the
//! public feedback form.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pulse_common::models::{Response, Session};
use serde_json::json;

use crate::db::{responses, sessions};
use crate::error::ApiError;
use crate::sse::PulseEvent;
use crate::AppState;

async fn session_for_token(state: &AppState, token: &str) -> Result<Session, ApiError> {
    sessions::get_session_by_token(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown share link".to_string()))
}

/// GET /api/feedback/:share_token — session schema for the public form
pub async fn get_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = session_for_token(&state, &token).await?;

    Ok(Json(json!({
        "id": session.id,
        "title": session.title,
        "description": session.description,
        "questions": session.questions,
        "is_active": session.is_active,
    })))
}

/// POST /api/feedback/:share_token — submit a response
pub async fn submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(new): Json<responses::NewResponse>,
) -> Result<(StatusCode, Json<Response>), ApiError> {
    let session = session_for_token(&state, &token).await?;

    if !session.is_active {
        return Err(ApiError::BadRequest(
            "This session is not accepting responses".to_string(),
        ));
    }

    let response = responses::insert_response(&state.db, &session, new).await?;

    state.read_model.apply_response(response.clone()).await;
    state.broadcaster.broadcast_lossy(PulseEvent::ResponseCreated {
        response: response.clone(),
    });

    Ok((StatusCode::CREATED, Json(response)))
}

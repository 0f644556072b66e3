//! Admin session CRUD endpoints
//!
//! Mutations write through the database, update the read model, and then
//! broadcast the matching change event; reads come straight from the
//! database (the read model serves analytics and the live feed).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pulse_common::models::Session;
use uuid::Uuid;

use crate::db::sessions::{self, NewSession, SessionPatch};
use crate::error::ApiError;
use crate::sse::{PulseEvent, SessionChange};
use crate::AppState;

/// GET /api/sessions
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Session>>, ApiError> {
    let sessions = sessions::list_sessions(&state.db).await?;
    Ok(Json(sessions))
}

/// GET /api/sessions/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = sessions::get_session(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;
    Ok(Json(session))
}

/// POST /api/sessions
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewSession>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = sessions::create_session(&state.db, new).await?;

    state.read_model.apply_session(session.clone()).await;
    state.broadcaster.broadcast_lossy(PulseEvent::SessionChanged {
        session_id: session.id,
        change: SessionChange::Created,
    });

    Ok((StatusCode::CREATED, Json(session)))
}

/// PUT /api/sessions/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SessionPatch>,
) -> Result<Json<Session>, ApiError> {
    let session = sessions::update_session(&state.db, id, patch).await?;

    state.read_model.apply_session(session.clone()).await;
    state.broadcaster.broadcast_lossy(PulseEvent::SessionChanged {
        session_id: session.id,
        change: SessionChange::Updated,
    });

    Ok(Json(session))
}

/// DELETE /api/sessions/:id
///
/// Responses of the deleted session remain as orphans.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    sessions::delete_session(&state.db, id).await?;

    state.read_model.remove_session(id).await;
    state.broadcaster.broadcast_lossy(PulseEvent::SessionChanged {
        session_id: id,
        change: SessionChange::Deleted,
    });

    Ok(StatusCode::NO_CONTENT)
}

//! Report export endpoints
//!
//! Serialization happens here; the actual download is the client's concern.
//! Responses carry Content-Disposition so browsers save to a file directly.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
};
use pulse_common::models::Session;
use uuid::Uuid;

use crate::db::{responses, sessions};
use crate::error::ApiError;
use crate::export;
use crate::AppState;

async fn load_session(state: &AppState, id: Uuid) -> Result<Session, ApiError> {
    sessions::get_session(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))
}

fn attachment_headers(content_type: &'static str, filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers
}

/// GET /api/sessions/:id/export.csv
///
/// 404 with a "nothing to export" body when the session has no responses;
/// callers must not write an empty file.
pub async fn csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = load_session(&state, id).await?;
    let responses = responses::list_responses(&state.db, Some(id)).await?;

    let csv = export::session_csv(&session, &responses)
        .ok_or_else(|| ApiError::NotFound("Nothing to export: session has no responses".to_string()))?;

    let filename = export::export_filename(&session.title, "csv");
    Ok((attachment_headers("text/csv; charset=utf-8", &filename), csv))
}

/// GET /api/sessions/:id/export.json
pub async fn json(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = load_session(&state, id).await?;
    let responses = responses::list_responses(&state.db, Some(id)).await?;

    let metrics = crate::analytics::session_metrics(&session, &responses);
    let report = export::session_report_json(&session, &responses, &metrics);

    let filename = export::export_filename(&session.title, "json");
    Ok((attachment_headers("application/json", &filename), report))
}

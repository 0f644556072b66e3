//! Response database operations
//!
//! Responses are created by the public submission form and only ever read
//! afterwards. The answer map is validated and normalized against the owning
//! session's question schema before insert; unknown question ids are
//! rejected, not silently accepted.

use std::collections::BTreeMap;

use chrono::Utc;
use pulse_common::models::{normalize_answers, AnswerValue, Response, Session};
use pulse_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Payload for the public submission form
#[derive(Debug, Clone, Deserialize)]
pub struct NewResponse {
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub bootcamp_id: String,
    /// Raw answer map as submitted; normalized before insert
    pub answers: serde_json::Map<String, serde_json::Value>,
}

/// List responses, optionally scoped to one session, oldest first
pub async fn list_responses(
    pool: &SqlitePool,
    session_id: Option<Uuid>,
) -> Result<Vec<Response>> {
    let rows = match session_id {
        Some(id) => {
            sqlx::query(
                r#"
                SELECT id, session_id, user_name, user_email, bootcamp_id,
                       answers, submitted_at
                FROM responses
                WHERE session_id = ?
                ORDER BY submitted_at ASC
                "#,
            )
            .bind(id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, session_id, user_name, user_email, bootcamp_id,
                       answers, submitted_at
                FROM responses
                ORDER BY submitted_at ASC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(response_from_row).collect()
}

/// Validate, normalize, and insert a submitted response
pub async fn insert_response(
    pool: &SqlitePool,
    session: &Session,
    new: NewResponse,
) -> Result<Response> {
    if new.user_name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Submitter name must not be empty".to_string(),
        ));
    }

    let answers = normalize_answers(&session.questions, &new.answers)?;

    let response = Response {
        id: Uuid::new_v4(),
        session_id: session.id,
        user_name: new.user_name,
        user_email: new.user_email,
        bootcamp_id: new.bootcamp_id,
        answers,
        submitted_at: Utc::now(),
    };

    let answers_json = serde_json::to_string(&response.answers)
        .map_err(|e| Error::Internal(format!("Failed to serialize answers: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO responses (
            id, session_id, user_name, user_email, bootcamp_id,
            answers, submitted_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(response.id.to_string())
    .bind(response.session_id.to_string())
    .bind(&response.user_name)
    .bind(&response.user_email)
    .bind(&response.bootcamp_id)
    .bind(&answers_json)
    .bind(response.submitted_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(response)
}

fn response_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Response> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse response id: {}", e)))?;

    let session_id_str: String = row.get("session_id");
    let session_id = Uuid::parse_str(&session_id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse session_id: {}", e)))?;

    let answers: String = row.get("answers");
    let answers: BTreeMap<String, AnswerValue> = serde_json::from_str(&answers)
        .map_err(|e| Error::Internal(format!("Failed to deserialize answers: {}", e)))?;

    let submitted_at: String = row.get("submitted_at");
    let submitted_at = chrono::DateTime::parse_from_rfc3339(&submitted_at)
        .map_err(|e| Error::Internal(format!("Failed to parse submitted_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(Response {
        id,
        session_id,
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        bootcamp_id: row.get("bootcamp_id"),
        answers,
        submitted_at,
    })
}

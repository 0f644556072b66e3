//! Session database operations
//!
//! Share tokens are derived from the title plus a millisecond timestamp. The
//! UNIQUE constraint on share_token is enforced at insert: a collision (same
//! title in the same millisecond) gets a short random suffix and another
//! attempt, so two simultaneous `create_session("Demo")` calls always end up
//! with distinct tokens.

use chrono::Utc;
use pulse_common::models::{Question, Session};
use pulse_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TOKEN_INSERT_ATTEMPTS: usize = 5;

/// Payload for creating a session
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update for a session; share_token is immutable and not patchable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub is_active: Option<bool>,
}

/// Derive a share token from the session title
///
/// Lower-cased, whitespace collapsed to hyphens, millisecond timestamp
/// appended to approximate uniqueness. Actual uniqueness is enforced by the
/// insert loop in [`create_session`].
pub fn derive_share_token(title: &str) -> String {
    let slug: String = title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() {
        "session".to_string()
    } else {
        slug
    };
    format!("{}-{}", slug, Utc::now().timestamp_millis())
}

/// List all sessions, newest first
pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, questions, is_active, share_token,
               created_at, updated_at
        FROM sessions
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

/// Load one session by id
pub async fn get_session(pool: &SqlitePool, id: Uuid) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, questions, is_active, share_token,
               created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

/// Load one session by its public share token
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, questions, is_active, share_token,
               created_at, updated_at
        FROM sessions
        WHERE share_token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

/// Create a session with a freshly derived share token
pub async fn create_session(pool: &SqlitePool, new: NewSession) -> Result<Session> {
    if new.title.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Session title must not be empty".to_string(),
        ));
    }

    let now = Utc::now();
    let questions_json = serde_json::to_string(&new.questions)
        .map_err(|e| Error::Internal(format!("Failed to serialize questions: {}", e)))?;

    let mut token = derive_share_token(&new.title);

    for attempt in 0..TOKEN_INSERT_ATTEMPTS {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (
                id, title, description, questions, is_active, share_token,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&questions_json)
        .bind(new.is_active as i64)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                return Ok(Session {
                    id,
                    title: new.title,
                    description: new.description,
                    questions: new.questions,
                    is_active: new.is_active,
                    share_token: token,
                    created_at: now,
                    updated_at: now,
                });
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    token = %token,
                    attempt = attempt + 1,
                    "Share token collision, retrying with suffix"
                );
                token = format!(
                    "{}-{:04x}",
                    derive_share_token(&new.title),
                    rand::random::<u16>()
                );
            }
            Err(e) => return Err(Error::Database(e)),
        }
    }

    Err(Error::Internal(
        "Could not derive a unique share token".to_string(),
    ))
}

/// Apply a partial update; returns the updated session
///
/// The share token is never touched.
pub async fn update_session(pool: &SqlitePool, id: Uuid, patch: SessionPatch) -> Result<Session> {
    let mut session = get_session(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session not found: {}", id)))?;

    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Session title must not be empty".to_string(),
            ));
        }
        session.title = title;
    }
    if let Some(description) = patch.description {
        session.description = description;
    }
    if let Some(questions) = patch.questions {
        session.questions = questions;
    }
    if let Some(is_active) = patch.is_active {
        session.is_active = is_active;
    }
    session.updated_at = Utc::now();

    let questions_json = serde_json::to_string(&session.questions)
        .map_err(|e| Error::Internal(format!("Failed to serialize questions: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE sessions
        SET title = ?, description = ?, questions = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&session.title)
    .bind(&session.description)
    .bind(&questions_json)
    .bind(session.is_active as i64)
    .bind(session.updated_at.to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(session)
}

/// Delete a session
///
/// Responses are NOT cascade-deleted; orphans remain queryable.
pub async fn delete_session(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Session not found: {}", id)));
    }

    Ok(())
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse session id: {}", e)))?;

    let questions: String = row.get("questions");
    let questions: Vec<Question> = serde_json::from_str(&questions)
        .map_err(|e| Error::Internal(format!("Failed to deserialize questions: {}", e)))?;

    let created_at: String = row.get("created_at");
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    let updated_at: String = row.get("updated_at");
    let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| Error::Internal(format!("Failed to parse updated_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(Session {
        id,
        title: row.get("title"),
        description: row.get("description"),
        questions,
        is_active: row.get::<i64, _>("is_active") != 0,
        share_token: row.get("share_token"),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_token_slugifies_title() {
        let token = derive_share_token("  Rust  Fundamentals Week 3 ");
        assert!(token.starts_with("rust-fundamentals-week-3-"));
        let suffix = token.rsplit('-').next().unwrap();
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn share_token_falls_back_for_blank_title() {
        let token = derive_share_token("   ");
        assert!(token.starts_with("session-"));
    }
}

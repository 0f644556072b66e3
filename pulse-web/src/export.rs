//! CSV and JSON export of session reports
//!
//! CSV output quotes every field and doubles embedded quotes; embedded
//! newlines ride inside the quoted field. No byte-order mark is emitted.

use chrono::Utc;
use pulse_common::models::{Response, Session};
use serde_json::json;

use crate::analytics::SessionMetrics;

/// Build a CSV document from headers and rows
///
/// Every field is double-quoted with embedded quotes doubled, so commas,
/// quotes, and newlines inside a field round-trip exactly.
pub fn to_csv(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_row(&mut out, headers.iter().map(String::as_str));
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}

/// Serialize a session's responses as CSV
///
/// One row per response, identity/timestamp columns first, then one column
/// per question (in schema order). Returns `None` iff there are no responses.
pub fn session_csv(session: &Session, responses: &[Response]) -> Option<String> {
    if responses.is_empty() {
        return None;
    }

    let mut headers: Vec<String> = vec![
        "Name".to_string(),
        "Email".to_string(),
        "Bootcamp ID".to_string(),
        "Submitted At".to_string(),
    ];
    headers.extend(session.questions.iter().map(|q| q.prompt.clone()));

    let rows: Vec<Vec<String>> = responses
        .iter()
        .map(|response| {
            let mut row = vec![
                response.user_name.clone(),
                response.user_email.clone(),
                response.bootcamp_id.clone(),
                response.submitted_at.to_rfc3339(),
            ];
            for question in &session.questions {
                row.push(
                    response
                        .answers
                        .get(&question.id)
                        .map(|a| a.display_string())
                        .unwrap_or_default(),
                );
            }
            row
        })
        .collect();

    Some(to_csv(&headers, &rows))
}

/// Serialize the full report object with two-space indentation
pub fn session_report_json(
    session: &Session,
    responses: &[Response],
    metrics: &SessionMetrics,
) -> String {
    let report = json!({
        "session": session,
        "metrics": metrics,
        "responses": responses,
    });
    // to_string_pretty uses two-space indentation
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

/// Derive a download filename from the session title
///
/// Whitespace becomes underscores; the current date is appended. Collisions
/// between exports of the same day are the downloader's concern.
pub fn export_filename(title: &str, extension: &str) -> String {
    let stem: String = title.trim().split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    format!("{}_{}.{}", stem, Utc::now().format("%Y-%m-%d"), extension)
}

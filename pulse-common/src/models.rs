//! Domain models for feedback sessions and responses
//!
//! Sessions carry their question schema as an embedded JSON array; responses
//! carry an answer map keyed strictly by question id. Rating answers are
//! normalized to integers once, at the submission boundary
//! ([`normalize_answers`]), so aggregation never re-coerces values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Question type tag within a session's schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "short-text")]
    ShortText,
    #[serde(rename = "long-text")]
    LongText,
    #[serde(rename = "rating-1-to-5")]
    Rating,
    #[serde(rename = "single-choice")]
    SingleChoice,
    #[serde(rename = "location-choice")]
    LocationChoice,
}

/// One question in a session's schema
///
/// The id is unique within its session, not globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
    /// Allowed values for single-choice / location-choice questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

/// A feedback collection instance tied to one workshop/event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub is_active: bool,
    /// Opaque token forming the public submission URL; unique and immutable
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Look up a question by id
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Id of the first location-choice question, if the schema has one
    pub fn location_question_id(&self) -> Option<&str> {
        self.questions
            .iter()
            .find(|q| q.kind == QuestionKind::LocationChoice)
            .map(|q| q.id.as_str())
    }
}

/// A normalized answer value
///
/// Rating answers are stored as integers 1..=5; everything else (free text,
/// choice selections) is stored as its text. Untagged serde keeps the stored
/// JSON shape `{"q1": 5, "q2": "Berlin"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Rating(u8),
    Text(String),
}

impl AnswerValue {
    pub fn as_rating(&self) -> Option<u8> {
        match self {
            AnswerValue::Rating(r) => Some(*r),
            AnswerValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(t) => Some(t.as_str()),
            AnswerValue::Rating(_) => None,
        }
    }

    /// Render the value for CSV/report output
    pub fn display_string(&self) -> String {
        match self {
            AnswerValue::Rating(r) => r.to_string(),
            AnswerValue::Text(t) => t.clone(),
        }
    }
}

/// One submitter's complete set of answers to a session's questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub bootcamp_id: String,
    /// Answer map keyed by question id (BTreeMap for deterministic iteration)
    pub answers: BTreeMap<String, AnswerValue>,
    pub submitted_at: DateTime<Utc>,
}

impl Response {
    /// All rating answer values in this response
    pub fn rating_values(&self) -> impl Iterator<Item = u8> + '_ {
        self.answers.values().filter_map(AnswerValue::as_rating)
    }

    /// Mean of this response's rating answers, None if it has none
    pub fn mean_rating(&self) -> Option<f64> {
        let ratings: Vec<u8> = self.rating_values().collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64)
    }
}

/// Validate and normalize a raw answer map against a session's question schema
///
/// Rules:
/// - every key must reference a question id in `questions` (unknown keys rejected)
/// - required questions must be answered with a non-empty value
/// - rating answers accept JSON numbers or numeric strings, normalized to 1..=5
/// - choice answers must be one of the question's choices when a list is given
pub fn normalize_answers(
    questions: &[Question],
    raw: &serde_json::Map<String, serde_json::Value>,
) -> Result<BTreeMap<String, AnswerValue>> {
    let mut normalized = BTreeMap::new();

    for (key, value) in raw {
        let question = questions
            .iter()
            .find(|q| q.id == *key)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown question id: {}", key)))?;

        let answer = normalize_value(question, value)?;
        normalized.insert(key.clone(), answer);
    }

    for question in questions {
        if !question.required {
            continue;
        }
        let empty = match normalized.get(&question.id) {
            None => true,
            Some(AnswerValue::Text(t)) => t.trim().is_empty(),
            Some(AnswerValue::Rating(_)) => false,
        };
        if empty {
            return Err(Error::InvalidInput(format!(
                "Required question not answered: {}",
                question.id
            )));
        }
    }

    Ok(normalized)
}

fn normalize_value(question: &Question, value: &serde_json::Value) -> Result<AnswerValue> {
    match question.kind {
        QuestionKind::Rating => {
            let rating = match value {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match rating {
                Some(r @ 1..=5) => Ok(AnswerValue::Rating(r as u8)),
                _ => Err(Error::InvalidInput(format!(
                    "Rating answer for {} must be an integer 1-5",
                    question.id
                ))),
            }
        }
        QuestionKind::SingleChoice | QuestionKind::LocationChoice => {
            let text = value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::InvalidInput(format!("Choice answer for {} must be a string", question.id))
                })?;
            if !question.choices.is_empty() && !question.choices.iter().any(|c| *c == text) {
                return Err(Error::InvalidInput(format!(
                    "Answer for {} is not one of the allowed choices",
                    question.id
                )));
            }
            Ok(AnswerValue::Text(text))
        }
        QuestionKind::ShortText | QuestionKind::LongText => match value {
            serde_json::Value::String(s) => Ok(AnswerValue::Text(s.clone())),
            // Tolerate numeric submissions for text questions
            serde_json::Value::Number(n) => Ok(AnswerValue::Text(n.to_string())),
            _ => Err(Error::InvalidInput(format!(
                "Text answer for {} must be a string",
                question.id
            ))),
        },
    }
}

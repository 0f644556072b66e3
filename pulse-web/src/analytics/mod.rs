//! Aggregation over in-memory session/response collections
//!
//! Pure, stateless functions: given the same input slices they produce
//! identical output, and every division is guarded against empty inputs.
//! Numeric coercion happens once at the submission boundary (ratings are
//! already `AnswerValue::Rating`), never here.
//!
//! Two rating metrics coexist on purpose: the distribution counts individual
//! rating answers, while the average is the mean of per-response means.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pulse_common::models::{AnswerValue, Response, Session};
use serde::Serialize;
use uuid::Uuid;

/// Fixed location allow-list used when a session has no location-choice
/// question; arbitrary answer values are scanned against it.
pub const KNOWN_LOCATIONS: [&str; 3] = ["Berlin", "Munich", "Online"];

/// Number of day buckets retained by the temporal trend
const TREND_DAYS: usize = 7;

/// Fixed response-rate denominator; below 50 responses the metric saturates
const RESPONSE_RATE_TARGET: u64 = 50;

/// One location bucket with its share of the total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationBucket {
    pub location: String,
    pub count: u64,
    pub percentage: f64,
}

/// Counts of individual rating answers for each value 1..=5
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: u64,
}

/// Per-session metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub session_id: Uuid,
    pub response_count: u64,
    /// Mean of per-response mean ratings; None when no response carries one
    pub average_rating: Option<f64>,
    /// Saturating percentage against a fixed target of 50 responses
    pub response_rate: f64,
    /// Percentage of responses answering at least as many questions as the
    /// session schema defines
    pub completion_rate: f64,
}

/// One day in the temporal trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Dashboard totals across all sessions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub total_responses: u64,
    pub average_rating: Option<f64>,
    pub locations: Vec<LocationBucket>,
    pub ratings: Vec<RatingBucket>,
    pub trend: Vec<TrendPoint>,
}

/// Find the location answer of a response
///
/// Prefers the owning session's location-choice question; otherwise scans all
/// answer values against [`KNOWN_LOCATIONS`].
pub fn response_location<'a>(response: &'a Response, sessions: &[Session]) -> Option<&'a str> {
    let session = sessions.iter().find(|s| s.id == response.session_id);
    if let Some(question_id) = session.and_then(|s| s.location_question_id()) {
        if let Some(AnswerValue::Text(location)) = response.answers.get(question_id) {
            return Some(location.as_str());
        }
    }

    response
        .answers
        .values()
        .filter_map(AnswerValue::as_text)
        .find(|value| KNOWN_LOCATIONS.iter().any(|l| l == value))
}

/// Group responses by location answer, with percentages of total
///
/// Percentages are of the full response count, so buckets sum to 100 exactly
/// when every response carries a location answer.
pub fn location_distribution(responses: &[Response], sessions: &[Session]) -> Vec<LocationBucket> {
    let total = responses.len() as u64;
    if total == 0 {
        return Vec::new();
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for response in responses {
        if let Some(location) = response_location(response, sessions) {
            *counts.entry(location.to_string()).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(location, count)| LocationBucket {
            location,
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Count individual rating answers per value 1..=5 (per-answer, not
/// per-response)
pub fn rating_distribution(responses: &[Response]) -> Vec<RatingBucket> {
    let mut counts = [0u64; 5];
    for response in responses {
        for rating in response.rating_values() {
            counts[(rating - 1) as usize] += 1;
        }
    }

    (1u8..=5)
        .map(|rating| RatingBucket {
            rating,
            count: counts[(rating - 1) as usize],
        })
        .collect()
}

/// Mean of per-response mean ratings
///
/// Responses without any rating answer are excluded from the denominator, so
/// a text-only response never shifts the average.
pub fn average_rating(responses: &[Response]) -> Option<f64> {
    let means: Vec<f64> = responses.iter().filter_map(Response::mean_rating).collect();
    if means.is_empty() {
        return None;
    }
    Some(means.iter().sum::<f64>() / means.len() as f64)
}

/// Compute per-session metrics from the session's responses
pub fn session_metrics(session: &Session, responses: &[Response]) -> SessionMetrics {
    let own: Vec<&Response> = responses
        .iter()
        .filter(|r| r.session_id == session.id)
        .collect();
    let total = own.len() as u64;

    let response_rate = if total == 0 {
        0.0
    } else {
        (total as f64 / total.max(RESPONSE_RATE_TARGET) as f64 * 100.0).min(100.0)
    };

    let question_count = session.questions.len();
    let completion_rate = if total == 0 {
        0.0
    } else {
        let complete = own
            .iter()
            .filter(|r| r.answers.len() >= question_count)
            .count();
        complete as f64 / total as f64 * 100.0
    };

    let means: Vec<f64> = own.iter().filter_map(|r| r.mean_rating()).collect();
    let average_rating = if means.is_empty() {
        None
    } else {
        Some(means.iter().sum::<f64>() / means.len() as f64)
    };

    SessionMetrics {
        session_id: session.id,
        response_count: total,
        average_rating,
        response_rate,
        completion_rate,
    }
}

/// Group responses by calendar date, chronological, most recent seven days
pub fn daily_trend(responses: &[Response]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for response in responses {
        *buckets.entry(response.submitted_at.date_naive()).or_insert(0) += 1;
    }

    let points: Vec<TrendPoint> = buckets
        .into_iter()
        .map(|(date, count)| TrendPoint { date, count })
        .collect();

    let skip = points.len().saturating_sub(TREND_DAYS);
    points.into_iter().skip(skip).collect()
}

/// Dashboard totals composed from the individual aggregations
pub fn overview(sessions: &[Session], responses: &[Response]) -> Overview {
    Overview {
        total_sessions: sessions.len() as u64,
        active_sessions: sessions.iter().filter(|s| s.is_active).count() as u64,
        total_responses: responses.len() as u64,
        average_rating: average_rating(responses),
        locations: location_distribution(responses, sessions),
        ratings: rating_distribution(responses),
        trend: daily_trend(responses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pulse_common::models::{Question, QuestionKind};

    fn question(id: &str, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            kind,
            prompt: id.to_string(),
            required: false,
            choices: if kind == QuestionKind::LocationChoice {
                KNOWN_LOCATIONS.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            },
        }
    }

    fn session(questions: Vec<Question>) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            title: "Rust Fundamentals".into(),
            description: String::new(),
            questions,
            is_active: true,
            share_token: "rust-fundamentals-1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn response(session: &Session, answers: Vec<(&str, AnswerValue)>) -> Response {
        Response {
            id: Uuid::new_v4(),
            session_id: session.id,
            user_name: "Sam".into(),
            user_email: "sam@example.com".into(),
            bootcamp_id: "b-1".into(),
            answers: answers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn location_percentages_sum_to_100_when_all_located() {
        let s = session(vec![question("loc", QuestionKind::LocationChoice)]);
        let responses = vec![
            response(&s, vec![("loc", AnswerValue::Text("Berlin".into()))]),
            response(&s, vec![("loc", AnswerValue::Text("Berlin".into()))]),
            response(&s, vec![("loc", AnswerValue::Text("Munich".into()))]),
            response(&s, vec![("loc", AnswerValue::Text("Online".into()))]),
        ];

        let buckets = location_distribution(&responses, &[s]);
        let sum: f64 = buckets.iter().map(|b| b.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 4);
    }

    #[test]
    fn location_falls_back_to_allow_list_scan() {
        let s = session(vec![question("q1", QuestionKind::ShortText)]);
        let responses = vec![response(
            &s,
            vec![("q1", AnswerValue::Text("Munich".into()))],
        )];

        let buckets = location_distribution(&responses, &[s]);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].location, "Munich");
    }

    #[test]
    fn location_distribution_empty_input() {
        assert!(location_distribution(&[], &[]).is_empty());
    }

    #[test]
    fn rating_distribution_counts_per_answer() {
        let s = session(vec![
            question("r1", QuestionKind::Rating),
            question("r2", QuestionKind::Rating),
        ]);
        let responses = vec![
            response(
                &s,
                vec![
                    ("r1", AnswerValue::Rating(5)),
                    ("r2", AnswerValue::Rating(5)),
                ],
            ),
            response(&s, vec![("r1", AnswerValue::Rating(3))]),
        ];

        let dist = rating_distribution(&responses);
        assert_eq!(dist[4], RatingBucket { rating: 5, count: 2 });
        assert_eq!(dist[2], RatingBucket { rating: 3, count: 1 });
        assert_eq!(dist[0], RatingBucket { rating: 1, count: 0 });
    }

    #[test]
    fn average_rating_is_mean_of_response_means() {
        let s = session(vec![question("r1", QuestionKind::Rating)]);
        let mut responses: Vec<Response> = [5u8, 5, 4, 3]
            .iter()
            .map(|r| response(&s, vec![("r1", AnswerValue::Rating(*r))]))
            .collect();

        assert_eq!(average_rating(&responses), Some(4.25));

        // A ratings-free response must not shift the average
        responses.push(response(
            &s,
            vec![("r1", AnswerValue::Text("no comment".into()))],
        ));
        assert_eq!(average_rating(&responses), Some(4.25));
    }

    #[test]
    fn completion_rate_requires_all_questions_answered() {
        let s = session(vec![
            question("q1", QuestionKind::Rating),
            question("q2", QuestionKind::ShortText),
            question("q3", QuestionKind::ShortText),
        ]);
        let responses = vec![
            response(
                &s,
                vec![
                    ("q1", AnswerValue::Rating(4)),
                    ("q2", AnswerValue::Text("a".into())),
                    ("q3", AnswerValue::Text("b".into())),
                ],
            ),
            // Only two of three answered: not complete
            response(
                &s,
                vec![
                    ("q1", AnswerValue::Rating(4)),
                    ("q2", AnswerValue::Text("a".into())),
                ],
            ),
        ];

        let metrics = session_metrics(&s, &responses);
        assert_eq!(metrics.response_count, 2);
        assert!((metrics.completion_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn response_rate_saturates_at_fixed_target() {
        let s = session(vec![question("q1", QuestionKind::Rating)]);

        let few: Vec<Response> = (0..10)
            .map(|_| response(&s, vec![("q1", AnswerValue::Rating(4))]))
            .collect();
        let metrics = session_metrics(&s, &few);
        assert!((metrics.response_rate - 20.0).abs() < 1e-9);

        let many: Vec<Response> = (0..60)
            .map(|_| response(&s, vec![("q1", AnswerValue::Rating(4))]))
            .collect();
        let metrics = session_metrics(&s, &many);
        assert!((metrics.response_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn trend_keeps_most_recent_seven_days() {
        let s = session(vec![question("q1", QuestionKind::ShortText)]);
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();

        let responses: Vec<Response> = (0..10)
            .map(|day| {
                let mut r = response(&s, vec![("q1", AnswerValue::Text("x".into()))]);
                r.submitted_at = base + Duration::days(day);
                r
            })
            .collect();

        let trend = daily_trend(&responses);
        assert_eq!(trend.len(), 7);
        assert_eq!(
            trend.first().unwrap().date,
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap()
        );
        assert_eq!(
            trend.last().unwrap().date,
            NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
        );
        assert!(trend.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn aggregations_are_deterministic() {
        let s = session(vec![
            question("r1", QuestionKind::Rating),
            question("loc", QuestionKind::LocationChoice),
        ]);
        let responses = vec![
            response(
                &s,
                vec![
                    ("r1", AnswerValue::Rating(4)),
                    ("loc", AnswerValue::Text("Berlin".into())),
                ],
            ),
            response(&s, vec![("r1", AnswerValue::Rating(2))]),
        ];
        let sessions = vec![s];

        let first = overview(&sessions, &responses);
        let second = overview(&sessions, &responses);
        assert_eq!(first, second);
    }

    #[test]
    fn overview_counts_active_sessions() {
        let mut inactive = session(vec![]);
        inactive.is_active = false;
        let active = session(vec![]);

        let view = overview(&[inactive, active], &[]);
        assert_eq!(view.total_sessions, 2);
        assert_eq!(view.active_sessions, 1);
        assert_eq!(view.total_responses, 0);
        assert_eq!(view.average_rating, None);
    }
}

//! Event types pushed to subscribed clients
//!
//! Two logical channels ride one broadcaster: response inserts (carrying the
//! full new record) and session changes of any kind (id plus change tag; the
//! client re-fetches the collection rather than patching incrementally).

use pulse_common::models::Response;
use serde::Serialize;
use uuid::Uuid;

/// Kind of session change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionChange {
    Created,
    Updated,
    Deleted,
}

/// Row-change event broadcast over SSE
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PulseEvent {
    ResponseCreated { response: Response },
    SessionChanged { session_id: Uuid, change: SessionChange },
}

impl PulseEvent {
    /// SSE event name for this variant
    pub fn name(&self) -> &'static str {
        match self {
            PulseEvent::ResponseCreated { .. } => "ResponseCreated",
            PulseEvent::SessionChanged { .. } => "SessionChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn session_change_serializes_lowercase() {
        let event = PulseEvent::SessionChanged {
            session_id: Uuid::nil(),
            change: SessionChange::Deleted,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["change"], "deleted");
        assert_eq!(event.name(), "SessionChanged");
    }

    #[test]
    fn response_event_carries_full_record() {
        let response = Response {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_name: "Kim".into(),
            user_email: String::new(),
            bootcamp_id: String::new(),
            answers: Default::default(),
            submitted_at: Utc::now(),
        };
        let event = PulseEvent::ResponseCreated {
            response: response.clone(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["response"]["user_name"], "Kim");
        assert_eq!(event.name(), "ResponseCreated");
    }
}

//! Completion API client for narrative analysis reports
//!
//! Serializes the current dataset into one of the fixed prompt templates and
//! forwards it to the configured chat-completion endpoint. The returned text
//! is passed through verbatim. User-initiated enrichment only: no retry, no
//! backoff, no caching, and every invocation re-sends the full dataset.

use pulse_common::config::AiConfig;
use pulse_common::models::{Response, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// AI client errors
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI endpoint or API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Completion response contained no text")]
    EmptyCompletion,
}

/// Prompt-template selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    #[serde(rename = "dashboard-summary")]
    DashboardSummary,
    #[serde(rename = "predictive-analytics")]
    PredictiveAnalytics,
    #[serde(rename = "optimization-recommendations")]
    OptimizationRecommendations,
    #[serde(rename = "automated-report")]
    AutomatedReport,
    #[serde(rename = "quality-assessment")]
    QualityAssessment,
    #[serde(rename = "summary")]
    Summary,
    #[serde(rename = "sentiment")]
    Sentiment,
    #[serde(rename = "insights")]
    Insights,
}

impl AnalysisKind {
    /// Instruction prefix for this analysis type; the serialized dataset is
    /// appended below it
    fn instruction(self) -> &'static str {
        match self {
            AnalysisKind::DashboardSummary => {
                "Summarize the current state of this feedback dashboard in a few short \
                 paragraphs: participation, standout sessions, and overall satisfaction."
            }
            AnalysisKind::PredictiveAnalytics => {
                "Based on the trends in this feedback data, project how participation and \
                 satisfaction are likely to develop over the coming weeks, and state the \
                 assumptions behind each projection."
            }
            AnalysisKind::OptimizationRecommendations => {
                "Recommend concrete changes to the sessions with the weakest ratings or \
                 completion rates. Prioritize the recommendations and justify each one with \
                 the data."
            }
            AnalysisKind::AutomatedReport => {
                "Write a complete feedback report suitable for forwarding to program \
                 management: an executive summary, per-session findings, and next steps."
            }
            AnalysisKind::QualityAssessment => {
                "Assess the quality of the collected feedback itself: coverage, completion, \
                 answer depth, and any gaps that make the data hard to act on."
            }
            AnalysisKind::Summary => {
                "Summarize this feedback data concisely: headline numbers first, then the \
                 most common themes in the free-text answers."
            }
            AnalysisKind::Sentiment => {
                "Analyze the sentiment of the free-text answers in this feedback data. Group \
                 them into positive, neutral, and negative, with representative quotes."
            }
            AnalysisKind::Insights => {
                "Extract the non-obvious insights from this feedback data: correlations, \
                 outliers, and anything the headline averages hide."
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Client for the external completion endpoint
#[derive(Debug)]
pub struct AiClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AiClient {
    /// Build a client from configuration; fails when endpoint or key missing
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let endpoint = config.endpoint.clone().ok_or(AiError::NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(AiError::NotConfigured)?;

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
            model: config.model_name().to_string(),
        })
    }

    /// Build the prompt for one analysis kind over the full dataset
    pub fn build_prompt(
        kind: AnalysisKind,
        sessions: &[Session],
        responses: &[Response],
    ) -> String {
        let dataset = json!({
            "sessions": sessions,
            "responses": responses,
        });
        format!(
            "{}\n\nFeedback dataset (JSON):\n{}",
            kind.instruction(),
            serde_json::to_string_pretty(&dataset).unwrap_or_else(|_| "{}".to_string())
        )
    }

    /// Generate a narrative report for the given dataset
    pub async fn generate(
        &self,
        kind: AnalysisKind,
        sessions: &[Session],
        responses: &[Response],
    ) -> Result<String, AiError> {
        let prompt = Self::build_prompt(kind, sessions, responses);

        tracing::debug!(
            endpoint = %self.endpoint,
            kind = ?kind,
            sessions = sessions.len(),
            responses = responses.len(),
            "Requesting completion"
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiError::Api(status.as_u16(), error_text));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiError::EmptyCompletion)?;

        tracing::info!(kind = ?kind, chars = text.len(), "Completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_kind_uses_wire_names() {
        let kind: AnalysisKind = serde_json::from_str("\"dashboard-summary\"").unwrap();
        assert_eq!(kind, AnalysisKind::DashboardSummary);

        let kind: AnalysisKind = serde_json::from_str("\"optimization-recommendations\"").unwrap();
        assert_eq!(kind, AnalysisKind::OptimizationRecommendations);

        assert!(serde_json::from_str::<AnalysisKind>("\"mystery\"").is_err());
    }

    #[test]
    fn missing_configuration_is_rejected() {
        let err = AiClient::from_config(&AiConfig::default()).unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));

        let partial = AiConfig {
            endpoint: Some("https://example.test/v1/chat/completions".into()),
            api_key: None,
            model: None,
        };
        assert!(matches!(
            AiClient::from_config(&partial),
            Err(AiError::NotConfigured)
        ));
    }

    #[test]
    fn prompt_embeds_dataset_json() {
        let prompt = AiClient::build_prompt(AnalysisKind::Sentiment, &[], &[]);
        assert!(prompt.starts_with("Analyze the sentiment"));
        assert!(prompt.contains("\"sessions\": []"));
        assert!(prompt.contains("\"responses\": []"));
    }

    #[test]
    fn completion_response_parses() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"All good."}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("All good.")
        );
    }
}

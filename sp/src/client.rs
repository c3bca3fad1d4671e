//! Client for the plan-generation endpoint
//!
//! Sends one validated request and hands back either the plan or a message
//! fit for showing to the student.

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::domain::{StudyPlanInput, StudyPlanResponse};

/// Shown when the service fails without saying why
pub const DEFAULT_ERROR_MESSAGE: &str = "Failed to generate study plan";

/// Errors surfaced to the person running the client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("Could not reach the study plan service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from the study plan service: {0}")]
    InvalidResponse(String),
}

/// HTTP client for one study plan service
pub struct PlanClient {
    endpoint: String,
    public_key: Option<String>,
    http: Client,
}

impl PlanClient {
    pub fn new(base_url: &str, route: &str, public_key: Option<String>) -> Self {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), route);
        debug!(%endpoint, has_key = public_key.is_some(), "PlanClient::new: called");
        Self {
            endpoint,
            public_key,
            http: Client::new(),
        }
    }

    /// Address the service named by the client and server sections of the config
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.client.base_url, &config.server.route, config.client.public_key())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request a plan; any non-2xx status becomes [`ClientError::Service`]
    pub async fn request_plan(&self, input: &StudyPlanInput) -> Result<StudyPlanResponse, ClientError> {
        debug!(endpoint = %self.endpoint, "PlanClient::request_plan: called");
        let mut request = self.http.post(&self.endpoint).json(&input.to_request());
        if let Some(key) = &self.public_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "PlanClient::request_plan: service error");
            return Err(ClientError::Service {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// The `error` field of a JSON error body, or the generic message
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"error":"Rate limit exceeded. Please try again in a moment."}"#),
            "Rate limit exceeded. Please try again in a moment."
        );
    }

    #[test]
    fn test_error_message_defaults() {
        assert_eq!(error_message(""), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message":"nope"}"#), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"error":""}"#), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"error":42}"#), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_endpoint_joins_base_and_route() {
        let client = PlanClient::new("http://localhost:8787/", "/functions/v1/generate-study-plan", None);
        assert_eq!(client.endpoint(), "http://localhost:8787/functions/v1/generate-study-plan");
    }

    #[test]
    fn test_service_error_displays_message() {
        let err = ClientError::Service {
            status: 402,
            message: "Service temporarily unavailable. Please try again later.".to_string(),
        };
        assert_eq!(err.to_string(), "Service temporarily unavailable. Please try again later.");
    }
}

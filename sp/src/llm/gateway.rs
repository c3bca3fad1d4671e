//! Chat-completions gateway client
//!
//! Implements the LlmClient trait for an OpenAI-compatible Chat Completions
//! endpoint. One attempt per request: 429 and 402 are surfaced as their own
//! error variants, every other non-2xx as an API error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, TokenUsage, ToolCall};
use crate::config::ResolvedGatewayConfig;

/// Client for an OpenAI-compatible chat-completions gateway
pub struct GatewayClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl GatewayClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedGatewayConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, tool = %request.tool.name, "build_request_body: called");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "tools": [request.tool.to_openai_schema()],
            "tool_choice": request.tool.forced_choice(),
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Convert the API response, keeping only the first choice
    fn parse_response(&self, api_response: ChatResponse) -> CompletionResponse {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let tool_calls = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls)
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        CompletionResponse { tool_calls, usage }
    }
}

#[async_trait]
impl LlmClient for GatewayClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            debug!("complete: rate limited (429)");
            return Err(LlmError::RateLimited);
        }

        if status == StatusCode::PAYMENT_REQUIRED {
            debug!("complete: payment required (402)");
            return Err(LlmError::PaymentRequired);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %text, "AI gateway error");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| match e.is_timeout() {
                true => LlmError::Timeout(self.timeout),
                false => LlmError::InvalidResponse(e.to_string()),
            })?;
        let parsed = self.parse_response(api_response);
        info!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            tool_calls = parsed.tool_calls.len(),
            "Gateway completion received"
        );
        Ok(parsed)
    }
}

// Chat-completions response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

//! Chat-completion request/response types
//!
//! Modelled on the OpenAI Chat Completions shape, reduced to what a single
//! forced tool call needs: one system prompt, one user prompt, one tool.

use serde::Serialize;
use tracing::debug;

/// A completion request - everything needed for one gateway call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from Handlebars template)
    pub system_prompt: String,

    /// The single user turn
    pub user_prompt: String,

    /// The function the model must call
    pub tool: ToolDefinition,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Tool calls of the first choice, in order
    pub tool_calls: Vec<ToolCall>,

    /// Token usage as reported by the gateway
    pub usage: TokenUsage,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// Raw JSON arguments string, unparsed
    pub arguments: String,
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Tool definition for the LLM
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the function arguments
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        let name = name.into();
        let description = description.into();
        debug!(%name, "ToolDefinition::new: called");
        Self {
            name,
            description,
            parameters,
        }
    }

    /// Convert to OpenAI function-tool format
    pub fn to_openai_schema(&self) -> serde_json::Value {
        debug!(%self.name, "ToolDefinition::to_openai_schema: called");
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    /// `tool_choice` value that forces a call to this function
    pub fn forced_choice(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": { "name": self.name },
        })
    }
}

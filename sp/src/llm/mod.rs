//! LLM client module
//!
//! Provides the completion-gateway client used to generate study plans.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gateway;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gateway::GatewayClient;
pub use types::{CompletionRequest, CompletionResponse, TokenUsage, ToolCall, ToolDefinition};

use crate::config::ResolvedGatewayConfig;

/// Create the gateway client from a resolved configuration
pub fn create_client(config: &ResolvedGatewayConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(GatewayClient::from_config(config)?))
}

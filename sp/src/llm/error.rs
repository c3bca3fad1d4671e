//! LLM gateway error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the completion gateway
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by gateway")]
    RateLimited,

    #[error("Gateway requires payment")]
    PaymentRequired,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Map a transport error, singling out timeouts
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Network(err)
        }
    }
}

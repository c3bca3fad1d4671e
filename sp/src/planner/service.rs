//! Plan generation pipeline
//!
//! Two stages:
//!
//! 1. [`StudyPlanService::attempt_generate`] builds the prompts, calls the
//!    gateway with a forced `generate_study_plan` tool call and parses the
//!    result, returning `Result<StudyPlanResponse, Failure>`.
//! 2. [`resolve`] turns that result into a [`PlanOutcome`]: rate limiting
//!    and payment-required pass through as 429/402, every other failure is
//!    replaced by the fallback plan with status 200.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::schema::{TOOL_NAME, study_plan_tool};
use crate::domain::{PlanError, PlanRequest, StudyPlanInput, StudyPlanResponse};
use crate::llm::{CompletionRequest, LlmClient, LlmError, ToolDefinition};
use crate::prompts::{PromptContext, PromptLoader};

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";

pub const PAYMENT_REQUIRED_MESSAGE: &str = "Service temporarily unavailable. Please try again later.";

/// Anything that stops a generated plan from reaching the caller
#[derive(Debug, Error)]
pub enum Failure {
    #[error("request body is not a plan request: {0}")]
    MalformedRequest(serde_json::Error),

    #[error("failed to build prompt: {0}")]
    Prompt(eyre::Report),

    #[error("rate limited by gateway")]
    RateLimited,

    #[error("gateway requires payment")]
    PaymentRequired,

    #[error("gateway call failed: {0}")]
    Gateway(LlmError),

    #[error("gateway response has no tool call")]
    MissingToolCall,

    #[error("gateway called unexpected tool '{0}'")]
    WrongTool(String),

    #[error("invalid study plan: {0}")]
    InvalidPlan(#[from] PlanError),
}

impl From<LlmError> for Failure {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited => Failure::RateLimited,
            LlmError::PaymentRequired => Failure::PaymentRequired,
            other => Failure::Gateway(other),
        }
    }
}

/// What the endpoint sends back
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A plan with status 200; `fallback` marks the canned plan
    Plan { plan: StudyPlanResponse, fallback: bool },
    /// An error body with a non-200 status
    Rejected { status: StatusCode, message: String },
}

impl PlanOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            PlanOutcome::Plan { .. } => StatusCode::OK,
            PlanOutcome::Rejected { status, .. } => *status,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PlanOutcome::Plan { fallback: true, .. })
    }

    fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        PlanOutcome::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Map a generation result to the response policy
pub fn resolve(result: Result<StudyPlanResponse, Failure>) -> PlanOutcome {
    match result {
        Ok(plan) => PlanOutcome::Plan { plan, fallback: false },
        Err(Failure::RateLimited) => {
            warn!("Gateway rate limit hit");
            PlanOutcome::rejected(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE)
        }
        Err(Failure::PaymentRequired) => {
            warn!("Gateway reports payment required");
            PlanOutcome::rejected(StatusCode::PAYMENT_REQUIRED, PAYMENT_REQUIRED_MESSAGE)
        }
        Err(failure) => {
            error!(error = %failure, "Error generating study plan, serving fallback");
            PlanOutcome::Plan {
                plan: StudyPlanResponse::fallback(),
                fallback: true,
            }
        }
    }
}

/// Stateless plan generator shared by all requests
pub struct StudyPlanService {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    tool: ToolDefinition,
}

impl StudyPlanService {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader) -> Self {
        debug!("StudyPlanService::new: called");
        Self {
            llm,
            prompts,
            tool: study_plan_tool(),
        }
    }

    /// Handle a raw request body end to end
    ///
    /// An undecodable body is a generic failure (fallback), a decodable but
    /// invalid one is a 400.
    pub async fn handle_body(&self, body: &[u8]) -> PlanOutcome {
        debug!(body_len = body.len(), "StudyPlanService::handle_body: called");
        let request: PlanRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => return resolve(Err(Failure::MalformedRequest(e))),
        };

        match request.validate() {
            Ok(input) => self.generate(&input).await,
            Err(e) => {
                debug!(error = %e, "StudyPlanService::handle_body: validation failed");
                PlanOutcome::rejected(StatusCode::BAD_REQUEST, e.to_string())
            }
        }
    }

    /// Generate a plan for validated input, applying the fallback policy
    pub async fn generate(&self, input: &StudyPlanInput) -> PlanOutcome {
        resolve(self.attempt_generate(input, Utc::now()).await)
    }

    /// One gateway round trip; no fallback applied
    pub async fn attempt_generate(
        &self,
        input: &StudyPlanInput,
        now: DateTime<Utc>,
    ) -> Result<StudyPlanResponse, Failure> {
        debug!(subjects = ?input.subjects, "StudyPlanService::attempt_generate: called");
        let request = self.build_request(input, now)?;
        let response = self.llm.complete(request).await?;

        let call = response.tool_calls.first().ok_or(Failure::MissingToolCall)?;
        if call.name != TOOL_NAME {
            return Err(Failure::WrongTool(call.name.clone()));
        }

        Ok(StudyPlanResponse::from_tool_arguments(&call.arguments)?)
    }

    fn build_request(&self, input: &StudyPlanInput, now: DateTime<Utc>) -> Result<CompletionRequest, Failure> {
        let context = PromptContext::new(input, now, TOOL_NAME);
        debug!(days_until_exam = context.days_until_exam, "build_request: prompt context ready");

        Ok(CompletionRequest {
            system_prompt: self.prompts.render("system", &context).map_err(Failure::Prompt)?,
            user_prompt: self.prompts.render("user", &context).map_err(Failure::Prompt)?,
            tool: self.tool.clone(),
        })
    }
}

//! studyplan - personalized weekly study plans
//!
//! An HTTP endpoint that turns a student's subjects, exam date, daily hours
//! and stress level into a structured weekly plan by forcing a hosted LLM to
//! call a single `generate_study_plan` function. Quota errors from the
//! gateway are passed through; every other failure yields a canned plan.
//!
//! # Modules
//!
//! - [`domain`] - Request validation, the plan model and the fallback plan
//! - [`llm`] - Completion-gateway client trait and implementation
//! - [`prompts`] - Handlebars prompt templates
//! - [`planner`] - Tool schema and the generate/resolve pipeline
//! - [`server`] - axum router and server loop
//! - [`client`] - Client for the endpoint
//! - [`export`] - Plain-text rendering of a plan
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod export;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod server;

// Re-export commonly used types
pub use client::{ClientError, PlanClient};
pub use config::{Config, GatewayConfig, ResolvedGatewayConfig, ServerConfig};
pub use domain::{DailyPlan, PlanRequest, StressLevel, StudyPlanInput, StudyPlanResponse, ValidationError};
pub use llm::{CompletionRequest, CompletionResponse, GatewayClient, LlmClient, LlmError};
pub use planner::{Failure, PlanOutcome, StudyPlanService, resolve};
pub use prompts::PromptLoader;
pub use server::{AppState, router};

//! Study plan generation
//!
//! Turns validated input into a gateway request with a fixed output schema
//! and applies the fallback policy to whatever comes back.

mod schema;
mod service;

pub use schema::{TOOL_NAME, study_plan_tool};
pub use service::{
    Failure, PAYMENT_REQUIRED_MESSAGE, PlanOutcome, RATE_LIMIT_MESSAGE, StudyPlanService, resolve,
};

//! Domain types for study plan generation
//!
//! - [`PlanRequest`] / [`StudyPlanInput`] - what the student asks for
//! - [`StudyPlanResponse`] / [`DailyPlan`] - what comes back
//! - [`StudyPlanResponse::fallback`] - the canned plan served on failure

mod fallback;
mod input;
mod plan;

pub use fallback::{FALLBACK_MOTIVATION, FALLBACK_OVERVIEW};
pub use input::{
    DEFAULT_HOURS_PER_DAY, MAX_HOURS_PER_DAY, MIN_HOURS_PER_DAY, PlanRequest, StressLevel, StudyPlanInput,
    ValidationError, days_until, parse_exam_date,
};
pub use plan::{DailyPlan, PlanError, StudyPlanResponse};

//! Study plan response types

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// Largest magnitude at which every whole f64 is exact
const MAX_EXACT_WHOLE: f64 = 9_007_199_254_740_992.0;

/// One day of the weekly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    pub day: String,
    pub tasks: Vec<String>,
    #[serde(serialize_with = "serialize_hours")]
    pub study_hours: f64,
}

/// Whole hours go out as JSON integers (`4`, not `4.0`)
fn serialize_hours<S: Serializer>(hours: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if hours.fract() == 0.0 && hours.abs() <= MAX_EXACT_WHOLE {
        serializer.serialize_i64(*hours as i64)
    } else {
        serializer.serialize_f64(*hours)
    }
}

impl DailyPlan {
    pub fn new(day: impl Into<String>, tasks: &[&str], study_hours: f64) -> Self {
        Self {
            day: day.into(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
            study_hours,
        }
    }
}

/// A complete weekly study plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanResponse {
    pub overview: String,
    pub weekly_plan: Vec<DailyPlan>,
    pub focus_tips: Vec<String>,
    pub burnout_warnings: Vec<String>,
    pub motivation: String,
}

/// Why a model-produced plan was rejected
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("tool arguments are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("incomplete study plan: missing {0}")]
    Missing(&'static str),

    #[error("negative study hours for {day}: {hours}")]
    NegativeHours { day: String, hours: f64 },
}

/// Plan as the model may return it, before completeness checks
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PartialPlan {
    overview: Option<String>,
    weekly_plan: Option<Vec<DailyPlan>>,
    focus_tips: Option<Vec<String>>,
    burnout_warnings: Option<Vec<String>>,
    motivation: Option<String>,
}

impl StudyPlanResponse {
    /// Parse the arguments string of a `generate_study_plan` tool call
    ///
    /// `overview`, `weeklyPlan`, `focusTips` and `motivation` must be present
    /// and non-empty. A missing `burnoutWarnings` means no warnings.
    pub fn from_tool_arguments(arguments: &str) -> Result<Self, PlanError> {
        debug!(arguments_len = arguments.len(), "StudyPlanResponse::from_tool_arguments: called");
        let partial: PartialPlan = serde_json::from_str(arguments)?;

        let overview = partial
            .overview
            .filter(|s| !s.trim().is_empty())
            .ok_or(PlanError::Missing("overview"))?;
        let weekly_plan = partial
            .weekly_plan
            .filter(|days| !days.is_empty())
            .ok_or(PlanError::Missing("weeklyPlan"))?;
        let focus_tips = partial
            .focus_tips
            .filter(|tips| !tips.is_empty())
            .ok_or(PlanError::Missing("focusTips"))?;
        let motivation = partial
            .motivation
            .filter(|s| !s.trim().is_empty())
            .ok_or(PlanError::Missing("motivation"))?;

        if let Some(day) = weekly_plan.iter().find(|d| d.study_hours < 0.0) {
            return Err(PlanError::NegativeHours {
                day: day.day.clone(),
                hours: day.study_hours,
            });
        }

        Ok(Self {
            overview,
            weekly_plan,
            focus_tips,
            burnout_warnings: partial.burnout_warnings.unwrap_or_default(),
            motivation,
        })
    }
}

//! Study plan input
//!
//! Requests arrive as a lenient [`PlanRequest`] (every field optional) and are
//! validated into an immutable [`StudyPlanInput`] before anything is sent
//! upstream.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Hours per day used when the request leaves it out
pub const DEFAULT_HOURS_PER_DAY: u8 = 4;

/// Lowest accepted hours per day
pub const MIN_HOURS_PER_DAY: u8 = 1;

/// Highest accepted hours per day
pub const MAX_HOURS_PER_DAY: u8 = 12;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Input validation failures, reported to the caller as HTTP 400
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: subjects and examDate")]
    MissingFields,

    #[error("Invalid examDate '{0}': expected YYYY-MM-DD")]
    InvalidExamDate(String),

    #[error("hoursPerDay must be a whole number between 1 and 12, got {0}")]
    InvalidHours(f64),

    #[error("stressLevel must be one of low, medium, high, got '{0}'")]
    UnknownStressLevel(String),
}

/// How stressed the student reports feeling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StressLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(StressLevel::Low),
            "medium" => Ok(StressLevel::Medium),
            "high" => Ok(StressLevel::High),
            _ => Err(ValidationError::UnknownStressLevel(s.to_string())),
        }
    }
}

/// Request body as sent by clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_per_day: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weak_subjects: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
}

impl PlanRequest {
    /// Validate into a [`StudyPlanInput`]
    ///
    /// Subjects are trimmed, blank entries dropped and duplicates collapsed
    /// keeping the first occurrence. Weak subjects that are not among the
    /// subjects are dropped.
    pub fn validate(&self) -> Result<StudyPlanInput, ValidationError> {
        debug!(?self, "PlanRequest::validate: called");
        let subjects = distinct_trimmed(self.subjects.as_deref().unwrap_or_default());
        let exam_date = self.exam_date.as_deref().map(str::trim).unwrap_or_default();

        if subjects.is_empty() || exam_date.is_empty() {
            debug!("PlanRequest::validate: missing subjects or examDate");
            return Err(ValidationError::MissingFields);
        }

        let exam_at =
            parse_exam_date(exam_date).ok_or_else(|| ValidationError::InvalidExamDate(exam_date.to_string()))?;

        let hours_per_day = match self.hours_per_day {
            None => DEFAULT_HOURS_PER_DAY,
            Some(h) => whole_hours(h).ok_or(ValidationError::InvalidHours(h))?,
        };

        let stress_level = match self.stress_level.as_deref() {
            None => StressLevel::default(),
            Some(s) => s.parse()?,
        };

        let mut weak_subjects = Vec::new();
        for weak in distinct_trimmed(self.weak_subjects.as_deref().unwrap_or_default()) {
            if subjects.contains(&weak) {
                weak_subjects.push(weak);
            } else {
                warn!(subject = %weak, "Dropping weak subject that is not in the subject list");
            }
        }

        Ok(StudyPlanInput {
            subjects,
            exam_date: exam_date.to_string(),
            exam_at,
            hours_per_day,
            weak_subjects,
            stress_level,
        })
    }
}

/// Validated input for one plan request
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlanInput {
    pub subjects: Vec<String>,
    /// Exam date as the student entered it
    pub exam_date: String,
    /// Exam date as an instant; plain dates are UTC midnight
    pub exam_at: DateTime<Utc>,
    pub hours_per_day: u8,
    pub weak_subjects: Vec<String>,
    pub stress_level: StressLevel,
}

impl StudyPlanInput {
    /// Whole days from `now` until the exam, rounded up; negative once it has passed
    pub fn days_until_exam(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.exam_at, now)
    }

    /// Convert back to the wire form, e.g. for the client to send
    pub fn to_request(&self) -> PlanRequest {
        PlanRequest {
            subjects: Some(self.subjects.clone()),
            exam_date: Some(self.exam_date.clone()),
            hours_per_day: Some(f64::from(self.hours_per_day)),
            weak_subjects: Some(self.weak_subjects.clone()),
            stress_level: Some(self.stress_level.as_str().to_string()),
        }
    }
}

/// Ceiling of the day difference between two instants
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (target - now).num_milliseconds() as f64;
    (ms / MS_PER_DAY).ceil() as i64
}

/// Accepts `YYYY-MM-DD` (UTC midnight) or a full RFC 3339 timestamp
pub fn parse_exam_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

fn whole_hours(h: f64) -> Option<u8> {
    let in_range = (f64::from(MIN_HOURS_PER_DAY)..=f64::from(MAX_HOURS_PER_DAY)).contains(&h);
    if in_range && h.fract() == 0.0 { Some(h as u8) } else { None }
}

fn distinct_trimmed(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

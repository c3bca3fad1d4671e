//! Canned plan returned whenever generation fails

use super::plan::{DailyPlan, StudyPlanResponse};

pub const FALLBACK_OVERVIEW: &str = "We encountered an issue generating your personalized plan. Here's a general study strategy to get you started.";

pub const FALLBACK_MOTIVATION: &str = "You've got this! Every hour of focused study brings you closer to your goals. Believe in yourself and stay consistent.";

impl StudyPlanResponse {
    /// The generic seven-day plan served in place of a failed generation
    pub fn fallback() -> Self {
        Self {
            overview: FALLBACK_OVERVIEW.to_string(),
            weekly_plan: vec![
                DailyPlan::new("Monday", &["Review notes from all subjects", "Create study flashcards"], 4.0),
                DailyPlan::new("Tuesday", &["Focus on weak subjects", "Practice problems"], 4.0),
                DailyPlan::new("Wednesday", &["Active recall session", "Group study if possible"], 4.0),
                DailyPlan::new("Thursday", &["Review difficult concepts", "Take practice tests"], 4.0),
                DailyPlan::new("Friday", &["Light review", "Organize materials"], 3.0),
                DailyPlan::new("Saturday", &["Mock exam practice", "Review mistakes"], 4.0),
                DailyPlan::new("Sunday", &["Rest and light review", "Plan next week"], 2.0),
            ],
            focus_tips: vec![
                "Use the Pomodoro Technique: 25 minutes of focused work, then a 5-minute break".to_string(),
                "Study in a quiet, well-lit environment".to_string(),
                "Stay hydrated and take short walks between sessions".to_string(),
                "Review material before bed for better retention".to_string(),
            ],
            burnout_warnings: vec![
                "Remember to take regular breaks to avoid mental fatigue".to_string(),
                "Don't sacrifice sleep for extra study time".to_string(),
            ],
            motivation: FALLBACK_MOTIVATION.to_string(),
        }
    }
}

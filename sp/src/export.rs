//! Plain-text export of a study plan
//!
//! The same text block backs copy, download and share.

use std::path::Path;

use eyre::{Context, Result};
use tracing::debug;

use crate::domain::StudyPlanResponse;

/// File name used when downloading a plan
pub const DEFAULT_EXPORT_FILE: &str = "my-study-plan.txt";

const TITLE_RULE_WIDTH: usize = 40;
const SECTION_RULE_WIDTH: usize = 30;

/// Render a plan as a plain-text block
pub fn render_text(plan: &StudyPlanResponse) -> String {
    debug!(days = plan.weekly_plan.len(), "render_text: called");
    let section_rule = "-".repeat(SECTION_RULE_WIDTH);

    let mut out = format!("📚 MY STUDY PLAN\n{}\n\n", "=".repeat(TITLE_RULE_WIDTH));
    out.push_str(&format!("📝 Overview:\n{}\n\n", plan.overview));

    out.push_str(&format!("📅 Weekly Schedule:\n{}\n", section_rule));
    for day in &plan.weekly_plan {
        out.push_str(&format!("\n{} ({}h):\n", day.day, day.study_hours));
        for task in &day.tasks {
            out.push_str(&format!("  • {}\n", task));
        }
    }

    out.push_str(&format!("\n💡 Focus Tips:\n{}\n", section_rule));
    for tip in &plan.focus_tips {
        out.push_str(&format!("  ✓ {}\n", tip));
    }

    if !plan.burnout_warnings.is_empty() {
        out.push_str(&format!("\n⚠️ Burnout Warnings:\n{}\n", section_rule));
        for warning in &plan.burnout_warnings {
            out.push_str(&format!("  ! {}\n", warning));
        }
    }

    out.push_str(&format!("\n💪 Motivation:\n{}\n{}\n", section_rule, plan.motivation));
    out
}

/// Write the plain-text rendering to `path`
pub fn write_text(plan: &StudyPlanResponse, path: &Path) -> Result<()> {
    debug!(?path, "write_text: called");
    std::fs::write(path, render_text(plan)).context(format!("Failed to write plan to {}", path.display()))
}

//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::StudyPlanInput;

/// Shown in place of an empty weak-subject list
const NO_WEAK_SUBJECTS: &str = "None specified";

/// Variables available to the prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Subjects joined with ", "
    pub subjects: String,
    /// Weak subjects joined with ", ", or "None specified"
    pub weak_subjects: String,
    /// Exam date as entered
    pub exam_date: String,
    pub days_until_exam: i64,
    pub hours_per_day: u8,
    pub stress_level: String,
    /// Name of the function the model must call
    pub tool_name: String,
}

impl PromptContext {
    pub fn new(input: &StudyPlanInput, now: DateTime<Utc>, tool_name: &str) -> Self {
        debug!(subjects = input.subjects.len(), "PromptContext::new: called");
        let weak_subjects = if input.weak_subjects.is_empty() {
            NO_WEAK_SUBJECTS.to_string()
        } else {
            input.weak_subjects.join(", ")
        };

        Self {
            subjects: input.subjects.join(", "),
            weak_subjects,
            exam_date: input.exam_date.clone(),
            days_until_exam: input.days_until_exam(now),
            hours_per_day: input.hours_per_day,
            stress_level: input.stress_level.to_string(),
            tool_name: tool_name.to_string(),
        }
    }

    /// Placeholder values used to check that templates render
    fn sample() -> Self {
        Self {
            subjects: "Math, Physics".to_string(),
            weak_subjects: "Physics".to_string(),
            exam_date: "2099-01-01".to_string(),
            days_until_exam: 30,
            hours_per_day: 4,
            stress_level: "medium".to_string(),
            tool_name: "generate_study_plan".to_string(),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory from config
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates from `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = override_dir.and_then(|dir| {
            if dir.is_dir() {
                info!("Using prompt overrides from {}", dir.display());
                Some(dir.to_path_buf())
            } else {
                tracing::warn!("Prompt directory {} not found, using embedded prompts", dir.display());
                None
            }
        });

        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks `{override_dir}/{name}.pmt` first, then the embedded copy.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        let rendered = self
            .hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))?;
        Ok(rendered.trim_end().to_string())
    }

    /// Render every known template once with sample values
    ///
    /// Lets the server refuse to start on a broken override instead of
    /// serving the fallback plan for every request.
    pub fn check(&self) -> Result<()> {
        let sample = PromptContext::sample();
        for name in embedded::NAMES {
            self.render(name, &sample)?;
        }
        Ok(())
    }
}

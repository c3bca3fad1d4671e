//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use eyre::{Result, eyre};
use tracing::debug;

use crate::domain::{PlanRequest, StressLevel, StudyPlanInput};
use crate::export::DEFAULT_EXPORT_FILE;

/// studyplan - weekly study plans from a hosted LLM
#[derive(Parser)]
#[command(name = "sp", about = "Generate weekly study plans with a hosted LLM", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the plan-generation HTTP endpoint
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Request a study plan from a running service
    Plan(PlanArgs),

    /// Render a saved plan (JSON) as plain text
    Render {
        /// Plan JSON file, as returned by the service
        file: PathBuf,

        /// Also write the text to a file (default: my-study-plan.txt)
        #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE)]
        output: Option<PathBuf>,
    },
}

/// Stress level as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StressArg {
    Low,
    Medium,
    High,
}

impl From<StressArg> for StressLevel {
    fn from(arg: StressArg) -> Self {
        match arg {
            StressArg::Low => StressLevel::Low,
            StressArg::Medium => StressLevel::Medium,
            StressArg::High => StressLevel::High,
        }
    }
}

/// Inputs for `sp plan`
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Subject to study (repeat for several)
    #[arg(short = 's', long = "subject", value_name = "SUBJECT")]
    pub subjects: Vec<String>,

    /// Mark a listed subject as weak (repeat for several)
    #[arg(short = 'w', long = "weak", value_name = "SUBJECT")]
    pub weak: Vec<String>,

    /// Exam date (YYYY-MM-DD)
    #[arg(short = 'd', long)]
    pub exam_date: Option<String>,

    /// Study hours per day
    #[arg(short = 'H', long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub hours: u8,

    /// Current stress level
    #[arg(long, value_enum, default_value_t = StressArg::Medium)]
    pub stress: StressArg,

    /// Print the raw JSON response instead of text
    #[arg(long)]
    pub json: bool,

    /// Also write the text to a file (default: my-study-plan.txt)
    #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    /// Validate before anything is sent
    ///
    /// Nothing is submitted until there is at least one subject and a date
    /// that is not in the past, and every weak subject must be one of the
    /// listed subjects.
    pub fn to_input(&self) -> Result<StudyPlanInput> {
        self.to_input_on(Utc::now().date_naive())
    }

    /// [`PlanArgs::to_input`] with "today" (UTC) supplied by the caller
    pub fn to_input_on(&self, today: NaiveDate) -> Result<StudyPlanInput> {
        debug!(?self, %today, "PlanArgs::to_input_on: called");
        let subjects: Vec<&str> = self.subjects.iter().map(|s| s.trim()).collect();
        if let Some(unknown) = self.weak.iter().find(|w| !subjects.contains(&w.trim())) {
            return Err(eyre!("Weak subject '{}' is not in the subject list", unknown));
        }

        let request = PlanRequest {
            subjects: Some(self.subjects.clone()),
            exam_date: self.exam_date.clone(),
            hours_per_day: Some(f64::from(self.hours)),
            weak_subjects: Some(self.weak.clone()),
            stress_level: Some(StressLevel::from(self.stress).as_str().to_string()),
        };
        let input = request.validate()?;
        if input.exam_at.date_naive() < today {
            return Err(eyre!("Exam date {} is in the past", input.exam_date));
        }
        Ok(input)
    }
}

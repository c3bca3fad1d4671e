//! studyplan - weekly study plans from a hosted LLM
//!
//! CLI entry point for serving the endpoint and requesting plans.

use std::fs;
use std::path::Path;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use studyplan::cli::{Cli, Command, PlanArgs};
use studyplan::client::PlanClient;
use studyplan::config::Config;
use studyplan::domain::StudyPlanResponse;
use studyplan::export::{render_text, write_text};
use studyplan::llm::create_client;
use studyplan::planner::StudyPlanService;
use studyplan::prompts::PromptLoader;
use studyplan::server::{self, AppState};

fn setup_logging(
    cli_log_level: Option<&str>,
    config_log_level: Option<&str>,
    default_level: tracing::Level,
) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    // Determine log level with priority: CLI --log-level > config file > per-command default
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to {}", s, default_level);
                default_level
            }
        },
        None => default_level,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized at level {}", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The server logs requests; client commands stay quiet unless asked
    let default_level = match cli.command {
        Command::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), default_level)
        .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve { bind } => cmd_serve(config, bind).await,
        Command::Plan(args) => cmd_plan(&config, &args).await,
        Command::Render { file, output } => cmd_render(&file, output.as_deref()),
    }
}

async fn cmd_serve(config: Config, bind: Option<String>) -> Result<()> {
    debug!(?bind, "cmd_serve: called");
    let mut server_config = config.server.clone();
    if let Some(bind) = bind {
        server_config.bind = bind;
    }

    let gateway = config.gateway.resolve()?;
    info!(model = %gateway.model, base_url = %gateway.base_url, "Gateway configured");
    let llm = create_client(&gateway).context("Failed to create gateway client")?;

    let prompts = PromptLoader::new(config.prompts.dir.as_deref());
    prompts.check().context("Prompt templates failed to render")?;

    let auth_token = server_config.auth_token();
    if let (Some(name), None) = (&server_config.auth_token_env, &auth_token) {
        warn!("{} is not set; the endpoint will accept unauthenticated requests", name);
    }

    let state = AppState::new(StudyPlanService::new(llm, prompts), auth_token);
    server::run(&server_config, state).await
}

async fn cmd_plan(config: &Config, args: &PlanArgs) -> Result<()> {
    debug!(?args, "cmd_plan: called");
    let input = args.to_input()?;
    let client = PlanClient::from_config(config);

    eprintln!("{} Generating study plan via {}", "→".cyan(), client.endpoint());
    let plan = client
        .request_plan(&input)
        .await
        .map_err(|e| eyre!("Something went wrong: {}", e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_text(&plan));
    }

    if let Some(path) = &args.output {
        write_text(&plan, path)?;
        eprintln!("{} Saved plan to {}", "✓".green(), path.display());
    }

    eprintln!("{} Study Plan Ready! Your personalized study plan has been created.", "✓".green());
    Ok(())
}

fn cmd_render(file: &Path, output: Option<&Path>) -> Result<()> {
    debug!(?file, ?output, "cmd_render: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let plan: StudyPlanResponse =
        serde_json::from_str(&content).context(format!("Failed to parse plan JSON in {}", file.display()))?;

    print!("{}", render_text(&plan));

    if let Some(path) = output {
        write_text(&plan, path)?;
        eprintln!("{} Saved plan to {}", "✓".green(), path.display());
    }
    Ok(())
}

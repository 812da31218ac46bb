use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use revu_core::config::AppConfig;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_engine::{Engine, Outcome};
use revu_llm::StubClient;

#[derive(Parser)]
#[command(name = "revu", version, about = "Multi-agent code review orchestrator")]
struct Cli {
    /// Path to config file (default: revu.toml, built-in defaults if absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single task and print the final state
    Run {
        /// The task description
        #[arg(trailing_var_arg = true)]
        task: Vec<String>,

        /// Read the task description from a file instead
        #[arg(short, long, conflicts_with = "task")]
        file: Option<PathBuf>,

        /// Use the deterministic stub backend instead of a real model
        #[arg(long)]
        offline: bool,

        /// Print the full run trace even on success
        #[arg(long)]
        trace: bool,
    },
    /// Show the effective configuration
    Config,
}

const DEFAULT_CONFIG_PATH: &str = "revu.toml";

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Ok(AppConfig::load(&default)?)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

fn build_client(config: &AppConfig, offline: bool) -> Arc<dyn InferenceClient> {
    if offline {
        Arc::new(StubClient::new())
    } else {
        Arc::from(revu_llm::create_client(&config.models.heavy))
    }
}

fn read_task(task: Vec<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    let text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read task from {}", path.display()))?,
        None => task.join(" "),
    };
    anyhow::ensure!(!text.trim().is_empty(), "no task description given");
    Ok(text)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            task,
            file,
            offline,
            trace,
        } => {
            let task_text = read_task(task, file)?;
            let client = build_client(&config, offline);
            let engine = Engine::new(config, client);

            let report = engine.run(TaskState::new(task_text)).await;

            // Final state goes to stdout; diagnostics to stderr
            println!("{}", serde_json::to_string_pretty(&report.state)?);

            match report.outcome {
                Outcome::Terminated => {
                    info!(steps = report.steps, "Task terminated");
                    if trace {
                        eprintln!("{}", report.trace.render());
                    }
                    Ok(())
                }
                Outcome::Failed { error } => {
                    eprintln!("task failed: {error}");
                    eprintln!("{}", report.trace.render());
                    std::process::exit(1);
                }
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use otto_api::AppState;
use otto_skill::{AppConfig, SkillContext, SkillRegistry};

mod commands;

#[derive(Parser)]
#[command(name = "otto")]
#[command(about = "Otto - persistent AI agent", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./otto_config.yaml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a tree listing of the default repository
    RunSample,
    /// Audit a repository and write an advisory report
    Audit {
        /// Repository to audit (defaults to storage.default_repo_root)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
    /// Run every skill's self-test
    Health,
    /// Run a single task
    Run {
        #[arg(short = 't', long = "type")]
        task_type: String,
        /// JSON object passed as the task payload
        #[arg(short, long)]
        payload: Option<String>,
    },
    /// List registered skills
    Skills,
    /// Start the HTTP API
    Server {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value = "8001")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Arc::new(AppConfig::load(cli.config.as_deref())?);
    let registry = otto_skills::default_registry(&config)?;
    let ctx = SkillContext::new(Arc::clone(&config));

    let ok = match cli.command {
        Commands::RunSample => commands::run_sample(&registry, &ctx).await,
        Commands::Audit { target } => commands::audit(&registry, &ctx, target).await,
        Commands::Health => commands::health(&registry, &ctx).await,
        Commands::Run { task_type, payload } => {
            let payload = payload
                .as_deref()
                .map(commands::parse_payload)
                .transpose()?
                .unwrap_or_default();
            commands::run(&registry, &ctx, task_type, payload).await
        }
        Commands::Skills => {
            commands::list_skills(&registry);
            true
        }
        Commands::Server { host, port } => {
            serve(registry, ctx, &host, port).await?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn serve(registry: SkillRegistry, ctx: SkillContext, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("no address for {}:{}", host, port))?;

    info!("🚀 Starting Otto API server on {}", addr);
    otto_api::serve(addr, AppState::new(registry, ctx)).await?;
    Ok(())
}

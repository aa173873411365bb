//! GreenThumb background agent.
//!
//! Subcommands:
//! - `run`: schedule the weather sweep and seed sync until signalled
//! - `sweep`: run one guarded weather sweep and exit
//! - `check`: verify the database and Redis are reachable

use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod agent;
mod config;
mod env_file;
mod seed;
mod shutdown;

use config::{AgentArgs, AgentConfig};
use env_file::{ENV_FILE, EnvFile};

const DEFAULT_LOG_FILTER: &str = "greenthumb=info,greenthumb_lock=info,greenthumb_scheduler=info,\
greenthumb_store=info,greenthumb_weather=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Parser)]
#[command(name = "greenthumb")]
#[command(about = "GreenThumb background agent", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(
        long,
        global = true,
        env = "GREENTHUMB_LOG_FORMAT",
        value_enum,
        default_value = "pretty"
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until SIGINT or SIGTERM
    Run(AgentArgs),

    /// Run one weather sweep now, under the same lock as scheduled runs
    Sweep(AgentArgs),

    /// Check database and Redis connectivity
    Check(AgentArgs),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so the file can supply any `env` argument.
    let loaded_env = env_file::load(Path::new(ENV_FILE));
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match loaded_env {
        Ok(EnvFile::Loaded) => debug!(path = ENV_FILE, "loaded environment file"),
        Ok(EnvFile::Missing) => {}
        Err(e) => return Err(miette!("failed to load {}: {}", ENV_FILE, e)),
    }

    match cli.command {
        Commands::Run(args) => agent::run(AgentConfig::try_from(args).into_diagnostic()?).await,
        Commands::Sweep(args) => agent::sweep(AgentConfig::try_from(args).into_diagnostic()?).await,
        Commands::Check(args) => agent::check(AgentConfig::try_from(args).into_diagnostic()?).await,
    }
}

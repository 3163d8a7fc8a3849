//! synth - legacy synth round database migration
//!
//! Rebuilds the unified analysis database from the four legacy synth round
//! databases. See `synth --help`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synth_common::config::{resolve_config_path, SynthConfig};
use synth_etl::{etl_steps, Pipeline};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for synth
#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "Migrate the legacy synth round databases into the analysis schema")]
#[command(version)]
struct Args {
    /// Config file (falls back to SYNTH_CONFIG, then ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate the analysis schema, then load it
    Rebuild {
        /// Only recreate the schema, leaving every table empty
        #[arg(long)]
        without_data: bool,
    },
    /// List the steps a rebuild would run, in order
    Steps {
        #[arg(long)]
        without_data: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Steps { without_data } => {
            for (index, step) in etl_steps(!without_data).iter().enumerate() {
                println!("{:>2}. {}", index + 1, step.message());
            }
            Ok(())
        }
        Command::Rebuild { without_data } => {
            let config_path = resolve_config_path(args.config.as_deref());
            let config = SynthConfig::load(&config_path)
                .with_context(|| format!("Failed to load config {}", config_path.display()))?;

            init_tracing(&config.logging.level);
            info!(
                "Starting synth v{} [{}] built {} ({})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_HASH"),
                env!("BUILD_TIMESTAMP"),
                env!("BUILD_PROFILE")
            );
            info!("Config: {}", config_path.display());
            info!("Target: {}", config.target);

            let pipeline = Pipeline::from_config(&config).context("Failed to prepare pipeline")?;

            match pipeline.rebuild(!without_data).await {
                Ok(summary) => {
                    for report in &summary.steps {
                        info!("  {:<40} {:.2?}", report.description, report.elapsed);
                    }
                    Ok(())
                }
                Err(e) => {
                    error!("Rebuild aborted: {}", e);
                    Err(e.into())
                }
            }
        }
    }
}

/// Initialize tracing; RUST_LOG overrides the configured level
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

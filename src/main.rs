use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod cli;
mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "bluesweep")]
#[command(about = "Bluetooth exploit campaign orchestrator")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.bluesweep/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = bluesweep::config::Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            target,
            include,
            exclude,
            hardware,
            parameters,
        } => {
            cli::run::run_command(&config, &target, include, exclude, hardware, parameters)
                .await?;
        }
        Commands::Resume { target } => {
            cli::run::resume_command(&config, &target).await?;
        }
        Commands::ListExploits => {
            cli::list::list_command(&config)?;
        }
        Commands::CheckSetup => {
            cli::setup::setup_command(&config)?;
        }
        Commands::CheckTarget { target } => {
            cli::target::check_target_command(&config, &target).await?;
        }
        Commands::Recon { target } => {
            cli::recon::recon_command(&config, &target).await?;
        }
        Commands::Report { target, json } => {
            cli::report::report_command(&config, &target, json)?;
        }
    }

    Ok(())
}

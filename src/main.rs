//! Carimbo Proxy - runtime and bundle caching proxy
//!
//! CLI entry point that dispatches to subcommands.

use carimbo_proxy::cli::{Cli, Commands, LogFormat};
use carimbo_proxy::config::ConfigManager;
use carimbo_proxy::error::ProxyResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ProxyResult<()> {
    let cli = Cli::parse();

    // Completions don't need config or logging
    if let Some(Commands::Completions(args)) = cli.command {
        carimbo_proxy::cli::commands::completions(args);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // RUST_LOG wins; otherwise 0 = info, 1 = debug, 2+ = trace
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("carimbo_proxy=info"),
        1 => EnvFilter::new("carimbo_proxy=debug"),
        _ => EnvFilter::new("carimbo_proxy=trace"),
    });
    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }

    match cli.into_command() {
        Commands::Serve(args) => carimbo_proxy::cli::commands::serve(args, &config).await,
        Commands::Config(args) => {
            carimbo_proxy::cli::commands::config(args, &config_manager, &config).await
        }
        Commands::Completions(_) => unreachable!("Completions handled above"),
    }
}

//! rescache - Dependency-keyed store cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rescache::cli::{commands, Cli, Commands};
use rescache::config::ConfigManager;
use rescache::error::RescacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let label = if e.is_fatal() { "Fatal:" } else { "Error:" };
            eprintln!("{} {}", style(label).red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> RescacheResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions { shell } = cli.command {
        commands::completions(shell);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    rescache::ui::init_theme();
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Graph(args) => commands::graph(args),
        Commands::Resolve(args) => commands::resolve(args, &config),
        Commands::Workspaces(args) => commands::workspaces(args, &config),
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug. `RUST_LOG` wins when set.
fn init_logging(verbose: u8, log_format: &str) {
    let default = match verbose {
        0 => "rescache=warn",
        1 => "rescache=info",
        _ => "rescache=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

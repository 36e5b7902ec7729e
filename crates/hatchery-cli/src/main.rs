//! Hatchery CLI - plugin directory host.
//!
//! Loads the layered configuration, sets up logging, registers the built-in
//! loaders and runs one command against the configured plugin directory.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hatchery_config::{Config, ResolvedConfig};

mod commands;
mod config_bridge;
mod theme;

use commands::{config, loaders, scan};

/// Hatchery - load plugins from a directory by file extension
#[derive(Parser)]
#[command(name = "hatchery")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the layered lookup
    #[arg(short, long, global = true, env = "HATCHERY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every plugin in the plugin directory and report the outcome
    Scan {
        /// Directory to scan (defaults to `plugins.directory`)
        dir: Option<PathBuf>,
    },

    /// List registered loaders and the extensions they serve
    Loaders,

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Show config file paths being checked
    Paths,
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ResolvedConfig> {
    match explicit {
        Some(path) => {
            let config = Config::load_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Ok(ResolvedConfig::from_single_file(config, path.display().to_string()))
        },
        None => Config::load(Some(cwd)).context("failed to load configuration"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config {
        command: ConfigCommands::Paths,
    } = cli.command
    {
        config::show_paths();
        return Ok(());
    }

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let resolved = load_config(cli.config.as_deref(), &cwd)?;

    let mut log_config = config_bridge::to_log_config(&resolved.config, &cwd);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = hatchery_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Scan { dir } => scan::run_scan(&resolved.config, &cwd, dir),
        Commands::Loaders => loaders::list_loaders(&resolved.config, &cwd),
        Commands::Config {
            command: ConfigCommands::Show { format },
        } => config::show_config(&resolved, &format),
        Commands::Config {
            command: ConfigCommands::Paths,
        } => {
            config::show_paths();
            Ok(())
        },
    }
}

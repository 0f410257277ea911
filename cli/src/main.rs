// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # kinswarm CLI
//!
//! The `kinswarm` binary forms agent teams, dry-runs them and validates
//! routing plans against the configured agent roster.
//!
//! ## Commands
//!
//! - `kinswarm team generate|business|execute` - Team formation and dispatch
//! - `kinswarm plan validate FILE` - Plan validation and quality scoring
//! - `kinswarm config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use kinswarm_cli::commands::{self, ConfigCommand, PlanCommand, TeamCommand};
use kinswarm_core::domain::swarm_config::SwarmConfigManifest;

/// kinswarm - kin-selection team formation for agent swarms
#[derive(Parser)]
#[command(name = "kinswarm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "KINSWARM_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "KINSWARM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Team formation and dispatch
    #[command(name = "team")]
    Team {
        #[command(subcommand)]
        command: TeamCommand,
    },

    /// Routing plan validation
    #[command(name = "plan")]
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SwarmConfigManifest::load_or_default(cli.config.clone()).ok();
    init_logging(&resolve_log_level(cli.log_level.clone(), config.as_ref()))?;

    match cli.command {
        Some(Commands::Team { command }) => {
            commands::team::handle_command(command, cli.config).await
        }
        Some(Commands::Plan { command }) => {
            commands::plan::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// `--log-level` / `KINSWARM_LOG_LEVEL`, then `spec.observability.log_level`.
/// `RUST_LOG` still wins over both in `init_logging`.
fn resolve_log_level(flag: Option<String>, config: Option<&SwarmConfigManifest>) -> String {
    flag.or_else(|| config.map(|c| c.spec.observability.log_level.clone()))
        .unwrap_or_else(|| "info".to_string())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

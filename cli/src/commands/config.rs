// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use kinswarm_core::domain::swarm_config::SwarmConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with the built-in defaults
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./kinswarm-config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, force } => generate(output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. KINSWARM_CONFIG_PATH: {}",
            std::env::var("KINSWARM_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./kinswarm-config.yaml");
        println!("  4. ~/.kinswarm/config.yaml");
        println!("  5. /etc/kinswarm/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Agents:".bold());
    for agent in config.agents() {
        let capabilities: Vec<&str> = agent.capabilities().iter().map(String::as_str).collect();
        println!(
            "  {} ({}, {}) [{}]",
            agent.name().bold(),
            agent.role(),
            agent.genotype(),
            capabilities.join(", ")
        );
    }
    println!();

    let optimizer = &config.spec.optimizer;
    println!("{}", "Optimizer:".bold());
    println!("  Particles: {}", optimizer.n_particles);
    println!("  Iterations: {}", optimizer.max_iterations);
    println!(
        "  w / c1 / c2: {} / {} / {}",
        optimizer.inertia, optimizer.cognitive, optimizer.social
    );
    println!();

    let coordinator = &config.spec.coordinator;
    println!("{}", "Coordinator:".bold());
    println!("  Base seed: {}", coordinator.base_seed);
    println!("  Max retries: {}", coordinator.max_retries);
    println!("  Execution timeout: {}s", coordinator.execution_timeout_secs);
    println!("  Performance smoothing: {}", coordinator.performance_smoothing);
    println!("  Evolve threshold: {}", coordinator.evolve_threshold);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    SwarmConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Team formation commands
//!
//! Commands: generate, business, execute

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use kinswarm_core::application::CapabilityRouter;
use kinswarm_core::domain::execution::{MemberStatus, TeamExecutionResult, TeamExecutionStatus};
use kinswarm_core::domain::swarm_config::SwarmConfigManifest;
use kinswarm_core::domain::task::{Task, PRIORITY_KEY, SECURITY_LEVEL_KEY};
use kinswarm_swarm::application::{CapabilityCoverageValidator, SwarmCoordinator};

use crate::dry_run::DryRunExecutor;

#[derive(Subcommand)]
pub enum TeamCommand {
    /// Generate an optimal team for a task
    Generate {
        #[command(flatten)]
        task: TaskArgs,

        /// Print the team as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a team for a business type
    Business {
        /// Business type (ecommerce, saas, content, marketplace, consulting, ...)
        #[arg(value_name = "TYPE")]
        business_type: String,

        /// Complexity (simple, medium, complex)
        #[arg(short = 'x', long, default_value = "medium")]
        complexity: String,

        /// Print the team as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a team (or use --member) and dry-run it
    Execute {
        #[command(flatten)]
        task: TaskArgs,

        /// Explicit team member; repeat to skip generation
        #[arg(short, long = "member", value_name = "AGENT")]
        members: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TaskArgs {
    /// Task description; capabilities are inferred from it unless given
    #[arg(short, long)]
    pub description: String,

    /// Task identifier
    #[arg(long, default_value = "cli-task")]
    pub task_id: String,

    /// Task type
    #[arg(long, default_value = "general")]
    pub task_type: String,

    /// Team size
    #[arg(short, long, default_value = "3")]
    pub size: usize,

    /// Required capability; repeat for several
    #[arg(long = "capability", value_name = "CAPABILITY")]
    pub capabilities: Vec<String>,

    /// Task priority
    #[arg(long, default_value = "1.0")]
    pub priority: f64,

    /// Required security level
    #[arg(long, default_value = "standard")]
    pub security_level: String,

    /// PSO attempts before falling back (default: from configuration)
    #[arg(long)]
    pub retries: Option<u32>,
}

impl TaskArgs {
    pub fn to_task(&self) -> Task {
        Task::new(&self.task_id, &self.task_type, &self.description)
            .with_metadata(PRIORITY_KEY, json!(self.priority))
            .with_metadata(SECURITY_LEVEL_KEY, json!(self.security_level))
    }

    fn capability_override(&self) -> Option<Vec<String>> {
        (!self.capabilities.is_empty()).then(|| self.capabilities.clone())
    }
}

pub async fn handle_command(command: TeamCommand, config_path: Option<PathBuf>) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let coordinator = build_coordinator(&config)?;

    match command {
        TeamCommand::Generate { task, json } => {
            let team = generate(&coordinator, &task)?;
            print_team(&coordinator, &team, json)
        }
        TeamCommand::Business { business_type, complexity, json } => {
            let team = coordinator
                .spawn_dynamic_team_for_business(&business_type, &complexity)
                .context("Failed to generate business team")?;
            print_team(&coordinator, &team, json)
        }
        TeamCommand::Execute { task, members, json } => {
            let team = if members.is_empty() { generate(&coordinator, &task)? } else { members };
            info!(team = ?team, "Dispatching team in dry-run mode");
            let result = coordinator
                .execute_team_task(&task.to_task(), &team)
                .await
                .context("Failed to execute team")?;
            print_execution(&result, json)
        }
    }
}

/// Coordinator over the configured roster, validated by capability coverage
/// and dispatched to the dry-run worker.
pub fn build_coordinator(config: &SwarmConfigManifest) -> Result<SwarmCoordinator> {
    let registry = config.agent_registry().context("Invalid agent roster")?;
    let validator = CapabilityCoverageValidator::new(registry);
    let router = CapabilityRouter::new(config.spec.capabilities.clone());

    let coordinator =
        SwarmCoordinator::from_manifest(config, Arc::new(validator), Arc::new(DryRunExecutor))
            .context("Failed to build coordinator")?
            .with_router(Arc::new(router));
    Ok(coordinator)
}

fn generate(coordinator: &SwarmCoordinator, args: &TaskArgs) -> Result<Vec<String>> {
    let retries = args.retries.unwrap_or(coordinator.config().coordinator.max_retries);
    coordinator
        .generate_optimal_team(&args.to_task(), args.size, args.capability_override(), retries)
        .context("Failed to generate team")
}

fn print_team(coordinator: &SwarmCoordinator, team: &[String], as_json: bool) -> Result<()> {
    let report = coordinator.get_team_performance_history(team);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "team": team, "report": report }))?);
        return Ok(());
    }

    println!("{}", "Team:".bold());
    for name in team {
        match coordinator.registry().get(name) {
            Some(agent) => println!(
                "  {} ({}, {})",
                agent.name().bold(),
                agent.role(),
                agent.genotype()
            ),
            None => println!("  {}", name.bold()),
        }
    }
    println!();
    println!("  Diversity: {:.2}", report.diversity);
    println!("  Cooperation: {:.2}", report.cooperation);
    Ok(())
}

fn print_execution(result: &TeamExecutionResult, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let status = match result.status {
        TeamExecutionStatus::Completed => result.status.as_str().green(),
        TeamExecutionStatus::Partial => result.status.as_str().yellow(),
        TeamExecutionStatus::Failed | TeamExecutionStatus::Timeout => result.status.as_str().red(),
    };
    println!("{} {}", "Execution:".bold(), result.execution_id);
    println!("  Task: {}", result.task_id);
    println!("  Status: {}", status);
    println!("  Elapsed: {:?}", result.elapsed);
    if let Some(error) = &result.error {
        println!("  Error: {}", error.red());
    }

    for (member, member_result) in &result.results {
        let mark = match member_result.status {
            MemberStatus::Completed => "✓".green(),
            MemberStatus::Error => "✗".red(),
            MemberStatus::Cancelled => "-".dimmed(),
        };
        println!("  {} {}", mark, member);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(description: &str, size: usize) -> TaskArgs {
        TaskArgs {
            description: description.to_string(),
            task_id: "cli-task".to_string(),
            task_type: "general".to_string(),
            size,
            capabilities: Vec::new(),
            priority: 1.0,
            security_level: "standard".to_string(),
            retries: None,
        }
    }

    #[test]
    fn test_task_args_carry_metadata() {
        let mut args = args("ship the app", 2);
        args.security_level = "high".to_string();
        let task = args.to_task();
        assert_eq!(task.priority(), 1.0);
        assert_eq!(task.security_level(), "high");
        assert!(args.capability_override().is_none());
    }

    #[tokio::test]
    async fn test_generate_and_dry_run_with_default_config() {
        let coordinator = build_coordinator(&SwarmConfigManifest::default()).unwrap();
        let args = args("Build a checkout flow and write the launch post", 4);

        let team = generate(&coordinator, &args).unwrap();
        assert_eq!(team.len(), 4);

        let result = coordinator.execute_team_task(&args.to_task(), &team).await.unwrap();
        assert_eq!(result.status, TeamExecutionStatus::Completed);
        assert_eq!(result.results.len(), 4);
    }
}

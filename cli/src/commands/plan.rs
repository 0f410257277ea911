// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Routing plan commands
//!
//! Commands: validate
//!
//! Plan documents are YAML:
//!
//! ```yaml
//! max_budget: 50.0          # optional
//! plan:
//!   assignments: { t1: builder, t2: qa }
//!   metadata: { estimated_cost: 12.5 }
//! tasks:
//!   - { task_id: t1, task_type: code, description: build the api }
//!   - { task_id: t2, task_type: test, dependencies: [t1] }
//! ```

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use kinswarm_core::application::PlanValidator;
use kinswarm_core::domain::plan::RoutingPlan;
use kinswarm_core::domain::swarm_config::SwarmConfigManifest;
use kinswarm_core::domain::task::{Task, TaskDag};
use kinswarm_core::domain::validation::ValidationResult;

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Validate a routing plan against its task graph
    Validate {
        /// Plan document (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override the document's max_budget
        #[arg(long)]
        max_budget: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Deserialize)]
pub struct PlanDocument {
    pub plan: RoutingPlan,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub max_budget: Option<f64>,
}

impl PlanDocument {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan document {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse plan document {:?}", path))
    }
}

pub async fn handle_command(command: PlanCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        PlanCommand::Validate { file, max_budget, json } => {
            validate(&file, max_budget, json, config_path)
        }
    }
}

/// Validate the plan in `file` with the configured capability registry.
pub fn validate_document(
    document: &PlanDocument,
    config: &SwarmConfigManifest,
    max_budget: Option<f64>,
) -> Result<ValidationResult> {
    let validator =
        PlanValidator::new(config.spec.capabilities.clone(), config.spec.validator.clone())
            .context("Invalid capability registry in configuration")?;
    let dag = TaskDag::from_tasks(document.tasks.iter().cloned());
    Ok(validator.validate(&document.plan, &dag, max_budget.or(document.max_budget)))
}

fn validate(
    file: &Path,
    max_budget: Option<f64>,
    as_json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let document = PlanDocument::from_yaml_file(file)?;
    let result = validate_document(&document, &config, max_budget)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Plan validation:".bold());
    for (name, passed) in [
        ("Solvability", Some(result.solvability_passed)),
        ("Completeness", Some(result.completeness_passed)),
        ("Non-redundancy", Some(result.redundancy_passed)),
        ("Budget", result.budget_passed),
        ("Security", Some(result.security_passed)),
    ] {
        let mark = match passed {
            Some(true) => "✓ pass".green(),
            Some(false) => "✗ fail".red(),
            None => "- skipped".dimmed(),
        };
        println!("  {:<15} {}", name, mark);
    }

    if !result.issues.is_empty() {
        println!();
        println!("{}", "Issues:".bold());
        for issue in &result.issues {
            println!("  {} {}", "✗".red(), issue);
        }
    }
    if !result.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".bold());
        for warning in &result.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }

    println!();
    if result.passed {
        println!("{}", format!("✓ {}", result.summary()).green());
        Ok(())
    } else {
        anyhow::bail!(result.summary())
    }
}

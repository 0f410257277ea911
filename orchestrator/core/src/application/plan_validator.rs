// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Plan Validator (Agent-Oriented Planning)
//!
//! Checks a task -> agent `RoutingPlan` against its `TaskDag` and the agent
//! capability registry, then scores plans that pass.
//!
//! ## Checks
//!
//! | Check | Fails when |
//! |-------|-----------|
//! | Solvability | assigned agent is unknown, does not support the task type, or lacks a required skill |
//! | Completeness | a DAG task has no assignment |
//! | Non-redundancy | one agent gets several same-type tasks with near-identical descriptions |
//! | Budget | a budget was given and the plan's `estimated_cost` is missing or above it |
//! | Security | the DAG has a cycle, or exceeds the depth / node-count limits |
//!
//! Failures accumulate: every check runs and reports independently. Orphaned
//! assignments and plan-declared unassigned tasks are reported as issues and
//! fail the plan without affecting `completeness_passed`, which tracks DAG
//! coverage only.
//!
//! ## Quality Score
//!
//! `0.4 * P(success) + 0.3 * quality + 0.2 * (1 - cost) + 0.1 * (1 - time)`,
//! computed only when every check passes.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::agent::AgentCapability;
use crate::domain::plan::RoutingPlan;
use crate::domain::swarm_config::ValidatorSettings;
use crate::domain::task::TaskDag;
use crate::domain::validation::{SecurityViolation, ValidationError, ValidationResult};

const SUCCESS_WEIGHT: f64 = 0.4;
const QUALITY_WEIGHT: f64 = 0.3;
const COST_WEIGHT: f64 = 0.2;
const TIME_WEIGHT: f64 = 0.1;

const TYPE_MATCH_WEIGHT: f64 = 0.7;
const SKILL_OVERLAP_WEIGHT: f64 = 0.3;

/// Success rate assumed for agents missing from the registry.
const DEFAULT_SUCCESS_RATE: f64 = 0.7;
/// Cost assumed for agents missing from the registry.
const DEFAULT_COST: f64 = 0.5;

pub struct PlanValidator {
    capabilities: BTreeMap<String, AgentCapability>,
    settings: ValidatorSettings,
}

impl PlanValidator {
    pub fn new(
        capabilities: impl IntoIterator<Item = AgentCapability>,
        settings: ValidatorSettings,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        let mut registry = BTreeMap::new();
        for capability in capabilities {
            capability.validate()?;
            registry.insert(capability.agent_name.clone(), capability);
        }
        Ok(Self { capabilities: registry, settings })
    }

    pub fn capability(&self, agent_name: &str) -> Option<&AgentCapability> {
        self.capabilities.get(agent_name)
    }

    /// Validate `plan` against `dag`. Pure function of its inputs and the registry.
    pub fn validate(
        &self,
        plan: &RoutingPlan,
        dag: &TaskDag,
        max_budget: Option<f64>,
    ) -> ValidationResult {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let solvability_passed = self.check_solvability(plan, dag, &mut issues);
        let (completeness_passed, structure_passed) =
            self.check_completeness(plan, dag, &mut issues);
        let redundancy_passed = self.check_redundancy(plan, dag, &mut warnings);
        let budget_passed = max_budget.map(|budget| self.check_budget(plan, budget, &mut issues));
        let security_passed = self.check_security(dag, &mut issues, &mut warnings);

        let passed = solvability_passed
            && completeness_passed
            && structure_passed
            && redundancy_passed
            && budget_passed.unwrap_or(true)
            && security_passed;

        let quality_score = passed.then(|| self.quality_score(plan, dag));

        debug!(
            passed,
            solvability_passed,
            completeness_passed,
            redundancy_passed,
            security_passed,
            issues = issues.len(),
            warnings = warnings.len(),
            "Plan validated"
        );

        ValidationResult {
            passed,
            solvability_passed,
            completeness_passed,
            redundancy_passed,
            budget_passed,
            security_passed,
            issues,
            warnings,
            quality_score,
        }
    }

    fn check_solvability(
        &self,
        plan: &RoutingPlan,
        dag: &TaskDag,
        issues: &mut Vec<String>,
    ) -> bool {
        let before = issues.len();

        for (task_id, agent_name) in &plan.assignments {
            let Some(task) = dag.get(task_id) else { continue };

            let Some(capability) = self.capabilities.get(agent_name) else {
                issues.push(format!(
                    "Solvability: task '{}' is assigned to unknown agent '{}'",
                    task_id, agent_name
                ));
                continue;
            };

            if !capability.supports(&task.task_type) {
                issues.push(format!(
                    "Solvability: agent '{}' does not support task type '{}' (task '{}')",
                    agent_name, task.task_type, task_id
                ));
            }

            let missing: Vec<String> = task
                .required_skills()
                .into_iter()
                .filter(|skill| !capability.skills.contains(skill))
                .collect();
            if !missing.is_empty() {
                issues.push(format!(
                    "Solvability: agent '{}' lacks required skills [{}] for task '{}'",
                    agent_name,
                    missing.join(", "),
                    task_id
                ));
            }
        }

        issues.len() == before
    }

    /// Returns `(dag_covered, no_structural_issues)`.
    fn check_completeness(
        &self,
        plan: &RoutingPlan,
        dag: &TaskDag,
        issues: &mut Vec<String>,
    ) -> (bool, bool) {
        let mut covered = true;
        for task_id in dag.task_ids() {
            if !plan.assignments.contains_key(task_id) {
                covered = false;
                issues.push(format!("Completeness: task '{}' has no assigned agent", task_id));
            }
        }

        let mut structural = true;
        for task_id in &plan.unassigned_tasks {
            structural = false;
            issues.push(format!("Completeness: plan declares task '{}' as unassigned", task_id));
        }

        for (task_id, agent_name) in &plan.assignments {
            if !dag.contains(task_id) {
                structural = false;
                issues.push(format!(
                    "Completeness: orphaned assignment '{}' -> '{}' references a task outside the DAG",
                    task_id, agent_name
                ));
            }
        }

        (covered, structural)
    }

    fn check_redundancy(
        &self,
        plan: &RoutingPlan,
        dag: &TaskDag,
        warnings: &mut Vec<String>,
    ) -> bool {
        let mut groups: BTreeMap<(&str, &str), Vec<&str>> = BTreeMap::new();
        for (task_id, agent_name) in &plan.assignments {
            if let Some(task) = dag.get(task_id) {
                groups
                    .entry((agent_name.as_str(), task.task_type.as_str()))
                    .or_default()
                    .push(task_id.as_str());
            }
        }

        let threshold = self.settings.duplicate_similarity_threshold;
        let mut passed = true;

        for ((agent_name, task_type), task_ids) in groups {
            if task_ids.len() < 2 {
                continue;
            }

            warnings.push(format!(
                "Redundancy: agent '{}' handles {} '{}' tasks [{}]",
                agent_name,
                task_ids.len(),
                task_type,
                task_ids.join(", ")
            ));

            for (i, first) in task_ids.iter().enumerate() {
                for second in &task_ids[i + 1..] {
                    let (Some(a), Some(b)) = (dag.get(first), dag.get(second)) else { continue };
                    let similarity = jaccard_similarity(&a.description, &b.description);
                    if similarity > threshold {
                        passed = false;
                        warnings.push(format!(
                            "Redundancy: high-confidence duplicate tasks '{}' and '{}' (similarity {:.2})",
                            first, second, similarity
                        ));
                    }
                }
            }
        }

        passed
    }

    fn check_budget(&self, plan: &RoutingPlan, max_budget: f64, issues: &mut Vec<String>) -> bool {
        match plan.estimated_cost() {
            None => {
                issues.push(
                    "Budget: plan has no estimated_cost to check against the budget".to_string(),
                );
                false
            }
            Some(cost) if cost > max_budget => {
                issues.push(format!(
                    "Budget: estimated cost {:.2} exceeds budget {:.2}",
                    cost, max_budget
                ));
                false
            }
            Some(_) => true,
        }
    }

    fn check_security(
        &self,
        dag: &TaskDag,
        issues: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> bool {
        if let Some(path) = dag.find_cycle() {
            issues.push(format!("Security: {}", SecurityViolation::Cycle { path }));
            return false;
        }

        let mut passed = true;

        let depth = dag.critical_path_depth().unwrap_or(0);
        if depth > self.settings.max_depth {
            passed = false;
            issues.push(format!(
                "Security: {}",
                SecurityViolation::DepthExceeded { depth, max: self.settings.max_depth }
            ));
        } else if depth > self.settings.warn_depth {
            warnings.push(format!(
                "Security: DAG depth {} is above the recommended {}",
                depth, self.settings.warn_depth
            ));
        }

        let count = dag.len();
        if count > self.settings.max_nodes {
            passed = false;
            issues.push(format!(
                "Security: {}",
                SecurityViolation::TooManyNodes { count, max: self.settings.max_nodes }
            ));
        } else if count > self.settings.warn_nodes {
            warnings.push(format!(
                "Security: DAG has {} tasks, above the recommended {}",
                count, self.settings.warn_nodes
            ));
        }

        passed
    }

    /// Weighted plan quality in `[0, 1]`.
    pub fn quality_score(&self, plan: &RoutingPlan, dag: &TaskDag) -> f64 {
        let p_success = self.success_probability(plan);
        let quality = self.assignment_quality(plan, dag);
        let cost = self.normalized_cost(plan);
        let time = self.normalized_time(dag);

        let score = SUCCESS_WEIGHT * p_success
            + QUALITY_WEIGHT * quality
            + COST_WEIGHT * (1.0 - cost)
            + TIME_WEIGHT * (1.0 - time);

        score.clamp(0.0, 1.0)
    }

    /// Product of per-agent success rates (independence assumption).
    pub fn success_probability(&self, plan: &RoutingPlan) -> f64 {
        plan.assignments
            .values()
            .map(|agent| {
                self.capabilities
                    .get(agent)
                    .map(|c| c.success_rate)
                    .unwrap_or(DEFAULT_SUCCESS_RATE)
            })
            .product()
    }

    /// Mean of `0.7 * type_match + 0.3 * skill_overlap` over assignments.
    pub fn assignment_quality(&self, plan: &RoutingPlan, dag: &TaskDag) -> f64 {
        if plan.assignments.is_empty() {
            return 0.0;
        }

        let total: f64 = plan
            .assignments
            .iter()
            .map(|(task_id, agent)| {
                let capability = self.capabilities.get(agent);
                let Some(task) = dag.get(task_id) else { return 0.0 };

                let type_match = match capability {
                    Some(c) if c.supports(&task.task_type) => 1.0,
                    _ => 0.0,
                };

                let required = task.required_skills();
                let skill_overlap = if required.is_empty() {
                    1.0
                } else {
                    let skills = capability.map(|c| &c.skills);
                    let matched = required
                        .iter()
                        .filter(|s| skills.is_some_and(|set| set.contains(*s)))
                        .count();
                    matched as f64 / required.len() as f64
                };

                TYPE_MATCH_WEIGHT * type_match + SKILL_OVERLAP_WEIGHT * skill_overlap
            })
            .sum();

        total / plan.assignments.len() as f64
    }

    /// Mean cost-tier weight over assigned agents.
    pub fn normalized_cost(&self, plan: &RoutingPlan) -> f64 {
        if plan.assignments.is_empty() {
            return 0.0;
        }
        let total: f64 = plan
            .assignments
            .values()
            .map(|agent| {
                self.capabilities
                    .get(agent)
                    .map(|c| c.cost_tier.weight())
                    .unwrap_or(DEFAULT_COST)
            })
            .sum();
        total / plan.assignments.len() as f64
    }

    /// Critical-path depth relative to the depth limit, capped at 1.
    pub fn normalized_time(&self, dag: &TaskDag) -> f64 {
        let depth = dag.critical_path_depth().unwrap_or(self.settings.max_depth);
        (depth as f64 / self.settings.max_depth.max(1) as f64).min(1.0)
    }
}

/// Word-level Jaccard similarity of two descriptions (case-insensitive).
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let words = |text: &str| -> BTreeSet<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    };
    let (a, b) = (words(a), words(b));

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

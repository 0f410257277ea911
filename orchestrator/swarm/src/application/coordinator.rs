// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Coordinator
//!
//! Application service that turns tasks into validated teams and runs them.
//!
//! ## Team generation
//!
//! ```text
//! attempt n (seed = base_seed + n - 1)
//!   ├─ PSO over the registry ──► candidate team
//!   ├─ ValidationPort          ──► accept → cache + return
//!   └─ reject                  ──► log OptimizationFailure, next attempt
//! all attempts rejected        ──► deterministic capability-map team
//! ```
//!
//! Generation never fails because of rejection; only malformed inputs
//! (`ValidationError`) are returned as errors.
//!
//! ## Dispatch
//!
//! Members run concurrently on a `JoinSet` under one team deadline. Every
//! member resolves to a terminal `MemberStatus`; on deadline expiry the
//! stragglers are aborted and recorded as cancelled, and the team result is
//! `Timeout` with no partial outputs.
//!
//! Team cache, performance and history sit behind one `parking_lot::Mutex`.

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

use kinswarm_core::domain::agent::{Agent, AgentRegistry, GENOTYPE_COUNT};
use kinswarm_core::domain::execution::{
    ExecutionFailure, ExecutionId, ExecutionRecord, MemberResult, MemberStatus, TeamExecutionResult,
    TeamExecutionStatus, WorkerOutput,
};
use kinswarm_core::domain::ports::{TaskRouter, ValidationPort, WorkerExecutor};
use kinswarm_core::domain::swarm_config::{
    CoordinatorSettings, FitnessSettings, OptimizerSettings, SwarmConfigManifest,
};
use kinswarm_core::domain::task::{Task, TaskRequirement};
use kinswarm_core::domain::validation::ValidationError;

use crate::domain::capability_map::{
    business_profile, fallback_team, infer_capabilities, team_size_for_complexity,
};
use crate::domain::fitness::{relatedness, InclusiveFitnessSwarm};
use crate::domain::pso::ParticleSwarmOptimizer;

/// Seed for a 1-based optimization attempt.
pub fn attempt_seed(base_seed: u64, attempt: u32) -> u64 {
    base_seed.wrapping_add(u64::from(attempt.saturating_sub(1)))
}

/// Order-independent key for a team.
pub fn team_key(team: &[String]) -> String {
    let mut members: Vec<&str> = team.iter().map(String::as_str).collect();
    members.sort_unstable();
    members.join(",")
}

/// A PSO team rejected by the validation port. Logged, never returned.
#[derive(Debug, Clone, Error)]
#[error("attempt {attempt} (seed {seed}) rejected: {}", .reasons.join("; "))]
pub struct OptimizationFailure {
    pub attempt: u32,
    pub seed: u64,
    pub reasons: Vec<String>,
}

/// All tunables of a coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub optimizer: OptimizerSettings,
    pub fitness: FitnessSettings,
    pub coordinator: CoordinatorSettings,
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.optimizer.validate()?;
        self.fitness.validate()?;
        self.coordinator.validate()
    }
}

impl From<&SwarmConfigManifest> for CoordinatorConfig {
    fn from(manifest: &SwarmConfigManifest) -> Self {
        Self {
            optimizer: manifest.spec.optimizer.clone(),
            fitness: manifest.spec.fitness.clone(),
            coordinator: manifest.spec.coordinator.clone(),
        }
    }
}

/// How generation arrived at a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPath {
    Pso,
    Fallback,
}

impl GenerationPath {
    fn as_str(&self) -> &'static str {
        match self {
            GenerationPath::Pso => "pso",
            GenerationPath::Fallback => "fallback",
        }
    }
}

/// Smoothed performance of one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamPerformance {
    pub performance: f64,
    pub execution_count: u64,
    pub success_count: u64,
}

impl TeamPerformance {
    /// The first observation sets the performance; later ones are smoothed.
    fn observe(&mut self, status: TeamExecutionStatus, smoothing: f64) {
        let score = status.score();
        self.performance = if self.execution_count == 0 {
            score
        } else {
            smoothing * score + (1.0 - smoothing) * self.performance
        };
        self.execution_count += 1;
        if status == TeamExecutionStatus::Completed {
            self.success_count += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPerformanceReport {
    pub team: Vec<String>,
    pub performance: f64,
    pub execution_count: u64,
    pub success_rate: f64,
    /// Distinct genotypes over the number of genotype groups.
    pub diversity: f64,
    /// Mean pairwise relatedness.
    pub cooperation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionDecision {
    pub team: Vec<String>,
    pub reoptimize: bool,
    pub reason: String,
}

#[derive(Default)]
struct CoordinatorState {
    team_cache: HashMap<String, Vec<String>>,
    team_performance: HashMap<String, TeamPerformance>,
    execution_history: Vec<ExecutionRecord>,
}

type MemberJoin = Result<(Id, Result<WorkerOutput, ExecutionFailure>), JoinError>;

pub struct SwarmCoordinator {
    registry: AgentRegistry,
    config: CoordinatorConfig,
    validation_port: Arc<dyn ValidationPort>,
    executor: Arc<dyn WorkerExecutor>,
    router: Option<Arc<dyn TaskRouter>>,
    state: Mutex<CoordinatorState>,
}

impl SwarmCoordinator {
    /// # Errors
    /// `ValidationError` for an empty or duplicated roster, or out-of-range settings.
    pub fn new(
        agents: Vec<Agent>,
        config: CoordinatorConfig,
        validation_port: Arc<dyn ValidationPort>,
        executor: Arc<dyn WorkerExecutor>,
    ) -> Result<Self, ValidationError> {
        Self::from_registry(AgentRegistry::from_agents(agents)?, config, validation_port, executor)
    }

    pub fn from_registry(
        registry: AgentRegistry,
        config: CoordinatorConfig,
        validation_port: Arc<dyn ValidationPort>,
        executor: Arc<dyn WorkerExecutor>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        if registry.is_empty() {
            return Err(ValidationError::EmptyAgentList);
        }
        Ok(Self {
            registry,
            config,
            validation_port,
            executor,
            router: None,
            state: Mutex::new(CoordinatorState::default()),
        })
    }

    pub fn from_manifest(
        manifest: &SwarmConfigManifest,
        validation_port: Arc<dyn ValidationPort>,
        executor: Arc<dyn WorkerExecutor>,
    ) -> Result<Self, ValidationError> {
        Self::from_registry(
            manifest.agent_registry()?,
            CoordinatorConfig::from(manifest),
            validation_port,
            executor,
        )
    }

    /// Attach a router consulted before dispatch.
    pub fn with_router(mut self, router: Arc<dyn TaskRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ========================================================================
    // Team generation
    // ========================================================================

    /// Generate a team of exactly `team_size` agents (clipped to the roster).
    ///
    /// `capabilities` overrides the capabilities inferred from the task
    /// description. Up to `max_retries` PSO attempts are made, each with the
    /// next seed; if all are rejected the deterministic fallback is returned.
    pub fn generate_optimal_team(
        &self,
        task: &Task,
        team_size: usize,
        capabilities: Option<Vec<String>>,
        max_retries: u32,
    ) -> Result<Vec<String>, ValidationError> {
        if team_size == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "team_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut required: Vec<String> = Vec::new();
        for capability in capabilities.unwrap_or_else(|| infer_capabilities(&task.description)) {
            if !required.contains(&capability) {
                required.push(capability);
            }
        }

        let requirement = TaskRequirement::new(
            task.task_id.clone(),
            required.iter().cloned(),
            (team_size, team_size),
            task.priority(),
        )?;
        let security_level = task.security_level();

        for attempt in 1..=max_retries {
            let seed = attempt_seed(self.config.coordinator.base_seed, attempt);
            let swarm = InclusiveFitnessSwarm::from_registry(
                self.registry.clone(),
                self.config.fitness.clone(),
                seed,
            )?;
            let mut optimizer =
                ParticleSwarmOptimizer::new(swarm, self.config.optimizer.clone(), seed)?;
            let (team, fitness) = optimizer.optimize_team(&requirement, None)?;
            metrics::counter!("kinswarm_optimization_attempts_total").increment(1);

            let verdict = self.validation_port.validate_team_composition(
                &team,
                &task.task_type,
                requirement.required_capabilities(),
                &security_level,
            );

            if verdict.is_valid {
                metrics::histogram!("kinswarm_team_fitness").record(fitness);
                self.log_rationale(task, &team, &requirement, GenerationPath::Pso);
                info!(
                    task_id = %task.task_id,
                    attempt,
                    seed,
                    fitness,
                    team = ?team,
                    "Generated team via PSO"
                );
                self.state.lock().team_cache.insert(task.task_id.clone(), team.clone());
                metrics::counter!(
                    "kinswarm_team_generation_total",
                    "path" => GenerationPath::Pso.as_str()
                )
                .increment(1);
                return Ok(team);
            }

            let failure = OptimizationFailure { attempt, seed, reasons: verdict.reasons };
            warn!(
                task_id = %task.task_id,
                max_retries,
                "PSO team rejected, reseeding: {}",
                failure
            );
        }

        let team = fallback_team(
            &self.registry,
            &required,
            team_size,
            &self.config.coordinator.default_team_order,
        );
        warn!(
            task_id = %task.task_id,
            max_retries,
            team = ?team,
            "All PSO attempts rejected, using capability-map fallback"
        );
        self.log_rationale(task, &team, &requirement, GenerationPath::Fallback);
        metrics::counter!(
            "kinswarm_team_generation_total",
            "path" => GenerationPath::Fallback.as_str()
        )
        .increment(1);
        Ok(team)
    }

    fn log_rationale(
        &self,
        task: &Task,
        team: &[String],
        requirement: &TaskRequirement,
        path: GenerationPath,
    ) {
        for agent in team.iter().filter_map(|name| self.registry.get(name)) {
            let matched: Vec<&String> = requirement
                .required_capabilities()
                .iter()
                .filter(|c| agent.has_capability(c))
                .collect();
            debug!(
                task_id = %task.task_id,
                path = path.as_str(),
                agent = %agent.name(),
                genotype = %agent.genotype(),
                matched = ?matched,
                "Team member selected"
            );
        }
    }

    /// Build a team for a business type and complexity label.
    pub fn spawn_dynamic_team_for_business(
        &self,
        business_type: &str,
        complexity: &str,
    ) -> Result<Vec<String>, ValidationError> {
        let capabilities = business_profile(business_type);
        let team_size = team_size_for_complexity(complexity).min(self.registry.len());
        let task = Task::new(
            format!(
                "business-{}-{}",
                business_type.trim().to_lowercase(),
                complexity.trim().to_lowercase()
            ),
            "business",
            format!("Launch and operate a {} business ({} complexity)", business_type, complexity),
        );

        info!(
            business_type,
            complexity,
            team_size,
            capabilities = ?capabilities,
            "Spawning business team"
        );
        self.generate_optimal_team(
            &task,
            team_size,
            Some(capabilities),
            self.config.coordinator.max_retries,
        )
    }

    /// Last accepted PSO team for a task id.
    pub fn cached_team(&self, task_id: &str) -> Option<Vec<String>> {
        self.state.lock().team_cache.get(task_id).cloned()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// One sub-task per member, carrying the member's role.
    pub fn decompose_task(&self, task: &Task, team: &[String]) -> Vec<(String, Task)> {
        team.iter()
            .map(|member| {
                let role = self.registry.get(member).map(Agent::role).unwrap_or(member.as_str());
                let subtask = Task {
                    task_id: format!("{}::{}", task.task_id, member),
                    task_type: task.task_type.clone(),
                    description: task.description.clone(),
                    dependencies: Vec::new(),
                    metadata: task.metadata.clone(),
                }
                .with_metadata("parent_task_id", task.task_id.clone().into())
                .with_metadata("assigned_agent", member.clone().into())
                .with_metadata("team_role", role.into());
                (member.clone(), subtask)
            })
            .collect()
    }

    fn consult_router(&self, subtasks: &[(String, Task)]) {
        let Some(router) = &self.router else {
            return;
        };
        let tasks: Vec<Task> = subtasks.iter().map(|(_, t)| t.clone()).collect();
        let plan = router.route_tasks(&tasks);
        for (member, subtask) in subtasks {
            match plan.agent_for(&subtask.task_id) {
                Some(routed) if routed != member => warn!(
                    subtask_id = %subtask.task_id,
                    swarm_choice = %member,
                    router_choice = %routed,
                    "Router disagrees with team assignment, keeping team member"
                ),
                Some(_) => {}
                None => debug!(subtask_id = %subtask.task_id, "Router left sub-task unassigned"),
            }
        }
    }

    /// Run `task` with `team`, one sub-task per member, under the team deadline.
    ///
    /// A member named twice is rejected before anything is dispatched.
    pub async fn execute_team_task(
        &self,
        task: &Task,
        team: &[String],
    ) -> Result<TeamExecutionResult, ValidationError> {
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = team.iter().find(|name| !seen.insert(name.as_str())) {
            warn!(
                task_id = %task.task_id,
                member = %duplicate,
                "Rejecting team with a repeated member"
            );
            return Err(ValidationError::DuplicateAgent(duplicate.clone()));
        }

        let execution_id = ExecutionId::new();
        let started_at = Utc::now();
        let started = Instant::now();
        let deadline = Duration::from_secs(self.config.coordinator.execution_timeout_secs);

        let subtasks = self.decompose_task(task, team);
        self.consult_router(&subtasks);

        let mut set = JoinSet::new();
        let mut members: HashMap<Id, String> = HashMap::with_capacity(subtasks.len());
        for (member, subtask) in subtasks {
            let executor = Arc::clone(&self.executor);
            let agent_name = member.clone();
            let handle = set.spawn(async move { executor.execute(&agent_name, &subtask).await });
            members.insert(handle.id(), member);
        }
        info!(
            execution_id = %execution_id,
            task_id = %task.task_id,
            team = ?team,
            "Dispatched team"
        );

        let mut results: BTreeMap<String, MemberResult> = BTreeMap::new();
        let finished = tokio::time::timeout(deadline, async {
            while let Some(joined) = set.join_next_with_id().await {
                let (member, result) = resolve_member(joined, &members);
                results.insert(member, result);
            }
        })
        .await
        .is_ok();

        let mut member_statuses: BTreeMap<String, MemberStatus> =
            results.iter().map(|(name, r)| (name.clone(), r.status)).collect();

        let (status, results, error) = if finished {
            (TeamExecutionStatus::aggregate(member_statuses.values()), results, None)
        } else {
            set.abort_all();
            while let Some(joined) = set.join_next_with_id().await {
                let (member, result) = resolve_member(joined, &members);
                member_statuses.insert(member, result.status);
            }
            warn!(
                execution_id = %execution_id,
                task_id = %task.task_id,
                deadline_secs = deadline.as_secs(),
                "Team execution exceeded deadline"
            );
            (
                TeamExecutionStatus::Timeout,
                BTreeMap::new(),
                Some(format!("Team execution exceeded {}s deadline", deadline.as_secs())),
            )
        };

        let elapsed = started.elapsed();
        metrics::counter!("kinswarm_team_execution_total", "status" => status.as_str())
            .increment(1);
        info!(
            execution_id = %execution_id,
            task_id = %task.task_id,
            status = status.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Team execution finished"
        );

        self.record_execution(ExecutionRecord {
            execution_id,
            task_id: task.task_id.clone(),
            team: team.to_vec(),
            status,
            member_statuses,
            started_at,
            elapsed,
        });

        Ok(TeamExecutionResult {
            execution_id,
            task_id: task.task_id.clone(),
            team: team.to_vec(),
            status,
            results,
            error,
            elapsed,
        })
    }

    fn record_execution(&self, record: ExecutionRecord) {
        let smoothing = self.config.coordinator.performance_smoothing;
        let mut state = self.state.lock();
        state
            .team_performance
            .entry(team_key(&record.team))
            .or_default()
            .observe(record.status, smoothing);
        state.execution_history.push(record);
    }

    pub fn execution_history(&self) -> Vec<ExecutionRecord> {
        self.state.lock().execution_history.clone()
    }

    // ========================================================================
    // Performance and evolution
    // ========================================================================

    pub fn team_performance(&self, team: &[String]) -> Option<TeamPerformance> {
        self.state.lock().team_performance.get(&team_key(team)).copied()
    }

    pub fn get_team_performance_history(&self, team: &[String]) -> TeamPerformanceReport {
        let performance = self.team_performance(team).unwrap_or_default();
        let success_rate = if performance.execution_count == 0 {
            0.0
        } else {
            performance.success_count as f64 / performance.execution_count as f64
        };

        TeamPerformanceReport {
            team: team.to_vec(),
            performance: performance.performance,
            execution_count: performance.execution_count,
            success_rate,
            diversity: self.registry.genotype_counts(team).len() as f64 / GENOTYPE_COUNT as f64,
            cooperation: self.cooperation(team),
        }
    }

    fn cooperation(&self, team: &[String]) -> f64 {
        let members: Vec<&Agent> = team.iter().filter_map(|name| self.registry.get(name)).collect();
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                total += relatedness(a, b);
                pairs += 1;
            }
        }
        if pairs == 0 {
            0.0
        } else {
            total / pairs as f64
        }
    }

    /// Keep `team` while feedback stays at or above the evolve threshold;
    /// otherwise flag it for re-optimization.
    pub fn evolve_team(&self, team: &[String], performance_feedback: f64) -> EvolutionDecision {
        let threshold = self.config.coordinator.evolve_threshold;
        if performance_feedback < threshold {
            info!(
                team = ?team,
                performance_feedback,
                threshold,
                "Team flagged for re-optimization"
            );
            EvolutionDecision {
                team: team.to_vec(),
                reoptimize: true,
                reason: format!(
                    "feedback {:.2} below threshold {:.2}",
                    performance_feedback, threshold
                ),
            }
        } else {
            EvolutionDecision {
                team: team.to_vec(),
                reoptimize: false,
                reason: format!(
                    "feedback {:.2} meets threshold {:.2}",
                    performance_feedback, threshold
                ),
            }
        }
    }
}

fn resolve_member(joined: MemberJoin, members: &HashMap<Id, String>) -> (String, MemberResult) {
    let name = |id: Id| members.get(&id).cloned().unwrap_or_else(|| format!("task-{}", id));
    match joined {
        Ok((id, Ok(output))) => (name(id), MemberResult::completed(output.output)),
        Ok((id, Err(failure))) => {
            let member = name(id);
            warn!(agent = %member, error = %failure, "Team member failed");
            (member, MemberResult::from_failure(&failure))
        }
        Err(join_error) => {
            let member = name(join_error.id());
            let failure = if join_error.is_cancelled() {
                ExecutionFailure::Cancelled
            } else {
                ExecutionFailure::Error(format!("member task panicked: {}", join_error))
            };
            (member, MemberResult::from_failure(&failure))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_seeds_are_consecutive() {
        assert_eq!(attempt_seed(42, 1), 42);
        assert_eq!(attempt_seed(42, 3), 44);
        assert_eq!(attempt_seed(u64::MAX, 2), 0);
    }

    #[test]
    fn test_team_key_ignores_order() {
        let a = vec!["qa".to_string(), "builder".to_string()];
        let b = vec!["builder".to_string(), "qa".to_string()];
        assert_eq!(team_key(&a), team_key(&b));
        assert_eq!(team_key(&a), "builder,qa");
    }

    #[test]
    fn test_performance_smoothing() {
        let mut perf = TeamPerformance::default();
        perf.observe(TeamExecutionStatus::Completed, 0.3);
        assert_eq!(perf.performance, 1.0);
        perf.observe(TeamExecutionStatus::Failed, 0.3);
        assert!((perf.performance - 0.7).abs() < 1e-9);
        perf.observe(TeamExecutionStatus::Partial, 0.3);
        assert!((perf.performance - (0.3 * 0.5 + 0.7 * 0.7)).abs() < 1e-9);
        assert_eq!(perf.execution_count, 3);
        assert_eq!(perf.success_count, 1);
    }

    #[test]
    fn test_optimization_failure_display() {
        let failure =
            OptimizationFailure { attempt: 2, seed: 43, reasons: vec!["a".into(), "b".into()] };
        assert_eq!(failure.to_string(), "attempt 2 (seed 43) rejected: a; b");
    }
}

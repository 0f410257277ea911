// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inclusive Fitness Model
//!
//! Kin-selection reward model used as the optimizer's fitness oracle.
//!
//! - **Relatedness** is 1.0 between agents of the same genotype, else 0.0.
//! - **Success probability** of a team rises with genotype diversity and with
//!   small kin clusters, and collapses when required capabilities are not covered.
//! - **Inclusive fitness** of an agent is its own reward share plus the
//!   relatedness-weighted shares of its teammates (Hamilton's rule).
//!
//! Each swarm owns its RNG. Two swarms built with the same seed, agents and
//! settings produce identical outcome sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing::trace;

use kinswarm_core::domain::agent::{Agent, AgentRegistry, GENOTYPE_COUNT};
use kinswarm_core::domain::swarm_config::FitnessSettings;
use kinswarm_core::domain::task::TaskRequirement;
use kinswarm_core::domain::validation::ValidationError;

/// Genetic relatedness between two agents.
pub fn relatedness(a: &Agent, b: &Agent) -> f64 {
    if a.genotype() == b.genotype() {
        1.0
    } else {
        0.0
    }
}

/// One evaluation of a team against a task. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct TeamOutcome {
    team: Vec<String>,
    task: TaskRequirement,
    success: bool,
    success_probability: f64,
    overall_reward: f64,
    individual_contributions: BTreeMap<String, f64>,
    execution_time: Duration,
}

impl TeamOutcome {
    pub fn team(&self) -> &[String] {
        &self.team
    }

    pub fn task(&self) -> &TaskRequirement {
        &self.task
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    pub fn overall_reward(&self) -> f64 {
        self.overall_reward
    }

    pub fn individual_contributions(&self) -> &BTreeMap<String, f64> {
        &self.individual_contributions
    }

    /// Reward share of one member; 0.0 for non-members.
    pub fn contribution(&self, agent_name: &str) -> f64 {
        self.individual_contributions.get(agent_name).copied().unwrap_or(0.0)
    }

    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }
}

pub struct InclusiveFitnessSwarm {
    registry: AgentRegistry,
    settings: FitnessSettings,
    rng: StdRng,
}

impl InclusiveFitnessSwarm {
    /// Build a swarm with default fitness settings.
    ///
    /// # Errors
    /// `ValidationError` for an empty agent list or duplicate names.
    pub fn new(agents: Vec<Agent>, random_seed: u64) -> Result<Self, ValidationError> {
        Self::with_settings(agents, FitnessSettings::default(), random_seed)
    }

    pub fn with_settings(
        agents: Vec<Agent>,
        settings: FitnessSettings,
        random_seed: u64,
    ) -> Result<Self, ValidationError> {
        Self::from_registry(AgentRegistry::from_agents(agents)?, settings, random_seed)
    }

    pub fn from_registry(
        registry: AgentRegistry,
        settings: FitnessSettings,
        random_seed: u64,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        if registry.is_empty() {
            return Err(ValidationError::EmptyAgentList);
        }
        Ok(Self {
            registry,
            settings,
            rng: StdRng::seed_from_u64(random_seed),
        })
    }

    /// Restart the RNG stream from `random_seed`.
    pub fn reseed(&mut self, random_seed: u64) {
        self.rng = StdRng::seed_from_u64(random_seed);
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.registry.get(name)
    }

    pub fn settings(&self) -> &FitnessSettings {
        &self.settings
    }

    /// Relatedness between two registered agents; 0.0 if either is unknown.
    pub fn relatedness(&self, a: &str, b: &str) -> f64 {
        match (self.registry.get(a), self.registry.get(b)) {
            (Some(a), Some(b)) => relatedness(a, b),
            _ => 0.0,
        }
    }

    /// Store the latest inclusive fitness observed for an agent.
    pub fn record_fitness(&mut self, agent_name: &str, fitness: f64) {
        if let Some(agent) = self.registry.get_mut(agent_name) {
            agent.current_fitness = fitness;
        }
    }

    fn resolve_team(&self, team: &[String]) -> Result<Vec<&Agent>, ValidationError> {
        let mut seen = BTreeSet::new();
        for name in team {
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicateAgent(name.clone()));
            }
        }
        self.registry.resolve(team)
    }

    /// Probability that `team` succeeds at `task`, before any random draw.
    pub fn success_probability(
        &self,
        team: &[String],
        task: &TaskRequirement,
    ) -> Result<f64, ValidationError> {
        self.resolve_team(team)?;

        let covered = task
            .required_capabilities()
            .is_subset(&self.registry.capability_union(team));
        if !covered {
            return Ok(self.settings.uncovered_success_probability);
        }

        let counts = self.registry.genotype_counts(team);
        let diversity = counts.len() as f64 / GENOTYPE_COUNT as f64;
        let kin_clusters = counts
            .values()
            .filter(|n| (self.settings.kin_cluster_min..=self.settings.kin_cluster_max).contains(n))
            .count();

        let probability = self.settings.covered_base_probability
            + self.settings.diversity_bonus_max * diversity
            + self.settings.kin_cluster_bonus * kin_clusters as f64;

        Ok(probability.min(self.settings.max_success_probability))
    }

    /// Evaluate `team` on `task`.
    ///
    /// With `simulate` the outcome is a Bernoulli draw from the instance RNG.
    /// Without it the expected outcome is returned (success iff the
    /// probability is at least 0.5) and no randomness is consumed.
    pub fn evaluate_team(
        &mut self,
        team: &[String],
        task: &TaskRequirement,
        simulate: bool,
    ) -> Result<TeamOutcome, ValidationError> {
        let started = Instant::now();
        let success_probability = self.success_probability(team, task)?;

        let success = if simulate {
            self.rng.random::<f64>() < success_probability
        } else {
            success_probability >= 0.5
        };

        let overall_reward = task.priority()
            * if success { 1.0 } else { self.settings.failure_reward_factor };

        let members = self.registry.resolve(team)?;
        let matches: Vec<usize> = members
            .iter()
            .map(|agent| agent.capability_matches(task.required_capabilities()))
            .collect();
        let total_matches: usize = matches.iter().sum();

        let individual_contributions: BTreeMap<String, f64> = members
            .iter()
            .zip(&matches)
            .map(|(agent, &matched)| {
                let share = if total_matches == 0 {
                    overall_reward / members.len() as f64
                } else {
                    overall_reward * matched as f64 / total_matches as f64
                };
                (agent.name().to_string(), share)
            })
            .collect();

        trace!(
            task_id = %task.task_id(),
            team_size = team.len(),
            success_probability,
            success,
            overall_reward,
            "Evaluated team"
        );

        Ok(TeamOutcome {
            team: team.to_vec(),
            task: task.clone(),
            success,
            success_probability,
            overall_reward,
            individual_contributions,
            execution_time: started.elapsed(),
        })
    }

    /// Direct reward share plus relatedness-weighted shares of teammates.
    pub fn inclusive_fitness_reward(
        &self,
        agent: &str,
        outcome: &TeamOutcome,
        team: &[String],
    ) -> f64 {
        let direct = outcome.contribution(agent);
        let indirect: f64 = team
            .iter()
            .filter(|mate| mate.as_str() != agent)
            .map(|mate| self.relatedness(agent, mate) * outcome.contribution(mate))
            .sum();
        direct + indirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents() -> Vec<Agent> {
        vec![
            Agent::new("A", "marketing", ["ads", "social"]),
            Agent::new("B", "builder", ["coding", "testing"]),
            Agent::new("C", "content", ["writing", "seo"]),
            Agent::new("D", "billing", ["payments"]),
            Agent::new("Q", "qa", ["testing"]),
        ]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ── Construction ─────────────────────────────────────────────────────────

    #[test]
    fn test_rejects_empty_and_duplicate_agents() {
        assert!(matches!(
            InclusiveFitnessSwarm::new(vec![], 1),
            Err(ValidationError::EmptyAgentList)
        ));
        let dup = vec![Agent::new("A", "qa", ["x"]), Agent::new("A", "qa", ["y"])];
        assert!(matches!(
            InclusiveFitnessSwarm::new(dup, 1),
            Err(ValidationError::DuplicateAgent(_))
        ));
    }

    // ── Relatedness ──────────────────────────────────────────────────────────

    #[test]
    fn test_relatedness_iff_same_genotype() {
        let swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        for a in swarm.registry().agents() {
            for b in swarm.registry().agents() {
                let expected = if a.genotype() == b.genotype() { 1.0 } else { 0.0 };
                assert_eq!(swarm.relatedness(a.name(), b.name()), expected);
            }
        }
        assert_eq!(swarm.relatedness("B", "Q"), 1.0);
        assert_eq!(swarm.relatedness("A", "ghost"), 0.0);
    }

    // ── Success probability ──────────────────────────────────────────────────

    #[test]
    fn test_uncovered_team_probability() {
        let swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["coding", "payments"], (1, 3), 1.0).unwrap();
        assert_eq!(swarm.success_probability(&names(&["B"]), &task).unwrap(), 0.3);
    }

    #[test]
    fn test_covered_team_probability_with_kin_cluster() {
        let swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["coding"], (1, 3), 1.0).unwrap();

        // one genotype, no cluster: 0.7 + 0.2 * 1/5
        let p = swarm.success_probability(&names(&["B"]), &task).unwrap();
        assert!((p - 0.74).abs() < 1e-9);

        // infrastructure pair forms a kin cluster: 0.7 + 0.04 + 0.1
        let p = swarm.success_probability(&names(&["B", "Q"]), &task).unwrap();
        assert!((p - 0.84).abs() < 1e-9);

        // three genotypes plus one cluster: 0.7 + 0.12 + 0.1
        let p = swarm.success_probability(&names(&["B", "Q", "A", "C"]), &task).unwrap();
        assert!((p - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_probability_is_capped() {
        let settings = FitnessSettings { kin_cluster_bonus: 1.0, ..FitnessSettings::default() };
        let swarm = InclusiveFitnessSwarm::with_settings(agents(), settings, 1).unwrap();
        let task = TaskRequirement::new("t", ["coding"], (1, 3), 1.0).unwrap();
        let p = swarm.success_probability(&names(&["B", "Q"]), &task).unwrap();
        assert_eq!(p, 0.95);
    }

    // ── evaluate_team ────────────────────────────────────────────────────────

    #[test]
    fn test_rewards_split_by_capability_matches() {
        let mut swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["coding", "testing", "ads"], (1, 3), 2.0).unwrap();
        let outcome = swarm.evaluate_team(&names(&["A", "B"]), &task, false).unwrap();

        assert!(outcome.success());
        assert_eq!(outcome.overall_reward(), 2.0);
        // B matches 2 of 3, A matches 1 of 3
        assert!((outcome.contribution("B") - 4.0 / 3.0).abs() < 1e-9);
        assert!((outcome.contribution("A") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_split_when_nothing_matches() {
        let mut swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", Vec::<String>::new(), (1, 3), 1.0).unwrap();
        let outcome = swarm.evaluate_team(&names(&["A", "D"]), &task, false).unwrap();
        assert_eq!(outcome.contribution("A"), 0.5);
        assert_eq!(outcome.contribution("D"), 0.5);
    }

    #[test]
    fn test_failed_outcome_pays_reduced_reward() {
        let mut swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["payments", "seo"], (1, 3), 1.0).unwrap();
        // uncovered -> p = 0.3 -> expected outcome is failure
        let outcome = swarm.evaluate_team(&names(&["A"]), &task, false).unwrap();
        assert!(!outcome.success());
        assert!((outcome.overall_reward() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_simulated_outcomes_are_seed_deterministic() {
        let task = TaskRequirement::new("t", ["coding"], (1, 3), 1.0).unwrap();
        let team = names(&["B", "C"]);
        let run = |seed| {
            let mut swarm = InclusiveFitnessSwarm::new(agents(), seed).unwrap();
            (0..20)
                .map(|_| swarm.evaluate_team(&team, &task, true).unwrap().success())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_unknown_or_duplicate_members_rejected() {
        let mut swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["coding"], (1, 3), 1.0).unwrap();
        assert!(swarm.evaluate_team(&names(&["ghost"]), &task, true).is_err());
        assert!(swarm.evaluate_team(&names(&["B", "B"]), &task, true).is_err());
    }

    // ── inclusive_fitness_reward ─────────────────────────────────────────────

    #[test]
    fn test_inclusive_fitness_adds_kin_shares() {
        let mut swarm = InclusiveFitnessSwarm::new(agents(), 1).unwrap();
        let task = TaskRequirement::new("t", ["coding", "testing", "ads"], (1, 3), 1.0).unwrap();
        let team = names(&["A", "B", "Q"]);
        let outcome = swarm.evaluate_team(&team, &task, false).unwrap();

        let b = swarm.inclusive_fitness_reward("B", &outcome, &team);
        let expected = outcome.contribution("B") + outcome.contribution("Q");
        assert!((b - expected).abs() < 1e-9);

        // A has no kin on the team
        let a = swarm.inclusive_fitness_reward("A", &outcome, &team);
        assert!((a - outcome.contribution("A")).abs() < 1e-9);
    }
}

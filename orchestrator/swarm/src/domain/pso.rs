// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Discrete Particle Swarm Optimizer
//!
//! Searches the space of agent subsets for the team with the highest
//! inclusive fitness. Each particle is a team; "velocity" is replaced by a
//! resampling step that keeps a fraction of the current team (inertia) and
//! borrows members from the particle's personal best (cognitive) and the
//! swarm's global best (social).
//!
//! ## Update step
//!
//! ```text
//! keep   ⌊w  · |current|⌋        members of the current team
//! borrow ⌊c1 · r1 · |pbest|⌋     unused members of the personal best
//! borrow ⌊c2 · r2 · |gbest|⌋     unused members of the global best
//! pad / trim to [min, max]       with random unused agents
//! ```
//!
//! Sizes are clipped to the agent pool, so a requirement asking for more
//! agents than exist yields teams of the whole pool.
//!
//! All randomness comes from the optimizer's seeded `StdRng` and the fitness
//! oracle's own seeded RNG; agent pools are iterated in name order.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use tracing::debug;

use kinswarm_core::domain::swarm_config::OptimizerSettings;
use kinswarm_core::domain::task::TaskRequirement;
use kinswarm_core::domain::validation::ValidationError;

use super::fitness::InclusiveFitnessSwarm;

/// Reward multiplier applied to a team's mean inclusive fitness on success.
const SUCCESS_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone)]
struct Particle {
    team: Vec<String>,
    best_team: Vec<String>,
    best_fitness: f64,
}

pub struct ParticleSwarmOptimizer {
    swarm: InclusiveFitnessSwarm,
    settings: OptimizerSettings,
    rng: StdRng,
}

impl ParticleSwarmOptimizer {
    /// # Errors
    /// `ValidationError::InvalidParameter` when any setting is out of range.
    pub fn new(
        swarm: InclusiveFitnessSwarm,
        settings: OptimizerSettings,
        random_seed: u64,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            swarm,
            settings,
            rng: StdRng::seed_from_u64(random_seed),
        })
    }

    pub fn swarm(&self) -> &InclusiveFitnessSwarm {
        &self.swarm
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Restart both the optimizer's and the fitness oracle's RNG streams.
    pub fn reseed(&mut self, random_seed: u64) {
        self.rng = StdRng::seed_from_u64(random_seed);
        self.swarm.reseed(random_seed);
    }

    /// Run the search and return the best team found (sorted by name) with
    /// its fitness.
    ///
    /// Passing `random_seed` reseeds first, so two calls with the same seed
    /// on equal inputs return the same team.
    pub fn optimize_team(
        &mut self,
        task: &TaskRequirement,
        random_seed: Option<u64>,
    ) -> Result<(Vec<String>, f64), ValidationError> {
        if let Some(seed) = random_seed {
            self.reseed(seed);
        }

        let pool = self.swarm.registry().names();
        let max_size = task.max_size().min(pool.len());
        let min_size = task.min_size().min(max_size);

        let mut particles = Vec::with_capacity(self.settings.n_particles);
        for _ in 0..self.settings.n_particles {
            let team = self.initial_team(&pool, min_size, max_size);
            particles.push(Particle {
                best_team: team.clone(),
                team,
                best_fitness: f64::NEG_INFINITY,
            });
        }

        let mut global_best: Option<(Vec<String>, f64)> = None;

        for iteration in 0..self.settings.max_iterations {
            for particle in particles.iter_mut() {
                let fitness = self.team_fitness(&particle.team, task)?;

                if fitness > particle.best_fitness {
                    particle.best_fitness = fitness;
                    particle.best_team = particle.team.clone();
                }
                if global_best.as_ref().is_none_or(|(_, best)| fitness > *best) {
                    global_best = Some((particle.team.clone(), fitness));
                }

                let social = global_best.as_ref().map(|(team, _)| team.as_slice()).unwrap_or(&[]);
                particle.team = self.next_team(particle, social, &pool, min_size, max_size);
            }

            if let Some((_, best)) = &global_best {
                debug!(task_id = %task.task_id(), iteration, best_fitness = best, "PSO iteration");
            }
        }

        let (mut team, fitness) = global_best.unwrap_or_default();
        team.sort();
        Ok((team, fitness))
    }

    /// Mean inclusive fitness of the members, scaled up on success.
    /// Records each member's inclusive fitness on its agent.
    pub fn team_fitness(
        &mut self,
        team: &[String],
        task: &TaskRequirement,
    ) -> Result<f64, ValidationError> {
        if team.is_empty() {
            return Ok(0.0);
        }

        let outcome = self.swarm.evaluate_team(team, task, true)?;
        let mut total = 0.0;
        for member in team {
            let fitness = self.swarm.inclusive_fitness_reward(member, &outcome, team);
            self.swarm.record_fitness(member, fitness);
            total += fitness;
        }

        let mean = total / team.len() as f64;
        Ok(if outcome.success() { mean * SUCCESS_MULTIPLIER } else { mean })
    }

    fn initial_team(&mut self, pool: &[String], min_size: usize, max_size: usize) -> Vec<String> {
        let size = if max_size == 0 { 0 } else { self.rng.random_range(min_size..=max_size) };
        self.sample(pool, size)
    }

    fn next_team(
        &mut self,
        particle: &Particle,
        global_best: &[String],
        pool: &[String],
        min_size: usize,
        max_size: usize,
    ) -> Vec<String> {
        let inertia_count = (self.settings.inertia * particle.team.len() as f64) as usize;
        let r1: f64 = self.rng.random();
        let r2: f64 = self.rng.random();
        let cognitive_count =
            (self.settings.cognitive * r1 * particle.best_team.len() as f64) as usize;
        let social_count = (self.settings.social * r2 * global_best.len() as f64) as usize;

        let mut team = self.sample(&particle.team, inertia_count);
        self.borrow_from(&mut team, &particle.best_team, cognitive_count);
        self.borrow_from(&mut team, global_best, social_count);

        self.enforce_size(team, pool, min_size, max_size)
    }

    /// Append up to `count` members of `source` not already on `team`.
    fn borrow_from(&mut self, team: &mut Vec<String>, source: &[String], count: usize) {
        let taken: BTreeSet<&String> = team.iter().collect();
        let candidates: Vec<String> =
            source.iter().filter(|a| !taken.contains(a)).cloned().collect();
        let picked = self.sample(&candidates, count);
        team.extend(picked);
    }

    fn enforce_size(
        &mut self,
        mut team: Vec<String>,
        pool: &[String],
        min_size: usize,
        max_size: usize,
    ) -> Vec<String> {
        if team.len() < min_size {
            let needed = min_size - team.len();
            self.borrow_from(&mut team, pool, needed);
        }

        if team.len() > max_size {
            let mut keep: Vec<usize> =
                index::sample(&mut self.rng, team.len(), max_size).into_iter().collect();
            keep.sort_unstable();
            team = keep.into_iter().map(|i| team[i].clone()).collect();
        }

        if team.is_empty() && max_size >= 1 {
            let size = min_size.max(1).min(max_size);
            team = self.sample(pool, size);
        }

        team
    }

    /// Draw `count` distinct elements (clipped to `from.len()`), in draw order.
    fn sample(&mut self, from: &[String], count: usize) -> Vec<String> {
        let count = count.min(from.len());
        index::sample(&mut self.rng, from.len(), count)
            .into_iter()
            .map(|i| from[i].clone())
            .collect()
    }
}

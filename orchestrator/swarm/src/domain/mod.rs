// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure team-formation logic. No I/O and no async.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`fitness`] | `InclusiveFitnessSwarm`, `TeamOutcome` |
//! | [`pso`] | `ParticleSwarmOptimizer` |
//! | [`capability_map`] | capability inference, fallback teams, business profiles |

pub mod capability_map;
pub mod fitness;
pub mod pso;

pub use fitness::{relatedness, InclusiveFitnessSwarm, TeamOutcome};
pub use pso::ParticleSwarmOptimizer;

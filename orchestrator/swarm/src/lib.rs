// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `kinswarm-swarm`: Team Formation and Coordination
//!
//! Forms agent teams with a kin-selection fitness model searched by a
//! discrete particle swarm, checks them against an external validation
//! port, and dispatches them concurrently.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `InclusiveFitnessSwarm`, `ParticleSwarmOptimizer`, capability tables |
//! | [`application`] | Application | `SwarmCoordinator`, `CapabilityCoverageValidator` |
//!
//! ## Key Concepts
//!
//! - **Genotype**: cooperation group derived from an agent's role. Agents of
//!   the same genotype are kin and share in each other's rewards.
//! - **Retry with reseed**: a team rejected by validation is re-optimized
//!   with the next seed, up to `max_retries` attempts.
//! - **Fallback**: when every attempt is rejected, a deterministic
//!   capability-map team is returned instead of an error.

pub mod application;
pub mod domain;

pub use application::*;
pub use domain::*;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Application Layer
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`coordinator`] | `SwarmCoordinator`, `CoordinatorConfig`, `TeamPerformanceReport` |
//! | [`team_validator`] | `CapabilityCoverageValidator` |

pub mod coordinator;
pub mod team_validator;

pub use coordinator::{
    attempt_seed, team_key, CoordinatorConfig, EvolutionDecision, OptimizationFailure,
    SwarmCoordinator, TeamPerformance, TeamPerformanceReport,
};
pub use team_validator::CapabilityCoverageValidator;

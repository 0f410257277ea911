// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Core Domain Layer
//!
//! Pure domain types for team formation and plan validation. No I/O
//! dependencies apart from configuration file loading.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `Agent`, `GenotypeGroup`, `AgentRegistry`, `AgentCapability` |
//! | [`task`] | `Task`, `TaskDag`, `TaskRequirement` |
//! | [`plan`] | `RoutingPlan` |
//! | [`validation`] | `ValidationError`, `SecurityViolation`, `ValidationResult` |
//! | [`execution`] | `TeamExecutionResult`, `ExecutionRecord`, `ExecutionFailure` |
//! | [`ports`] | `ValidationPort`, `TaskRouter`, `WorkerExecutor` |
//! | [`swarm_config`] | `SwarmConfigManifest` and tuning settings |

pub mod agent;
pub mod execution;
pub mod plan;
pub mod ports;
pub mod swarm_config;
pub mod task;
pub mod validation;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `kinswarm-core`: Team Formation Domain and Plan Validation
//!
//! Domain model shared by the optimizer, the coordinator and the CLI, plus
//! the Agent-Oriented Planning (AOP) validator for task routing plans.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | Agents, tasks, plans, verdicts, ports, configuration |
//! | [`application`] | Application | `PlanValidator`, `CapabilityRouter` |

pub mod domain;
pub mod application;

pub use domain::*;

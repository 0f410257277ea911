// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application services of the core crate.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Plan validation and capability-based routing over the domain model

pub mod plan_validator;
pub mod router;

pub use plan_validator::{jaccard_similarity, PlanValidator};
pub use router::CapabilityRouter;

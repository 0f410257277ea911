// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Validation Domain
//!
//! Error taxonomy and verdict types shared by team formation and plan
//! validation.
//!
//! | Type | Raised / produced when |
//! |------|------------------------|
//! | `ValidationError` | An invariant is violated at construction time. Never retried. |
//! | `SecurityViolation` | A task DAG has a cycle or exceeds depth / size limits |
//! | `ValidationResult` | Outcome of validating a `RoutingPlan` (AOP principles) |
//! | `TeamValidation` | Verdict of a `ValidationPort` on a proposed team |
//!
//! Plan validation never fails with an error: every violated principle is
//! reported as an issue on the `ValidationResult` and the checks keep running.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Agent list must not be empty")]
    EmptyAgentList,

    #[error("Duplicate agent name '{0}'")]
    DuplicateAgent(String),

    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("Invalid team size range: min {min} exceeds max {max}")]
    InvertedTeamSize { min: usize, max: usize },

    #[error("Task priority must be a finite non-negative number, got {0}")]
    InvalidPriority(f64),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Structural safety breach in a task DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SecurityViolation {
    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("DAG depth {depth} exceeds maximum {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("DAG has {count} tasks, exceeding maximum {max}")]
    TooManyNodes { count: usize, max: usize },
}

/// Result of validating a routing plan against a task DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub solvability_passed: bool,
    pub completeness_passed: bool,
    pub redundancy_passed: bool,
    /// `None` when no budget was requested.
    pub budget_passed: Option<bool>,
    pub security_passed: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    /// Weighted plan quality in `[0, 1]`; present only when `passed`.
    pub quality_score: Option<f64>,
}

impl ValidationResult {
    pub fn summary(&self) -> String {
        match (self.passed, self.quality_score) {
            (true, Some(score)) => format!(
                "plan passed with quality {:.3} ({} warnings)",
                score,
                self.warnings.len()
            ),
            _ => format!(
                "plan failed with {} issues ({} warnings)",
                self.issues.len(),
                self.warnings.len()
            ),
        }
    }
}

/// Verdict returned by a `ValidationPort` for a proposed team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl TeamValidation {
    pub fn accept() -> Self {
        Self { is_valid: true, reasons: Vec::new() }
    }

    pub fn reject(reasons: Vec<String>) -> Self {
        Self { is_valid: false, reasons }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Collaborator ports.
//!
//! The optimizer and coordinator only ever see these traits. Concrete
//! capability maps, ML routers and RPC connectors live behind them.
//!
//! | Port | Phase | Shape |
//! |------|-------|-------|
//! | `ValidationPort` | optimization (sync) | team verdict |
//! | `TaskRouter` | dispatch (sync) | `RoutingPlan` for sub-tasks |
//! | `WorkerExecutor` | dispatch (async) | one sub-task on one agent |

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::execution::{ExecutionFailure, WorkerOutput};
use crate::domain::plan::RoutingPlan;
use crate::domain::task::Task;
use crate::domain::validation::TeamValidation;

/// External check applied to every team the optimizer proposes.
pub trait ValidationPort: Send + Sync {
    fn validate_team_composition(
        &self,
        agent_names: &[String],
        task_type: &str,
        required_capabilities: &BTreeSet<String>,
        required_security_level: &str,
    ) -> TeamValidation;
}

/// Optional second opinion on which agent should take each sub-task.
pub trait TaskRouter: Send + Sync {
    fn route_tasks(&self, tasks: &[Task]) -> RoutingPlan;
}

/// Runs one sub-task on one agent. Implementations must be cancel-safe:
/// the coordinator drops the future when the team deadline expires.
#[async_trait]
pub trait WorkerExecutor: Send + Sync {
    async fn execute(
        &self,
        agent_name: &str,
        subtask: &Task,
    ) -> Result<WorkerOutput, ExecutionFailure>;
}

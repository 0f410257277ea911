// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Dry-run worker
//!
//! `WorkerExecutor` used by `kinswarm team execute`. It performs no work and
//! echoes the sub-task assignment back as the member output, so a team can be
//! dispatched end to end without a real agent connector.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use kinswarm_core::domain::execution::{ExecutionFailure, WorkerOutput};
use kinswarm_core::domain::ports::WorkerExecutor;
use kinswarm_core::domain::task::Task;

#[derive(Debug, Default, Clone)]
pub struct DryRunExecutor;

#[async_trait]
impl WorkerExecutor for DryRunExecutor {
    async fn execute(
        &self,
        agent_name: &str,
        subtask: &Task,
    ) -> Result<WorkerOutput, ExecutionFailure> {
        debug!(agent = agent_name, subtask_id = %subtask.task_id, "Dry-run dispatch");
        Ok(WorkerOutput {
            output: json!({
                "dry_run": true,
                "agent": agent_name,
                "subtask_id": subtask.task_id,
                "role": subtask.metadata.get("team_role"),
                "description": subtask.description,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_echoes_assignment() {
        let subtask = Task::new("t::qa", "review", "check it")
            .with_metadata("team_role", json!("qa engineer"));
        let output = DryRunExecutor.execute("qa", &subtask).await.unwrap().output;
        assert_eq!(output["agent"], "qa");
        assert_eq!(output["role"], "qa engineer");
        assert_eq!(output["dry_run"], true);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Team execution records.
//!
//! Every member of a dispatched team resolves to exactly one terminal
//! `MemberStatus`, including members that were still running when the team
//! deadline expired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure of a single member task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    #[error("Member task failed: {0}")]
    Error(String),
    #[error("Member task was cancelled")]
    Cancelled,
    #[error("Member task timed out after {0:?}")]
    Timeout(Duration),
}

/// Output returned by a worker for one sub-task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerOutput {
    pub output: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Completed,
    Error,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberResult {
    pub status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemberResult {
    pub fn completed(output: serde_json::Value) -> Self {
        Self { status: MemberStatus::Completed, output: Some(output), error: None }
    }

    pub fn from_failure(failure: &ExecutionFailure) -> Self {
        let status = match failure {
            ExecutionFailure::Cancelled => MemberStatus::Cancelled,
            ExecutionFailure::Error(_) | ExecutionFailure::Timeout(_) => MemberStatus::Error,
        };
        Self { status, output: None, error: Some(failure.to_string()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamExecutionStatus {
    Completed,
    Partial,
    Failed,
    Timeout,
}

impl TeamExecutionStatus {
    /// Aggregate member outcomes: all completed, some completed, or none.
    pub fn aggregate<'a>(statuses: impl IntoIterator<Item = &'a MemberStatus>) -> Self {
        let (mut total, mut completed) = (0usize, 0usize);
        for status in statuses {
            total += 1;
            if *status == MemberStatus::Completed {
                completed += 1;
            }
        }

        match completed {
            0 => TeamExecutionStatus::Failed,
            c if c == total => TeamExecutionStatus::Completed,
            _ => TeamExecutionStatus::Partial,
        }
    }

    /// Score fed into the smoothed team performance.
    pub fn score(&self) -> f64 {
        match self {
            TeamExecutionStatus::Completed => 1.0,
            TeamExecutionStatus::Partial => 0.5,
            TeamExecutionStatus::Failed | TeamExecutionStatus::Timeout => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamExecutionStatus::Completed => "completed",
            TeamExecutionStatus::Partial => "partial",
            TeamExecutionStatus::Failed => "failed",
            TeamExecutionStatus::Timeout => "timeout",
        }
    }
}

/// Aggregated result of running one task with a team.
///
/// On `Timeout`, `results` is empty: no partial outputs are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExecutionResult {
    pub execution_id: ExecutionId,
    pub task_id: String,
    pub team: Vec<String>,
    pub status: TeamExecutionStatus,
    pub results: BTreeMap<String, MemberResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Entry appended to the coordinator's execution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub task_id: String,
    pub team: Vec<String>,
    pub status: TeamExecutionStatus,
    /// Terminal status of every member, timeouts included.
    pub member_statuses: BTreeMap<String, MemberStatus>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_status() {
        use MemberStatus::*;
        assert_eq!(
            TeamExecutionStatus::aggregate(&[Completed, Completed]),
            TeamExecutionStatus::Completed
        );
        assert_eq!(
            TeamExecutionStatus::aggregate(&[Completed, Error]),
            TeamExecutionStatus::Partial
        );
        assert_eq!(
            TeamExecutionStatus::aggregate(&[Cancelled, Error]),
            TeamExecutionStatus::Failed
        );
        assert_eq!(
            TeamExecutionStatus::aggregate(&Vec::<MemberStatus>::new()),
            TeamExecutionStatus::Failed
        );
    }

    #[test]
    fn test_status_scores() {
        assert_eq!(TeamExecutionStatus::Completed.score(), 1.0);
        assert_eq!(TeamExecutionStatus::Partial.score(), 0.5);
        assert_eq!(TeamExecutionStatus::Failed.score(), 0.0);
        assert_eq!(TeamExecutionStatus::Timeout.score(), 0.0);
    }

    #[test]
    fn test_member_result_from_failure() {
        let cancelled = MemberResult::from_failure(&ExecutionFailure::Cancelled);
        assert_eq!(cancelled.status, MemberStatus::Cancelled);

        let errored = MemberResult::from_failure(&ExecutionFailure::Error("boom".to_string()));
        assert_eq!(errored.status, MemberStatus::Error);
        assert!(errored.error.unwrap().contains("boom"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TeamExecutionStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}

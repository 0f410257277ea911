// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Team dispatch: status aggregation, deadline handling, router consultation,
//! performance bookkeeping and team evolution.

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kinswarm_core::domain::agent::Agent;
use kinswarm_core::domain::execution::{
    ExecutionFailure, MemberStatus, TeamExecutionStatus, WorkerOutput,
};
use kinswarm_core::domain::plan::RoutingPlan;
use kinswarm_core::domain::ports::{TaskRouter, ValidationPort, WorkerExecutor};
use kinswarm_core::domain::swarm_config::CoordinatorSettings;
use kinswarm_core::domain::task::Task;
use kinswarm_core::domain::validation::{TeamValidation, ValidationError};
use kinswarm_swarm::application::{CoordinatorConfig, SwarmCoordinator};
use serde_json::json;

// ── Test doubles ─────────────────────────────────────────────────────────────

struct AcceptAll;

impl ValidationPort for AcceptAll {
    fn validate_team_composition(
        &self,
        _: &[String],
        _: &str,
        _: &BTreeSet<String>,
        _: &str,
    ) -> TeamValidation {
        TeamValidation::accept()
    }
}

/// Per-agent scripted behaviour. Agents without a script succeed at once.
#[derive(Clone)]
enum Script {
    Fail(&'static str),
    Sleep(Duration),
    Hang,
}

#[derive(Default)]
struct ScriptedExecutor {
    scripts: BTreeMap<String, Script>,
    seen: Mutex<Vec<Task>>,
}

impl ScriptedExecutor {
    fn with(mut self, agent: &str, script: Script) -> Self {
        self.scripts.insert(agent.to_string(), script);
        self
    }
}

#[async_trait]
impl WorkerExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        agent_name: &str,
        subtask: &Task,
    ) -> Result<WorkerOutput, ExecutionFailure> {
        self.seen.lock().push(subtask.clone());
        match self.scripts.get(agent_name).cloned() {
            Some(Script::Fail(reason)) => Err(ExecutionFailure::Error(reason.to_string())),
            Some(Script::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(WorkerOutput { output: json!({ "agent": agent_name, "slept": true }) })
            }
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(WorkerOutput { output: json!({ "agent": agent_name }) }),
        }
    }
}

/// Routes every sub-task to one fixed agent.
struct FixedRouter(&'static str);

impl TaskRouter for FixedRouter {
    fn route_tasks(&self, tasks: &[Task]) -> RoutingPlan {
        tasks.iter().fold(RoutingPlan::new(), |plan, t| plan.assign(t.task_id.clone(), self.0))
    }
}

fn agents() -> Vec<Agent> {
    vec![
        Agent::new("builder", "builder", ["coding"]),
        Agent::new("qa", "qa engineer", ["testing"]),
        Agent::new("deploy", "devops", ["deployment"]),
        Agent::new("seo", "seo specialist", ["seo"]),
    ]
}

fn coordinator(executor: Arc<ScriptedExecutor>) -> SwarmCoordinator {
    SwarmCoordinator::new(agents(), CoordinatorConfig::default(), Arc::new(AcceptAll), executor)
        .unwrap()
}

fn team(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn task() -> Task {
    Task::new("release-1", "release", "Ship version 1").with_metadata("priority", json!(2.0))
}

// ── Status aggregation ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_all_members_complete() {
    let executor = Arc::new(ScriptedExecutor::default());
    let coordinator = coordinator(executor.clone());
    let result = coordinator.execute_team_task(&task(), &team(&["builder", "qa"])).await.unwrap();

    assert_eq!(result.status, TeamExecutionStatus::Completed);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results["qa"].output, Some(json!({ "agent": "qa" })));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_one_failure_gives_partial() {
    let executor = Arc::new(ScriptedExecutor::default().with("qa", Script::Fail("flaky suite")));
    let coordinator = coordinator(executor);
    let result = coordinator
        .execute_team_task(&task(), &team(&["builder", "qa", "deploy"]))
        .await
        .unwrap();

    assert_eq!(result.status, TeamExecutionStatus::Partial);
    assert_eq!(result.results["qa"].status, MemberStatus::Error);
    assert!(result.results["qa"].error.as_deref().unwrap().contains("flaky suite"));
    assert_eq!(result.results["builder"].status, MemberStatus::Completed);
}

#[tokio::test]
async fn test_all_failures_give_failed() {
    let executor = Arc::new(
        ScriptedExecutor::default()
            .with("builder", Script::Fail("a"))
            .with("qa", Script::Fail("b")),
    );
    let result = coordinator(executor)
        .execute_team_task(&task(), &team(&["builder", "qa"]))
        .await
        .unwrap();
    assert_eq!(result.status, TeamExecutionStatus::Failed);
}

#[tokio::test]
async fn test_empty_team_fails() {
    let coordinator = coordinator(Arc::new(ScriptedExecutor::default()));
    let result = coordinator.execute_team_task(&task(), &[]).await.unwrap();
    assert_eq!(result.status, TeamExecutionStatus::Failed);
    assert!(result.results.is_empty());
}

#[tokio::test]
async fn test_repeated_member_is_rejected_before_dispatch() {
    let executor = Arc::new(ScriptedExecutor::default());
    let coordinator = coordinator(executor.clone());
    let result = coordinator.execute_team_task(&task(), &team(&["qa", "builder", "qa"])).await;

    assert_eq!(result, Err(ValidationError::DuplicateAgent("qa".to_string())));
    assert!(executor.seen.lock().is_empty());
    assert!(coordinator.execution_history().is_empty());
}

// ── Deadline ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_deadline_expiry_times_out_without_partial_results() {
    let executor = Arc::new(
        ScriptedExecutor::default()
            .with("qa", Script::Sleep(Duration::from_secs(10)))
            .with("deploy", Script::Hang),
    );
    let coordinator = coordinator(executor);
    let members = team(&["builder", "qa", "deploy"]);
    let result = coordinator.execute_team_task(&task(), &members).await.unwrap();

    assert_eq!(result.status, TeamExecutionStatus::Timeout);
    assert!(result.results.is_empty());
    assert!(result.error.unwrap().contains("300s"));

    // every member still resolves to a terminal status
    let history = coordinator.execution_history();
    assert_eq!(history.len(), 1);
    let statuses = &history[0].member_statuses;
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses["builder"], MemberStatus::Completed);
    assert_eq!(statuses["qa"], MemberStatus::Completed);
    assert_eq!(statuses["deploy"], MemberStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_configured_deadline_is_honoured() {
    let config = CoordinatorConfig {
        coordinator: CoordinatorSettings {
            execution_timeout_secs: 5,
            ..CoordinatorSettings::default()
        },
        ..CoordinatorConfig::default()
    };
    let executor =
        Arc::new(ScriptedExecutor::default().with("qa", Script::Sleep(Duration::from_secs(6))));
    let coordinator =
        SwarmCoordinator::new(agents(), config, Arc::new(AcceptAll), executor).unwrap();

    let result = coordinator.execute_team_task(&task(), &team(&["builder", "qa"])).await.unwrap();
    assert_eq!(result.status, TeamExecutionStatus::Timeout);
    assert_eq!(coordinator.execution_history()[0].member_statuses["qa"], MemberStatus::Cancelled);
}

// ── Sub-tasks and routing ────────────────────────────────────────────────────

#[tokio::test]
async fn test_subtasks_carry_role_and_parent() {
    let executor = Arc::new(ScriptedExecutor::default());
    let coordinator = coordinator(executor.clone());
    coordinator.execute_team_task(&task(), &team(&["deploy"])).await.unwrap();

    let seen = executor.seen.lock();
    assert_eq!(seen.len(), 1);
    let subtask = &seen[0];
    assert_eq!(subtask.task_id, "release-1::deploy");
    assert_eq!(subtask.metadata["team_role"], json!("devops"));
    assert_eq!(subtask.metadata["parent_task_id"], json!("release-1"));
    assert_eq!(subtask.priority(), 2.0);
}

#[tokio::test]
async fn test_router_disagreement_keeps_team_assignment() {
    let executor = Arc::new(ScriptedExecutor::default());
    let coordinator = coordinator(executor.clone()).with_router(Arc::new(FixedRouter("seo")));
    let result = coordinator.execute_team_task(&task(), &team(&["builder", "qa"])).await.unwrap();

    assert_eq!(result.status, TeamExecutionStatus::Completed);
    let keys: Vec<&String> = result.results.keys().collect();
    assert_eq!(keys, vec!["builder", "qa"]);
    assert!(executor.seen.lock().iter().all(|t| !t.task_id.ends_with("seo")));
}

// ── Performance and evolution ────────────────────────────────────────────────

#[tokio::test]
async fn test_performance_is_smoothed_per_team() {
    let executor = Arc::new(ScriptedExecutor::default().with("qa", Script::Fail("x")));
    let coordinator = coordinator(executor);

    coordinator.execute_team_task(&task(), &team(&["builder", "deploy"])).await.unwrap();
    coordinator.execute_team_task(&task(), &team(&["deploy", "qa"])).await.unwrap();
    coordinator.execute_team_task(&task(), &team(&["deploy", "builder"])).await.unwrap();

    let report = coordinator.get_team_performance_history(&team(&["builder", "deploy"]));
    assert_eq!(report.execution_count, 2);
    assert!((report.performance - 1.0).abs() < 1e-9);
    assert_eq!(report.success_rate, 1.0);

    let report = coordinator.get_team_performance_history(&team(&["qa", "deploy"]));
    assert_eq!(report.execution_count, 1);
    assert_eq!(report.performance, 0.5);
    assert_eq!(report.success_rate, 0.0);

    assert_eq!(coordinator.execution_history().len(), 3);
}

#[test]
fn test_report_for_unseen_team_has_structure_metrics() {
    let coordinator = coordinator(Arc::new(ScriptedExecutor::default()));

    // builder, qa and deploy share a genotype; seo does not
    let report = coordinator.get_team_performance_history(&team(&["builder", "qa", "seo"]));
    assert_eq!(report.execution_count, 0);
    assert_eq!(report.performance, 0.0);
    assert!((report.diversity - 2.0 / 5.0).abs() < 1e-9);
    assert!((report.cooperation - 1.0 / 3.0).abs() < 1e-9);

    let single = coordinator.get_team_performance_history(&team(&["seo"]));
    assert_eq!(single.cooperation, 0.0);
}

#[test]
fn test_evolve_team_threshold() {
    let coordinator = coordinator(Arc::new(ScriptedExecutor::default()));
    let members = team(&["builder", "qa"]);

    let keep = coordinator.evolve_team(&members, 0.9);
    assert!(!keep.reoptimize);
    assert_eq!(keep.team, members);

    let boundary = coordinator.evolve_team(&members, 0.7);
    assert!(!boundary.reoptimize);

    let flagged = coordinator.evolve_team(&members, 0.2);
    assert!(flagged.reoptimize);
    assert_eq!(flagged.team, members);
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Plan validation properties across a set of plan shapes: cycles always fail
//! security, completeness tracks DAG coverage, and the quality score stays in
//! `[0, 1]`.

use kinswarm_core::application::PlanValidator;
use kinswarm_core::domain::agent::{AgentCapability, CostTier};
use kinswarm_core::domain::plan::RoutingPlan;
use kinswarm_core::domain::swarm_config::{SwarmConfigManifest, ValidatorSettings};
use kinswarm_core::domain::task::{Task, TaskDag};
use serde_json::json;

fn validator() -> PlanValidator {
    PlanValidator::new(
        vec![
            AgentCapability::new(
                "builder",
                ["code", "api"],
                ["rust", "sql"],
                CostTier::Expensive,
                0.9,
                120.0,
            )
            .unwrap(),
            AgentCapability::new("qa", ["test"], ["rust"], CostTier::Cheap, 0.8, 30.0).unwrap(),
            AgentCapability::new(
                "writer",
                ["docs"],
                Vec::<String>::new(),
                CostTier::Medium,
                0.95,
                45.0,
            )
            .unwrap(),
        ],
        ValidatorSettings::default(),
    )
    .unwrap()
}

fn chain(len: usize) -> TaskDag {
    TaskDag::from_tasks((0..len).map(|i| {
        let task = Task::new(format!("t{}", i), "code", format!("step {}", i));
        if i == 0 {
            task
        } else {
            task.with_dependencies([format!("t{}", i - 1)])
        }
    }))
}

fn assign_all(dag: &TaskDag, agent: &str) -> RoutingPlan {
    dag.task_ids().fold(RoutingPlan::new(), |plan, id| plan.assign(id.clone(), agent))
}

// ── Security ─────────────────────────────────────────────────────────────────

#[test]
fn test_any_cycle_fails_security() {
    for len in 2..6 {
        let mut tasks: Vec<Task> = chain(len).tasks().cloned().collect();
        tasks[0] = tasks[0].clone().with_dependencies([format!("t{}", len - 1)]);
        let dag = TaskDag::from_tasks(tasks);
        let result = validator().validate(&assign_all(&dag, "builder"), &dag, None);

        assert!(!result.security_passed, "cycle of length {} passed security", len);
        assert!(!result.passed);
        assert!(result.quality_score.is_none());
        assert!(result.issues.iter().any(|i| i.contains("->")));
    }
}

#[test]
fn test_depth_limit() {
    let dag = chain(11);
    let result = validator().validate(&assign_all(&dag, "builder"), &dag, None);
    assert!(!result.security_passed);

    let dag = chain(6);
    let result = validator().validate(&assign_all(&dag, "builder"), &dag, None);
    assert!(result.security_passed);
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_node_count_limit() {
    let flat = |count: usize| {
        TaskDag::from_tasks((0..count).map(|i| Task::new(format!("t{}", i), "code", "step")))
    };

    let result = validator().validate(&RoutingPlan::new(), &flat(60), None);
    assert!(result.security_passed);
    assert!(result.warnings.iter().any(|w| w.contains("60 tasks")));

    let result = validator().validate(&RoutingPlan::new(), &flat(101), None);
    assert!(!result.security_passed);
    assert!(result.issues.iter().any(|i| i.contains("101 tasks, exceeding maximum 100")));
}

#[test]
fn test_very_long_chain_reports_node_limit() {
    let dag = chain(20_000);
    let result = validator().validate(&RoutingPlan::new(), &dag, None);

    assert!(!result.security_passed);
    assert!(!result.passed);
    assert!(result.issues.iter().any(|i| i.contains("20000 tasks, exceeding maximum 100")));
    assert!(!result.issues.iter().any(|i| i.contains("cycle")));
}

// ── Completeness ─────────────────────────────────────────────────────────────

#[test]
fn test_completeness_iff_every_task_assigned() {
    let dag = chain(4);
    for skipped in 0..4 {
        let plan = dag
            .task_ids()
            .filter(|id| id.as_str() != format!("t{}", skipped))
            .fold(RoutingPlan::new(), |plan, id| plan.assign(id.clone(), "builder"));
        let result = validator().validate(&plan, &dag, None);
        assert!(!result.completeness_passed);
        assert!(!result.passed);
    }
    assert!(validator().validate(&assign_all(&dag, "builder"), &dag, None).completeness_passed);
}

// ── Redundancy ───────────────────────────────────────────────────────────────

#[test]
fn test_near_identical_descriptions_fail_redundancy() {
    let dag = TaskDag::from_tasks([
        Task::new("a", "code", "build the login api"),
        Task::new("b", "code", "build the login api now"),
    ]);
    let plan = assign_all(&dag, "builder").with_estimated_cost(5.0);
    let result = validator().validate(&plan, &dag, None);

    assert!(!result.redundancy_passed);
    assert!(!result.passed);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("high-confidence duplicate tasks 'a' and 'b' (similarity 0.80)")));
}

#[test]
fn test_shared_agent_with_distinct_work_keeps_redundancy() {
    let dag = TaskDag::from_tasks([
        Task::new("a", "code", "build the login api"),
        Task::new("b", "code", "migrate billing tables"),
    ]);
    let result = validator().validate(&assign_all(&dag, "builder"), &dag, None);

    assert!(result.redundancy_passed);
    assert!(result.warnings.iter().any(|w| w.contains("handles 2 'code' tasks")));
}

// ── Quality score ────────────────────────────────────────────────────────────

#[test]
fn test_quality_score_bounded_for_passing_plans() {
    let shapes: Vec<(TaskDag, &str)> = vec![
        (chain(1), "builder"),
        (chain(5), "builder"),
        (
            TaskDag::from_tasks([
                Task::new("a", "test", "run the suite")
                    .with_metadata("required_skills", json!(["rust"])),
                Task::new("b", "docs", "write the changelog"),
            ]),
            "",
        ),
    ];

    for (dag, agent) in shapes {
        let plan = if agent.is_empty() {
            RoutingPlan::new().assign("a", "qa").assign("b", "writer")
        } else {
            assign_all(&dag, agent)
        };
        let result = validator().validate(&plan, &dag, Some(1_000.0));
        // no estimated cost means the budget check fails
        assert_eq!(result.budget_passed, Some(false));

        let plan = plan.with_estimated_cost(10.0);
        let result = validator().validate(&plan, &dag, Some(1_000.0));
        assert!(result.passed, "{}", result.summary());
        let score = result.quality_score.unwrap();
        assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }
}

#[test]
fn test_default_config_capabilities_validate_plans() {
    let manifest = SwarmConfigManifest::default();
    let validator =
        PlanValidator::new(manifest.spec.capabilities.clone(), manifest.spec.validator.clone())
            .unwrap();
    let dag = TaskDag::from_tasks([Task::new("t1", "code", "build the api")]);
    let plan = RoutingPlan::new().assign("t1", "builder");
    let result = validator.validate(&plan, &dag, None);
    assert!(result.passed, "{}", result.summary());
}

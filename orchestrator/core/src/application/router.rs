// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Capability Router
//!
//! Default `TaskRouter`: assigns each task to the registered agent that
//! supports its type and holds every required skill. Among candidates the
//! highest success rate wins, then the cheaper cost tier, then the name.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::agent::AgentCapability;
use crate::domain::plan::RoutingPlan;
use crate::domain::ports::TaskRouter;
use crate::domain::task::Task;

pub struct CapabilityRouter {
    capabilities: BTreeMap<String, AgentCapability>,
}

impl CapabilityRouter {
    pub fn new(capabilities: impl IntoIterator<Item = AgentCapability>) -> Self {
        Self {
            capabilities: capabilities
                .into_iter()
                .map(|c| (c.agent_name.clone(), c))
                .collect(),
        }
    }

    fn best_agent(&self, task: &Task) -> Option<&AgentCapability> {
        let required = task.required_skills();
        self.capabilities
            .values()
            .filter(|c| c.supports(&task.task_type))
            .filter(|c| required.is_subset(&c.skills))
            .min_by(|a, b| {
                b.success_rate
                    .partial_cmp(&a.success_rate)
                    .unwrap_or(Ordering::Equal)
                    .then(a.cost_tier.cmp(&b.cost_tier))
                    .then(a.agent_name.cmp(&b.agent_name))
            })
    }
}

impl TaskRouter for CapabilityRouter {
    fn route_tasks(&self, tasks: &[Task]) -> RoutingPlan {
        let mut plan = RoutingPlan::new();
        for task in tasks {
            match self.best_agent(task) {
                Some(capability) => {
                    plan.assignments
                        .insert(task.task_id.clone(), capability.agent_name.clone());
                }
                None => {
                    debug!(
                        task_id = %task.task_id,
                        task_type = %task.task_type,
                        "No agent can take task"
                    );
                    plan.unassigned_tasks.push(task.task_id.clone());
                }
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::CostTier;
    use serde_json::json;

    fn router() -> CapabilityRouter {
        CapabilityRouter::new(vec![
            AgentCapability::new("builder", ["code"], ["rust"], CostTier::Expensive, 0.8, 60.0)
                .unwrap(),
            AgentCapability::new("junior", ["code"], ["rust", "go"], CostTier::Cheap, 0.8, 90.0)
                .unwrap(),
            AgentCapability::new("senior", ["code"], ["rust"], CostTier::Expensive, 0.95, 30.0)
                .unwrap(),
        ])
    }

    #[test]
    fn test_routes_to_highest_success_rate() {
        let plan = router().route_tasks(&[Task::new("t1", "code", "x")]);
        assert_eq!(plan.agent_for("t1"), Some("senior"));
    }

    #[test]
    fn test_required_skills_filter_candidates() {
        let task = Task::new("t1", "code", "x").with_metadata("required_skills", json!(["go"]));
        let plan = router().route_tasks(&[task]);
        assert_eq!(plan.agent_for("t1"), Some("junior"));
    }

    #[test]
    fn test_ties_prefer_cheaper_tier() {
        let router = CapabilityRouter::new(vec![
            AgentCapability::new("a", ["code"], Vec::<String>::new(), CostTier::Expensive, 0.8, 1.0)
                .unwrap(),
            AgentCapability::new("b", ["code"], Vec::<String>::new(), CostTier::Cheap, 0.8, 1.0)
                .unwrap(),
        ]);
        let plan = router.route_tasks(&[Task::new("t1", "code", "x")]);
        assert_eq!(plan.agent_for("t1"), Some("b"));
    }

    #[test]
    fn test_unroutable_tasks_are_unassigned() {
        let plan = router().route_tasks(&[Task::new("t1", "marketing", "x")]);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unassigned_tasks, vec!["t1".to_string()]);
    }
}

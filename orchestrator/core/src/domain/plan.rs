// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Routing plans: which agent takes which task.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata key holding a pre-computed plan cost.
pub const ESTIMATED_COST_KEY: &str = "estimated_cost";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingPlan {
    /// task_id -> agent_name
    #[serde(default)]
    pub assignments: BTreeMap<String, String>,
    #[serde(default)]
    pub unassigned_tasks: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl RoutingPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(mut self, task_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        self.assignments.insert(task_id.into(), agent_name.into());
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.metadata.insert(ESTIMATED_COST_KEY.to_string(), Value::from(cost));
        self
    }

    pub fn estimated_cost(&self) -> Option<f64> {
        self.metadata.get(ESTIMATED_COST_KEY).and_then(Value::as_f64)
    }

    pub fn agent_for(&self, task_id: &str) -> Option<&str> {
        self.assignments.get(task_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_builder() {
        let plan = RoutingPlan::new().assign("t1", "builder").with_estimated_cost(12.5);
        assert_eq!(plan.agent_for("t1"), Some("builder"));
        assert_eq!(plan.estimated_cost(), Some(12.5));
        assert!(plan.unassigned_tasks.is_empty());
    }

    #[test]
    fn test_plan_deserializes_from_yaml() {
        let yaml =
            "assignments:\n  t1: qa\nunassigned_tasks: [t2]\nmetadata:\n  estimated_cost: 3\n";
        let plan: RoutingPlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(plan.agent_for("t1"), Some("qa"));
        assert_eq!(plan.unassigned_tasks, vec!["t2".to_string()]);
        assert_eq!(plan.estimated_cost(), Some(3.0));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task Domain Model
//!
//! Read-only view of the work a team is formed for.
//!
//! - `Task` is a node of the dependency graph produced by the external planner.
//! - `TaskDag` is the adjacency / topological view the validator inspects.
//! - `TaskRequirement` is what the optimizer searches against.
//!
//! # Design Principles
//!
//! 1. **Immutability:** tasks are never mutated by the core
//! 2. **Self-Validating:** `TaskRequirement::new` enforces its invariants
//! 3. **Deterministic:** all maps are ordered so graph walks are reproducible

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::domain::validation::ValidationError;

/// Metadata key holding the skills a task requires.
pub const REQUIRED_SKILLS_KEY: &str = "required_skills";
/// Metadata key holding the task priority.
pub const PRIORITY_KEY: &str = "priority";
/// Metadata key holding the required security level.
pub const SECURITY_LEVEL_KEY: &str = "security_level";

// ============================================================================
// Entity: Task
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub task_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: task_type.into(),
            description: description.into(),
            dependencies: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Skills declared under `metadata.required_skills`. Non-string entries are ignored.
    pub fn required_skills(&self) -> BTreeSet<String> {
        self.metadata
            .get(REQUIRED_SKILLS_KEY)
            .and_then(Value::as_array)
            .map(|skills| {
                skills
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Priority declared under `metadata.priority`, defaulting to 1.0.
    pub fn priority(&self) -> f64 {
        self.metadata
            .get(PRIORITY_KEY)
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
    }

    /// Security level declared under `metadata.security_level`, defaulting to "standard".
    pub fn security_level(&self) -> String {
        self.metadata
            .get(SECURITY_LEVEL_KEY)
            .and_then(Value::as_str)
            .unwrap_or("standard")
            .to_string()
    }
}

// ============================================================================
// Aggregate: TaskDag
// ============================================================================

/// Dependency graph of tasks, keyed by task id.
///
/// Edges run from a dependency to the task that depends on it. Dependencies
/// naming tasks outside the graph are ignored by every graph walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDag {
    tasks: BTreeMap<String, Task>,
}

impl TaskDag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut dag = Self::new();
        for task in tasks {
            dag.add_task(task);
        }
        dag
    }

    /// Insert a task, replacing any previous task with the same id.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &String> {
        self.tasks.keys()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    fn known_dependencies<'a>(&'a self, task: &'a Task) -> impl Iterator<Item = &'a String> {
        let mut seen = BTreeSet::new();
        task.dependencies
            .iter()
            .filter(move |dep| self.tasks.contains_key(*dep) && seen.insert(*dep))
    }

    /// Dependency -> dependents adjacency list. Every task has an entry.
    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        let mut adjacency: BTreeMap<String, Vec<String>> = self
            .tasks
            .keys()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        for task in self.tasks.values() {
            for dep in self.known_dependencies(task) {
                if let Some(dependents) = adjacency.get_mut(dep) {
                    dependents.push(task.task_id.clone());
                }
            }
        }
        adjacency
    }

    /// Find a dependency cycle and return it as a closed path
    /// (first and last element are the same task).
    ///
    /// Walks with an explicit stack, so chain length is not bounded by the call stack.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let adjacency = self.adjacency();
        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
        let mut path: Vec<&str> = Vec::new();
        // (node, index of the next dependent to explore)
        let mut stack: Vec<(&str, usize)> = Vec::new();

        for root in adjacency.keys() {
            let root = root.as_str();
            if marks.get(root).copied().unwrap_or(Mark::Unvisited) != Mark::Unvisited {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            path.push(root);
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, index) = *frame;
                frame.1 += 1;

                let Some(next) = adjacency.get(node).and_then(|dependents| dependents.get(index))
                else {
                    marks.insert(node, Mark::Done);
                    path.pop();
                    stack.pop();
                    continue;
                };
                let next = next.as_str();

                match marks.get(next).copied().unwrap_or(Mark::Unvisited) {
                    Mark::InProgress => {
                        let start = path.iter().position(|n| *n == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(next.to_string());
                        return Some(cycle);
                    }
                    Mark::Unvisited => {
                        marks.insert(next, Mark::InProgress);
                        path.push(next);
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        None
    }

    /// Kahn ordering; `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let adjacency = self.adjacency();
        let mut in_degree: BTreeMap<&str, usize> = self
            .tasks
            .values()
            .map(|task| (task.task_id.as_str(), self.known_dependencies(task).count()))
            .collect();

        let mut ready: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(id) = ready.pop_front() {
            order.push(id.to_string());
            for dependent in adjacency.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(dependent.as_str());
                    }
                }
            }
        }

        (order.len() == self.tasks.len()).then_some(order)
    }

    /// Number of tasks on the longest dependency chain. `None` when cyclic.
    pub fn critical_path_depth(&self) -> Option<usize> {
        let order = self.topological_order()?;
        let mut depth: BTreeMap<&str, usize> = BTreeMap::new();

        for id in &order {
            let Some(task) = self.tasks.get(id) else { continue };
            let deepest_dep = self
                .known_dependencies(task)
                .filter_map(|dep| depth.get(dep.as_str()).copied())
                .max()
                .unwrap_or(0);
            depth.insert(id.as_str(), deepest_dep + 1);
        }

        Some(depth.values().copied().max().unwrap_or(0))
    }
}

// ============================================================================
// Value Object: TaskRequirement
// ============================================================================

/// What a team must provide for one task.
///
/// # Invariants
/// - `team_size_range.0 <= team_size_range.1`
/// - `priority` is finite and `>= 0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequirement {
    task_id: String,
    required_capabilities: BTreeSet<String>,
    team_size_range: (usize, usize),
    priority: f64,
}

impl TaskRequirement {
    pub fn new<I, S>(
        task_id: impl Into<String>,
        required_capabilities: I,
        team_size_range: (usize, usize),
        priority: f64,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (min, max) = team_size_range;
        if min > max {
            return Err(ValidationError::InvertedTeamSize { min, max });
        }
        if !priority.is_finite() || priority < 0.0 {
            return Err(ValidationError::InvalidPriority(priority));
        }

        Ok(Self {
            task_id: task_id.into(),
            required_capabilities: required_capabilities.into_iter().map(Into::into).collect(),
            team_size_range,
            priority,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn required_capabilities(&self) -> &BTreeSet<String> {
        &self.required_capabilities
    }

    pub fn team_size_range(&self) -> (usize, usize) {
        self.team_size_range
    }

    pub fn min_size(&self) -> usize {
        self.team_size_range.0
    }

    pub fn max_size(&self) -> usize {
        self.team_size_range.1
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }
}

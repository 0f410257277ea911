// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Domain Model
//!
//! Workers that can be placed on a team, the cooperation group ("genotype")
//! each one belongs to, and the registries the optimizer and the plan
//! validator read from.
//!
//! | Type | Description |
//! |------|-------------|
//! | `Agent` | Named worker with a role, genotype and capability set |
//! | `GenotypeGroup` | Kin group derived once from the role string |
//! | `AgentRegistry` | Name-keyed, name-ordered set of agents |
//! | `AgentCapability` | Routing profile consumed by the plan validator |
//!
//! Registries iterate in name order. Seeded optimization runs depend on that
//! ordering to be reproducible.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::validation::ValidationError;

// ============================================================================
// Value Objects: Genotype
// ============================================================================

/// Cooperation group shared by agents that behave as "kin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenotypeGroup {
    CustomerInteraction,
    Infrastructure,
    Content,
    Finance,
    Analysis,
}

/// Number of distinct genotype groups.
pub const GENOTYPE_COUNT: usize = 5;

/// Role keywords, matched case-insensitively as substrings, in table order.
const GENOTYPE_KEYWORDS: &[(GenotypeGroup, &[&str])] = &[
    (
        GenotypeGroup::CustomerInteraction,
        &["marketing", "support", "sales", "customer", "onboarding", "community"],
    ),
    (
        GenotypeGroup::Infrastructure,
        &["builder", "deploy", "devops", "infra", "security", "qa", "monitor", "maintenance"],
    ),
    (
        GenotypeGroup::Content,
        &["content", "seo", "writer", "design", "email", "social"],
    ),
    (
        GenotypeGroup::Finance,
        &["billing", "finance", "pricing", "payment", "legal", "accounting"],
    ),
    (
        GenotypeGroup::Analysis,
        &["analyst", "analytics", "research", "data", "spec", "reflection"],
    ),
];

impl GenotypeGroup {
    /// Classify a role string. Unmatched roles fall into `Analysis`.
    pub fn classify(role: &str) -> Self {
        let role = role.to_lowercase();
        GENOTYPE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| role.contains(k)))
            .map(|(group, _)| *group)
            .unwrap_or(GenotypeGroup::Analysis)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenotypeGroup::CustomerInteraction => "customer_interaction",
            GenotypeGroup::Infrastructure => "infrastructure",
            GenotypeGroup::Content => "content",
            GenotypeGroup::Finance => "finance",
            GenotypeGroup::Analysis => "analysis",
        }
    }
}

impl fmt::Display for GenotypeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entity: Agent
// ============================================================================

/// A worker that can be assigned to a team.
///
/// The genotype is derived from `role` when the agent is constructed and is
/// never recomputed. Only `current_fitness` changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    name: String,
    role: String,
    genotype: GenotypeGroup,
    capabilities: BTreeSet<String>,
    /// Most recent inclusive fitness observed for this agent.
    pub current_fitness: f64,
}

impl Agent {
    pub fn new<I, S>(name: impl Into<String>, role: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let role = role.into();
        Self {
            name: name.into(),
            genotype: GenotypeGroup::classify(&role),
            role,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            current_fitness: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn genotype(&self) -> GenotypeGroup {
        self.genotype
    }

    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Number of `required` capabilities this agent holds.
    pub fn capability_matches<'a, I>(&self, required: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        required
            .into_iter()
            .filter(|c| self.capabilities.contains(*c))
            .count()
    }
}

// ============================================================================
// Aggregate: AgentRegistry
// ============================================================================

/// The fixed set of agents a coordinator works with, keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Agent>,
}

impl AgentRegistry {
    /// Build a registry.
    ///
    /// # Errors
    /// - `ValidationError::EmptyAgentList` when `agents` is empty
    /// - `ValidationError::DuplicateAgent` when two agents share a name
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self, ValidationError> {
        if agents.is_empty() {
            return Err(ValidationError::EmptyAgentList);
        }

        let mut map = BTreeMap::new();
        for agent in agents {
            if map.contains_key(agent.name()) {
                return Err(ValidationError::DuplicateAgent(agent.name().to_string()));
            }
            map.insert(agent.name().to_string(), agent);
        }

        Ok(Self { agents: map })
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent names in registry order.
    pub fn names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Resolve every name in `team`, failing on the first unknown one.
    pub fn resolve<'a>(&'a self, team: &[String]) -> Result<Vec<&'a Agent>, ValidationError> {
        team.iter()
            .map(|name| {
                self.agents
                    .get(name)
                    .ok_or_else(|| ValidationError::UnknownAgent(name.clone()))
            })
            .collect()
    }

    /// Union of the capabilities held by the named agents. Unknown names are skipped.
    pub fn capability_union(&self, team: &[String]) -> BTreeSet<String> {
        team.iter()
            .filter_map(|name| self.agents.get(name))
            .flat_map(|agent| agent.capabilities().iter().cloned())
            .collect()
    }

    /// How many of the named agents fall into each genotype group.
    pub fn genotype_counts(&self, team: &[String]) -> BTreeMap<GenotypeGroup, usize> {
        let mut counts = BTreeMap::new();
        for agent in team.iter().filter_map(|name| self.agents.get(name)) {
            *counts.entry(agent.genotype()).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Value Objects: AgentCapability
// ============================================================================

/// Relative price of running an agent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Cheap,
    #[default]
    Medium,
    Expensive,
}

impl CostTier {
    /// Normalized cost used by plan scoring.
    pub fn weight(&self) -> f64 {
        match self {
            CostTier::Cheap => 0.2,
            CostTier::Medium => 0.5,
            CostTier::Expensive => 0.9,
        }
    }
}

/// Routing profile for one agent, as seen by the plan validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub agent_name: String,
    #[serde(default)]
    pub supported_task_types: BTreeSet<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub cost_tier: CostTier,
    /// Historical success rate in `[0, 1]`.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Average completion time in seconds.
    #[serde(default)]
    pub avg_completion_time: f64,
}

fn default_success_rate() -> f64 {
    0.7
}

impl AgentCapability {
    /// Create a capability entry.
    ///
    /// # Errors
    /// `ValidationError::InvalidParameter` when `success_rate` is outside `[0, 1]`.
    pub fn new<T, S>(
        agent_name: impl Into<String>,
        supported_task_types: T,
        skills: S,
        cost_tier: CostTier,
        success_rate: f64,
        avg_completion_time: f64,
    ) -> Result<Self, ValidationError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let capability = Self {
            agent_name: agent_name.into(),
            supported_task_types: supported_task_types.into_iter().map(Into::into).collect(),
            skills: skills.into_iter().map(Into::into).collect(),
            cost_tier,
            success_rate,
            avg_completion_time,
        };
        capability.validate()?;
        Ok(capability)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(ValidationError::InvalidParameter {
                name: format!("{}.success_rate", self.agent_name),
                reason: format!("{} is outside [0, 1]", self.success_rate),
            });
        }
        Ok(())
    }

    pub fn supports(&self, task_type: &str) -> bool {
        self.supported_task_types.contains(task_type)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Map
//!
//! Static lookup tables used when the optimizer is bypassed or needs input:
//!
//! | Table | Used by |
//! |-------|---------|
//! | Description keywords → capabilities | capability inference for free-text tasks |
//! | Capability → preferred agent | deterministic fallback team |
//! | Business type → capability profile | business team spawning |
//! | Complexity → team size | business team spawning |
//!
//! Every function here is pure: equal inputs always produce equal teams.

use std::collections::BTreeSet;

use kinswarm_core::domain::agent::AgentRegistry;

const DESCRIPTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("coding", &["build", "code", "implement", "develop", "api", "feature", "app"]),
    ("testing", &["test", "qa", "bug", "regression"]),
    ("security", &["security", "secure", "audit", "vulnerab", "compliance"]),
    ("deployment", &["deploy", "release", "ship", "launch", "hosting"]),
    ("monitoring", &["monitor", "uptime", "alert", "observability"]),
    ("ads", &["ads", "advertis", "campaign", "marketing", "promot"]),
    ("social", &["social", "twitter", "instagram", "community"]),
    ("support", &["support", "ticket", "customer", "help"]),
    ("writing", &["write", "blog", "article", "copy", "content", "newsletter"]),
    ("seo", &["seo", "search", "keyword", "ranking"]),
    ("analytics", &["analy", "metric", "dashboard", "report", "insight"]),
    ("research", &["research", "market study", "competitor", "survey"]),
    ("payments", &["payment", "billing", "invoice", "checkout", "subscription", "pricing"]),
];

const PREFERRED_AGENTS: &[(&str, &str)] = &[
    ("coding", "builder"),
    ("architecture", "builder"),
    ("api", "builder"),
    ("testing", "qa"),
    ("security", "qa"),
    ("review", "qa"),
    ("deployment", "deploy"),
    ("monitoring", "deploy"),
    ("infrastructure", "deploy"),
    ("ads", "marketing"),
    ("social", "marketing"),
    ("campaigns", "marketing"),
    ("support", "support"),
    ("onboarding", "support"),
    ("writing", "content"),
    ("editing", "content"),
    ("seo", "seo"),
    ("keywords", "seo"),
    ("analytics", "analyst"),
    ("research", "analyst"),
    ("reporting", "analyst"),
    ("payments", "billing"),
    ("invoicing", "billing"),
    ("pricing", "billing"),
];

const BUSINESS_PROFILES: &[(&str, &[&str])] = &[
    ("ecommerce", &["coding", "payments", "ads", "support", "seo"]),
    ("saas", &["coding", "testing", "deployment", "support", "payments"]),
    ("content", &["writing", "seo", "social", "analytics"]),
    ("marketplace", &["coding", "payments", "support", "security", "ads"]),
    ("consulting", &["research", "analytics", "writing", "support"]),
];

const GENERIC_PROFILE: &[&str] = &["coding", "testing", "deployment", "support"];

/// Team size used when the complexity label is not recognized.
pub const DEFAULT_COMPLEXITY_SIZE: usize = 5;

/// Infer required capabilities from a free-text description, in table order.
pub fn infer_capabilities(description: &str) -> Vec<String> {
    let text = description.to_lowercase();
    DESCRIPTION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(capability, _)| capability.to_string())
        .collect()
}

/// Capability profile for a business type. Unknown types get the generic profile.
pub fn business_profile(business_type: &str) -> Vec<String> {
    let key = business_type.trim().to_lowercase();
    BUSINESS_PROFILES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, caps)| *caps)
        .unwrap_or(GENERIC_PROFILE)
        .iter()
        .map(|c| c.to_string())
        .collect()
}

pub fn team_size_for_complexity(complexity: &str) -> usize {
    match complexity.trim().to_lowercase().as_str() {
        "simple" | "low" => 3,
        "medium" | "moderate" => 5,
        "complex" | "high" => 7,
        _ => DEFAULT_COMPLEXITY_SIZE,
    }
}

/// Agents that can cover `capability`, preferred agent first, then every
/// registered holder in name order.
fn candidates_for<'a>(registry: &'a AgentRegistry, capability: &str) -> Vec<&'a str> {
    let preferred = PREFERRED_AGENTS
        .iter()
        .filter(|(cap, _)| *cap == capability)
        .filter_map(|(_, agent)| registry.get(agent))
        .map(|agent| agent.name());
    let holders = registry
        .agents()
        .filter(|agent| agent.has_capability(capability))
        .map(|agent| agent.name());
    preferred.chain(holders).collect()
}

/// Deterministic fallback team.
///
/// Picks the first unused candidate for each required capability, pads with
/// `default_order` and then the registry in name order, and trims to
/// `team_size`.
pub fn fallback_team(
    registry: &AgentRegistry,
    required_capabilities: &[String],
    team_size: usize,
    default_order: &[String],
) -> Vec<String> {
    let mut team: Vec<String> = Vec::with_capacity(team_size);
    let mut used: BTreeSet<String> = BTreeSet::new();

    for capability in required_capabilities {
        if let Some(agent) = candidates_for(registry, capability)
            .into_iter()
            .find(|name| !used.contains(*name))
        {
            used.insert(agent.to_string());
            team.push(agent.to_string());
        }
    }

    let padding = default_order
        .iter()
        .filter(|name| registry.contains(name))
        .cloned()
        .chain(registry.names());
    for name in padding {
        if team.len() >= team_size {
            break;
        }
        if used.insert(name.clone()) {
            team.push(name);
        }
    }

    team.truncate(team_size);
    team
}

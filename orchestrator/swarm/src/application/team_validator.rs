// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Capability Coverage Validator
//!
//! Built-in `ValidationPort` used when no external validator is wired in.
//! A team is rejected when it is empty, names an unregistered agent, leaves a
//! required capability uncovered, or runs a high-security task without any
//! member holding the `security` capability.

use std::collections::BTreeSet;

use kinswarm_core::domain::agent::AgentRegistry;
use kinswarm_core::domain::ports::ValidationPort;
use kinswarm_core::domain::validation::TeamValidation;

const HIGH_SECURITY_LEVELS: &[&str] = &["high", "critical"];
const SECURITY_CAPABILITY: &str = "security";

pub struct CapabilityCoverageValidator {
    registry: AgentRegistry,
}

impl CapabilityCoverageValidator {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }
}

impl ValidationPort for CapabilityCoverageValidator {
    fn validate_team_composition(
        &self,
        agent_names: &[String],
        task_type: &str,
        required_capabilities: &BTreeSet<String>,
        required_security_level: &str,
    ) -> TeamValidation {
        if agent_names.is_empty() {
            return TeamValidation::reject(vec![format!(
                "Empty team for task type '{}'",
                task_type
            )]);
        }

        let mut reasons = Vec::new();
        for name in agent_names.iter().filter(|n| !self.registry.contains(n)) {
            reasons.push(format!("Unknown agent '{}'", name));
        }

        let covered = self.registry.capability_union(agent_names);
        for capability in required_capabilities.difference(&covered) {
            reasons.push(format!("Capability '{}' not covered", capability));
        }

        let level = required_security_level.to_lowercase();
        if HIGH_SECURITY_LEVELS.contains(&level.as_str())
            && !covered.contains(SECURITY_CAPABILITY)
        {
            reasons.push(format!(
                "Security level '{}' requires a member with the '{}' capability",
                required_security_level, SECURITY_CAPABILITY
            ));
        }

        if reasons.is_empty() {
            TeamValidation::accept()
        } else {
            TeamValidation::reject(reasons)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinswarm_core::domain::agent::Agent;

    fn validator() -> CapabilityCoverageValidator {
        CapabilityCoverageValidator::new(
            AgentRegistry::from_agents(vec![
                Agent::new("builder", "builder", ["coding"]),
                Agent::new("qa", "qa", ["testing", "security"]),
            ])
            .unwrap(),
        )
    }

    fn caps(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accepts_covering_team() {
        let team = vec!["builder".to_string(), "qa".to_string()];
        let verdict = validator().validate_team_composition(
            &team,
            "code",
            &caps(&["coding", "testing"]),
            "standard",
        );
        assert!(verdict.is_valid);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_rejects_empty_unknown_and_uncovered() {
        let v = validator();
        assert!(!v.validate_team_composition(&[], "code", &caps(&[]), "standard").is_valid);

        let ghost = vec!["ghost".to_string()];
        let verdict = v.validate_team_composition(&ghost, "code", &caps(&["coding"]), "standard");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reasons.len(), 2);
    }

    #[test]
    fn test_high_security_needs_security_member() {
        let v = validator();
        let builder = vec!["builder".to_string()];
        assert!(
            !v.validate_team_composition(&builder, "code", &caps(&["coding"]), "HIGH").is_valid
        );

        let both = vec!["builder".to_string(), "qa".to_string()];
        assert!(
            v.validate_team_composition(&both, "code", &caps(&["coding"]), "critical").is_valid
        );
    }
}

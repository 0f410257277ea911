// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Swarm Configuration Types
//
// Defines the configuration schema for a kinswarm coordinator, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - The agent roster and the capability registry used by plan validation
// - Particle swarm, inclusive fitness and plan validator tuning
// - Coordinator retry, deadline and performance-smoothing settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::domain::agent::{Agent, AgentCapability, AgentRegistry, CostTier};
use crate::domain::validation::ValidationError;

pub const API_VERSION: &str = "kinswarm/v1";
pub const KIND: &str = "SwarmConfig";

/// Top-level Kubernetes-style swarm configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfigManifest {
    /// API version (must be "kinswarm/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "SwarmConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: SwarmConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfigSpec {
    /// Agent roster available to the optimizer
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentSpec>,

    /// Capability registry consumed by plan validation and routing
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<AgentCapability>,

    #[serde(default)]
    pub optimizer: OptimizerSettings,

    #[serde(default)]
    pub fitness: FitnessSettings,

    #[serde(default)]
    pub validator: ValidatorSettings,

    #[serde(default)]
    pub coordinator: CoordinatorSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl AgentSpec {
    fn new(name: &str, role: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn to_agent(&self) -> Agent {
        Agent::new(self.name.clone(), self.role.clone(), self.capabilities.iter().cloned())
    }
}

/// Particle swarm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default = "default_n_particles")]
    pub n_particles: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Inertia weight `w`, in [0, 1]
    #[serde(default = "default_inertia")]
    pub inertia: f64,

    /// Cognitive weight `c1`, >= 0
    #[serde(default = "default_pull")]
    pub cognitive: f64,

    /// Social weight `c2`, >= 0
    #[serde(default = "default_pull")]
    pub social: f64,
}

impl OptimizerSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.n_particles < 1 {
            return Err(invalid("n_particles", "must be at least 1"));
        }
        if self.max_iterations < 1 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.inertia) {
            return Err(invalid("inertia", format!("{} is outside [0, 1]", self.inertia)));
        }
        if !self.cognitive.is_finite() || self.cognitive < 0.0 {
            return Err(invalid("cognitive", format!("{} must be finite and >= 0", self.cognitive)));
        }
        if !self.social.is_finite() || self.social < 0.0 {
            return Err(invalid("social", format!("{} must be finite and >= 0", self.social)));
        }
        Ok(())
    }
}

/// Inclusive fitness model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessSettings {
    /// Success probability when the team does not cover the required capabilities
    #[serde(default = "default_uncovered_probability")]
    pub uncovered_success_probability: f64,

    /// Base success probability for a covering team
    #[serde(default = "default_covered_probability")]
    pub covered_base_probability: f64,

    /// Bonus when all genotype groups are present, scaled by distinct/5
    #[serde(default = "default_diversity_bonus")]
    pub diversity_bonus_max: f64,

    /// Bonus per genotype represented by a kin cluster
    #[serde(default = "default_kin_cluster_bonus")]
    pub kin_cluster_bonus: f64,

    #[serde(default = "default_kin_cluster_min")]
    pub kin_cluster_min: usize,

    #[serde(default = "default_kin_cluster_max")]
    pub kin_cluster_max: usize,

    #[serde(default = "default_max_success_probability")]
    pub max_success_probability: f64,

    /// Fraction of the priority paid out on failure
    #[serde(default = "default_failure_reward_factor")]
    pub failure_reward_factor: f64,
}

impl FitnessSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("uncovered_success_probability", self.uncovered_success_probability),
            ("covered_base_probability", self.covered_base_probability),
            ("max_success_probability", self.max_success_probability),
            ("failure_reward_factor", self.failure_reward_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, format!("{} is outside [0, 1]", value)));
            }
        }
        for (name, value) in [
            ("diversity_bonus_max", self.diversity_bonus_max),
            ("kin_cluster_bonus", self.kin_cluster_bonus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("{} must be finite and >= 0", value)));
            }
        }
        if self.kin_cluster_min > self.kin_cluster_max {
            return Err(invalid(
                "kin_cluster_min",
                format!(
                    "{} exceeds kin_cluster_max {}",
                    self.kin_cluster_min, self.kin_cluster_max
                ),
            ));
        }
        Ok(())
    }
}

/// Plan validator thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSettings {
    /// Word-level Jaccard similarity above which grouped tasks are duplicates
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_similarity_threshold: f64,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_warn_depth")]
    pub warn_depth: usize,

    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    #[serde(default = "default_warn_nodes")]
    pub warn_nodes: usize,
}

impl ValidatorSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.duplicate_similarity_threshold) {
            return Err(invalid(
                "duplicate_similarity_threshold",
                format!("{} is outside [0, 1]", self.duplicate_similarity_threshold),
            ));
        }
        if self.warn_depth > self.max_depth {
            return Err(invalid("warn_depth", "must not exceed max_depth"));
        }
        if self.warn_nodes > self.max_nodes {
            return Err(invalid("warn_nodes", "must not exceed max_nodes"));
        }
        Ok(())
    }
}

/// Coordinator retry and bookkeeping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Seed of the first optimization attempt; attempt `n` uses `base_seed + n - 1`
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Deadline for one team dispatch, in seconds
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,

    /// Exponential smoothing factor for team performance
    #[serde(default = "default_smoothing")]
    pub performance_smoothing: f64,

    /// Feedback below this value flags a team for re-optimization
    #[serde(default = "default_evolve_threshold")]
    pub evolve_threshold: f64,

    /// Padding order for the deterministic fallback team
    #[serde(default = "default_team_order")]
    pub default_team_order: Vec<String>,
}

impl CoordinatorSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.performance_smoothing) {
            return Err(invalid(
                "performance_smoothing",
                format!("{} is outside [0, 1]", self.performance_smoothing),
            ));
        }
        if !(0.0..=1.0).contains(&self.evolve_threshold) {
            return Err(invalid(
                "evolve_threshold",
                format!("{} is outside [0, 1]", self.evolve_threshold),
            ));
        }
        if self.execution_timeout_secs == 0 {
            return Err(invalid("execution_timeout_secs", "must be greater than 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn invalid(name: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidParameter { name: name.to_string(), reason: reason.into() }
}

fn default_n_particles() -> usize {
    20
}

fn default_max_iterations() -> usize {
    30
}

fn default_inertia() -> f64 {
    0.7
}

fn default_pull() -> f64 {
    1.5
}

fn default_uncovered_probability() -> f64 {
    0.3
}

fn default_covered_probability() -> f64 {
    0.7
}

fn default_diversity_bonus() -> f64 {
    0.2
}

fn default_kin_cluster_bonus() -> f64 {
    0.1
}

fn default_kin_cluster_min() -> usize {
    2
}

fn default_kin_cluster_max() -> usize {
    3
}

fn default_max_success_probability() -> f64 {
    0.95
}

fn default_failure_reward_factor() -> f64 {
    0.3
}

fn default_duplicate_threshold() -> f64 {
    0.7
}

fn default_max_depth() -> usize {
    10
}

fn default_warn_depth() -> usize {
    5
}

fn default_max_nodes() -> usize {
    100
}

fn default_warn_nodes() -> usize {
    50
}

fn default_base_seed() -> u64 {
    42
}

fn default_max_retries() -> u32 {
    3
}

fn default_execution_timeout() -> u64 {
    300
}

fn default_smoothing() -> f64 {
    0.3
}

fn default_evolve_threshold() -> f64 {
    0.7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_team_order() -> Vec<String> {
    [
        "builder", "qa", "deploy", "marketing", "support", "content", "seo", "analyst", "billing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new("builder", "builder", &["coding", "architecture", "api"]),
        AgentSpec::new("qa", "qa engineer", &["testing", "security", "review"]),
        AgentSpec::new("deploy", "devops", &["deployment", "monitoring", "infrastructure"]),
        AgentSpec::new("marketing", "marketing", &["ads", "social", "campaigns"]),
        AgentSpec::new("support", "customer support", &["support", "onboarding"]),
        AgentSpec::new("content", "content writer", &["writing", "editing"]),
        AgentSpec::new("seo", "seo specialist", &["seo", "keywords"]),
        AgentSpec::new("analyst", "data analyst", &["analytics", "research", "reporting"]),
        AgentSpec::new("billing", "billing", &["payments", "invoicing", "pricing"]),
    ]
}

fn capability(
    name: &str,
    task_types: &[&str],
    skills: &[&str],
    cost_tier: CostTier,
    success_rate: f64,
    avg_completion_time: f64,
) -> AgentCapability {
    AgentCapability {
        agent_name: name.to_string(),
        supported_task_types: task_types.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        skills: skills.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        cost_tier,
        success_rate,
        avg_completion_time,
    }
}

fn default_capabilities() -> Vec<AgentCapability> {
    vec![
        capability(
            "builder",
            &["code", "implementation", "api"],
            &["rust", "python", "sql"],
            CostTier::Expensive,
            0.85,
            120.0,
        ),
        capability(
            "qa",
            &["test", "review", "security"],
            &["testing", "security"],
            CostTier::Medium,
            0.9,
            60.0,
        ),
        capability(
            "deploy",
            &["deploy", "infrastructure"],
            &["docker", "kubernetes"],
            CostTier::Medium,
            0.88,
            45.0,
        ),
        capability(
            "marketing",
            &["marketing", "campaign"],
            &["ads", "social"],
            CostTier::Medium,
            0.75,
            90.0,
        ),
        capability(
            "support",
            &["support"],
            &["onboarding", "communication"],
            CostTier::Cheap,
            0.8,
            30.0,
        ),
        capability(
            "content",
            &["content", "documentation"],
            &["writing", "editing"],
            CostTier::Cheap,
            0.82,
            60.0,
        ),
        capability("seo", &["seo", "content"], &["keywords", "seo"], CostTier::Cheap, 0.78, 40.0),
        capability(
            "analyst",
            &["analysis", "research"],
            &["analytics", "reporting"],
            CostTier::Medium,
            0.8,
            75.0,
        ),
        capability(
            "billing",
            &["billing", "finance"],
            &["payments", "invoicing"],
            CostTier::Medium,
            0.92,
            35.0,
        ),
    ]
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            n_particles: default_n_particles(),
            max_iterations: default_max_iterations(),
            inertia: default_inertia(),
            cognitive: default_pull(),
            social: default_pull(),
        }
    }
}

impl Default for FitnessSettings {
    fn default() -> Self {
        Self {
            uncovered_success_probability: default_uncovered_probability(),
            covered_base_probability: default_covered_probability(),
            diversity_bonus_max: default_diversity_bonus(),
            kin_cluster_bonus: default_kin_cluster_bonus(),
            kin_cluster_min: default_kin_cluster_min(),
            kin_cluster_max: default_kin_cluster_max(),
            max_success_probability: default_max_success_probability(),
            failure_reward_factor: default_failure_reward_factor(),
        }
    }
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            duplicate_similarity_threshold: default_duplicate_threshold(),
            max_depth: default_max_depth(),
            warn_depth: default_warn_depth(),
            max_nodes: default_max_nodes(),
            warn_nodes: default_warn_nodes(),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            base_seed: default_base_seed(),
            max_retries: default_max_retries(),
            execution_timeout_secs: default_execution_timeout(),
            performance_smoothing: default_smoothing(),
            evolve_threshold: default_evolve_threshold(),
            default_team_order: default_team_order(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for SwarmConfigSpec {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            capabilities: default_capabilities(),
            optimizer: OptimizerSettings::default(),
            fitness: FitnessSettings::default(),
            validator: ValidatorSettings::default(),
            coordinator: CoordinatorSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for SwarmConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "default".to_string(),
                version: None,
                labels: None,
            },
            spec: SwarmConfigSpec::default(),
        }
    }
}

impl SwarmConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. KINSWARM_CONFIG_PATH environment variable
    /// 2. ./kinswarm-config.yaml (working directory)
    /// 3. ~/.kinswarm/config.yaml (user home)
    /// 4. /etc/kinswarm/config.yaml (system, Unix) or C:\ProgramData\Kinswarm\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("KINSWARM_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./kinswarm-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".kinswarm").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/kinswarm/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Kinswarm\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!(
                "No configuration file found in standard locations. Using built-in defaults."
            );
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KINSWARM_RANDOM_SEED") {
            match val.trim().parse::<u64>() {
                Ok(seed) => {
                    tracing::info!("Environment override: KINSWARM_RANDOM_SEED={}", seed);
                    self.spec.coordinator.base_seed = seed;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for KINSWARM_RANDOM_SEED: '{}'. Expected an unsigned integer. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(val) = std::env::var("KINSWARM_MAX_RETRIES") {
            match val.trim().parse::<u32>() {
                Ok(retries) => {
                    tracing::info!("Environment override: KINSWARM_MAX_RETRIES={}", retries);
                    self.spec.coordinator.max_retries = retries;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for KINSWARM_MAX_RETRIES: '{}'. Expected an unsigned integer. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let registry = self.agent_registry()?;

        for capability in &self.spec.capabilities {
            if !registry.contains(&capability.agent_name) {
                anyhow::bail!(
                    "Capability entry references unknown agent '{}'",
                    capability.agent_name
                );
            }
            capability.validate()?;
        }

        self.spec.optimizer.validate()?;
        self.spec.fitness.validate()?;
        self.spec.validator.validate()?;
        self.spec.coordinator.validate()?;

        Ok(())
    }

    /// Build the agent registry from the configured roster.
    pub fn agent_registry(&self) -> Result<AgentRegistry, ValidationError> {
        AgentRegistry::from_agents(self.spec.agents.iter().map(AgentSpec::to_agent).collect())
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.spec.agents.iter().map(AgentSpec::to_agent).collect()
    }
}

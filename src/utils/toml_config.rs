//! TOML-based configuration for juris
//!
//! Everything a research session needs that is not a per-request cap lives in
//! `juris.toml`: the model transport, the search backend, round and stopping
//! thresholds, and the jurisdiction policy. Every field has a default, so an
//! empty file is a valid configuration targeting Colombian law with a local
//! Ollama model and DuckDuckGo search.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::llm::Provider;
use crate::research::{
    DomainPolicy, EvidenceFloors, LlmPolicySettings, OrchestratorConfig, ResearchOptions, RoundSettings,
    StoppingPolicy,
};

/// Root configuration structure loaded from juris.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JurisConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub research: ResearchConfig,

    #[serde(default)]
    pub stopping: StoppingPolicy,

    #[serde(default)]
    pub domains: DomainPolicy,

    #[serde(default)]
    pub floors: EvidenceFloors,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing the API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Temperature of the final synthesis call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Ask the model to verify each round's sources
    #[serde(default)]
    pub verify_sources: bool,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    3000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            verify_sources: false,
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    DuckDuckGo,
    Serper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,

    /// Environment variable holding the Serper API key
    #[serde(default = "default_serper_key_env")]
    pub api_key_env: String,

    /// Country bias (`gl`)
    #[serde(default = "default_region")]
    pub region: String,

    /// Language bias (`hl`)
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_results_per_query")]
    pub max_results_per_query: usize,

    /// Results per round whose full text is fetched; 0 disables enrichment
    #[serde(default = "default_enrich_top_n")]
    pub enrich_top_n: usize,

    #[serde(default = "default_enrich_timeout_ms")]
    pub enrich_timeout_ms: u64,

    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_serper_key_env() -> String {
    "SERPER_API_KEY".to_string()
}

fn default_region() -> String {
    "co".to_string()
}

fn default_language() -> String {
    "es".to_string()
}

fn default_max_results_per_query() -> usize {
    8
}

fn default_enrich_top_n() -> usize {
    3
}

fn default_enrich_timeout_ms() -> u64 {
    10_000
}

fn default_max_content_chars() -> usize {
    8_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            api_key_env: default_serper_key_env(),
            region: default_region(),
            language: default_language(),
            max_results_per_query: default_max_results_per_query(),
            enrich_top_n: default_enrich_top_n(),
            enrich_timeout_ms: default_enrich_timeout_ms(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

// ============= Research Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    #[serde(default = "default_max_searches_per_round")]
    pub max_searches_per_round: usize,

    #[serde(default = "default_per_search_timeout_ms")]
    pub per_search_timeout_ms: u64,

    /// Cap on accumulated sources
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Sources below this quality (0-10) are discarded
    #[serde(default)]
    pub min_source_quality: f32,
}

fn default_max_rounds() -> usize {
    5
}

fn default_max_searches_per_round() -> usize {
    6
}

fn default_per_search_timeout_ms() -> u64 {
    15_000
}

fn default_max_sources() -> usize {
    20
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            max_searches_per_round: default_max_searches_per_round(),
            per_search_timeout_ms: default_per_search_timeout_ms(),
            max_sources: default_max_sources(),
            min_source_quality: 0.0,
        }
    }
}

/// Hard upper bound on `max_rounds`.
pub const MAX_ROUNDS_LIMIT: usize = 20;

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    EmptyDomainList,
    UnreachableThreshold,
    ClampedMinimumRounds,
    IneffectiveEnrichment,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to render TOML: {0}")]
    RenderError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, value: T, min: T, max: T) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

impl JurisConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: JurisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Validate ranges and internal consistency. Environment variables are
    /// checked separately by [`JurisConfig::validate_env`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.research;
        check_range("research.max_rounds", r.max_rounds, 1, MAX_ROUNDS_LIMIT)?;
        check_range("research.max_searches_per_round", r.max_searches_per_round, 1, 50)?;
        check_range("research.per_search_timeout_ms", r.per_search_timeout_ms, 1, 600_000)?;
        check_range("research.max_sources", r.max_sources, 1, 500)?;
        check_range("research.min_source_quality", r.min_source_quality, 0.0, 10.0)?;

        check_range("llm.temperature", self.llm.temperature, 0.0, 2.0)?;
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError("llm.max_tokens must be positive".to_string()));
        }

        check_range("search.max_results_per_query", self.search.max_results_per_query, 1, 100)?;

        let s = &self.stopping;
        check_range("stopping.sufficient_confidence", s.sufficient_confidence, 0.0, 1.0)?;
        check_range("stopping.sufficient_overall", s.sufficient_overall, 0.0, 10.0)?;
        check_range("stopping.dead_end_overall", s.dead_end_overall, 0.0, 10.0)?;
        check_range("stopping.high_quality_overall", s.high_quality_overall, 0.0, 10.0)?;
        if s.max_elapsed_ms == 0 {
            return Err(ConfigError::ValidationError(
                "stopping.max_elapsed_ms must be positive".to_string(),
            ));
        }

        check_range("floors.penalty", self.floors.penalty, 0.0, 10.0)?;

        if self.domains.site_operator.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "domains.site_operator must not be empty".to_string(),
            ));
        }
        if let Some(rule) = self.domains.subject_rules.iter().find(|r| r.keywords.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "domains.subject_rules entry for '{}' has no keywords",
                rule.domain
            )));
        }

        Ok(())
    }

    /// Check that every environment variable the chosen backends need is set
    pub fn validate_env(&self, needs_llm: bool) -> Result<(), ConfigError> {
        if needs_llm && let ProviderConfig::OpenAI { api_key_env, .. } = &self.llm.provider {
            self.validate_env_var(api_key_env)?;
        }
        if self.search.backend == SearchBackend::Serper {
            self.validate_env_var(&self.search.api_key_env)?;
        }
        Ok(())
    }

    /// Validate configuration and collect non-fatal warnings
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(self.check_domain_lists());
        warnings.extend(self.check_thresholds());
        Ok(warnings)
    }

    fn check_domain_lists(&self) -> Vec<ConfigWarning> {
        let lists = [
            ("official", self.domains.official.is_empty()),
            ("mandatory", self.domains.mandatory.is_empty()),
        ];
        lists
            .into_iter()
            .filter(|(_, empty)| *empty)
            .map(|(name, _)| ConfigWarning {
                kind: ConfigWarningKind::EmptyDomainList,
                message: format!("domains.{} is empty; official coverage cannot be enforced", name),
            })
            .collect()
    }

    fn check_thresholds(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.stopping.high_quality_sources > self.research.max_sources {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::UnreachableThreshold,
                message: format!(
                    "stopping.high_quality_sources ({}) exceeds research.max_sources ({}); the high-quality stop can never fire",
                    self.stopping.high_quality_sources, self.research.max_sources
                ),
            });
        }

        if self.floors.min_official > self.research.max_sources {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::UnreachableThreshold,
                message: format!(
                    "floors.min_official ({}) exceeds research.max_sources ({})",
                    self.floors.min_official, self.research.max_sources
                ),
            });
        }

        let table = &self.stopping.minimum_rounds;
        let largest = table.simple.max(table.moderate).max(table.complex).max(table.very_complex);
        if largest > self.research.max_rounds {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::ClampedMinimumRounds,
                message: format!(
                    "minimum rounds up to {} will be clamped to research.max_rounds ({})",
                    largest, self.research.max_rounds
                ),
            });
        }

        if self.search.enrich_top_n > self.search.max_results_per_query * self.research.max_searches_per_round {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::IneffectiveEnrichment,
                message: format!(
                    "search.enrich_top_n ({}) is larger than a round can return",
                    self.search.enrich_top_n
                ),
            });
        }

        warnings
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Serper API key from the environment
    pub fn search_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.search.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.search.api_key_env.clone()))
    }

    /// Resolve the configured LLM provider, reading its key from the environment
    pub fn llm_provider(&self) -> Result<Provider, ConfigError> {
        match &self.llm.provider {
            ProviderConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => Ok(Provider::OpenAI {
                api_key: self
                    .resolve_env(api_key_env)
                    .ok_or_else(|| ConfigError::MissingEnvVar(api_key_env.clone()))?,
                api_base: api_base.clone(),
                model: model.clone(),
            }),
        }
    }

    pub fn llm_policy_settings(&self) -> LlmPolicySettings {
        LlmPolicySettings {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            verify_sources: self.llm.verify_sources,
        }
    }

    pub fn per_search_timeout(&self) -> Duration {
        Duration::from_millis(self.research.per_search_timeout_ms)
    }

    /// Per-request caps from the `[research]` section
    pub fn research_options(&self) -> ResearchOptions {
        ResearchOptions {
            max_rounds: self.research.max_rounds,
            max_searches_per_round: self.research.max_searches_per_round,
            per_search_timeout: self.per_search_timeout(),
            decision_override: None,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_sources: self.research.max_sources,
            round: RoundSettings {
                max_results_per_query: self.search.max_results_per_query,
                enrich_top_n: self.search.enrich_top_n,
                enrich_timeout: Duration::from_millis(self.search.enrich_timeout_ms),
                min_source_quality: self.research.min_source_quality,
            },
            stopping: self.stopping.clone(),
            domains: Arc::new(self.domains.clone()),
            floors: Arc::new(self.floors.clone()),
        }
    }

    /// Render as TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

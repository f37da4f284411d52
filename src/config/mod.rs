//! Configuration management.
//!
//! modflow configuration can come from:
//! - Environment variables (MODFLOW_*)
//! - Config file (~/.config/modflow/config.toml)
//! - An explicit file passed by the caller

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::capabilities::{HttpLlmClient, LlmClient, MockLlmClient, DEFAULT_LLM_ENDPOINT};
use crate::engine::InputPolicy;
use crate::error::{Error, Result};

/// modflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Text-generation client
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// What to do with inputs that cannot be resolved
    #[serde(default)]
    pub input_policy: InputPolicy,

    /// Whole-execution timeout in seconds (0 = none)
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// Which LLM client to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Mock,
    Http,
}

impl std::str::FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(LlmProvider::Mock),
            "http" => Ok(LlmProvider::Http),
            other => Err(Error::Config(format!("Unknown LLM provider '{}'", other))),
        }
    }
}

/// Text-generation client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Chat endpoint for the http provider
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model to use (optional, endpoint default)
    #[serde(default)]
    pub model: Option<String>,

    /// System prompt (optional)
    #[serde(default)]
    pub system: Option<String>,

    /// Temperature for generation (optional)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_llm_endpoint(),
            model: None,
            system: None,
            temperature: None,
            timeout_seconds: default_llm_timeout(),
        }
    }
}

fn default_llm_endpoint() -> String {
    DEFAULT_LLM_ENDPOINT.to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

impl LlmConfig {
    /// Build the configured client.
    pub fn client(&self) -> Arc<dyn LlmClient> {
        match self.provider {
            LlmProvider::Mock => Arc::new(MockLlmClient::new()),
            LlmProvider::Http => {
                let mut client = HttpLlmClient::new(&self.endpoint)
                    .with_timeout(Duration::from_secs(self.timeout_seconds));
                if let Some(model) = &self.model {
                    client = client.with_model(model);
                }
                if let Some(system) = &self.system {
                    client = client.with_system(system);
                }
                if let Some(temperature) = self.temperature {
                    client = client.with_temperature(temperature);
                }
                Arc::new(client)
            }
        }
    }
}

impl Config {
    /// Load configuration from the default location, then the environment.
    ///
    /// A missing or unreadable default file is ignored.
    pub fn load() -> Self {
        let mut config = Self::default();

        let primary_path = Self::config_dir().join("config.toml");
        if let Ok(partial) = Self::load_partial_from_path(&primary_path) {
            config.apply_partial(partial);
        }

        config.apply_env_overrides();
        config
    }

    /// Load configuration from an explicit file, then the environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply_partial(Self::load_partial_from_path(path)?);
        config.apply_env_overrides();
        Ok(config)
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("modflow"))
            .unwrap_or_else(|| PathBuf::from(".modflow"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = lookup("MODFLOW_INPUT_POLICY") {
            if let Ok(parsed) = policy.parse::<InputPolicy>() {
                self.engine.input_policy = parsed;
            }
        }
        if let Some(timeout) = lookup("MODFLOW_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.engine.timeout_seconds = parsed;
            }
        }
        if let Some(provider) = lookup("MODFLOW_LLM_PROVIDER") {
            if let Ok(parsed) = provider.parse::<LlmProvider>() {
                self.llm.provider = parsed;
            }
        }
        if let Some(endpoint) = lookup("MODFLOW_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = lookup("MODFLOW_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(timeout) = lookup("MODFLOW_LLM_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.llm.timeout_seconds = parsed;
            }
        }
    }

    fn load_partial_from_path(path: &Path) -> Result<PartialConfig> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(engine) = partial.engine {
            self.engine = engine;
        }
        if let Some(llm) = partial.llm {
            self.llm = llm;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    engine: Option<EngineConfig>,
    llm: Option<LlmConfig>,
}

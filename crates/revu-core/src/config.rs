use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RevuError};
use crate::types::ModelTier;

/// Top-level Revu configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Execution engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard bound on orchestrator/worker round-trips per task.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Timeout for a single worker invocation.
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: u64,
    /// Re-dispatch budget per worker after a recoverable failure.
    #[serde(default = "default_worker_retries")]
    pub worker_retries: usize,
    /// Tasks larger than this are refused by the report worker.
    #[serde(default = "default_max_task_chars")]
    pub max_task_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            worker_timeout_secs: default_worker_timeout(),
            worker_retries: default_worker_retries(),
            max_task_chars: default_max_task_chars(),
        }
    }
}

fn default_max_steps() -> usize { 16 }
fn default_worker_timeout() -> u64 { 60 }
fn default_worker_retries() -> usize { 1 }
fn default_max_task_chars() -> usize { 60_000 }

/// The two named inference backends. Selection is worker-driven; the
/// engine itself never touches these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "ModelConfig::stub")]
    pub heavy: ModelConfig,
    #[serde(default = "ModelConfig::stub")]
    pub fast: ModelConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            heavy: ModelConfig::stub(),
            fast: ModelConfig::stub(),
        }
    }
}

impl ModelsConfig {
    pub fn select(&self, tier: ModelTier) -> &ModelConfig {
        match tier {
            ModelTier::Heavy => &self.heavy,
            ModelTier::Fast => &self.fast,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl ModelConfig {
    /// The offline/deterministic backend used when no real model is
    /// configured.
    pub fn stub() -> Self {
        Self {
            provider: "stub".to_string(),
            model_id: "stub".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry: None,
        }
    }
}

fn default_provider() -> String { "openai".to_string() }
fn default_max_tokens() -> u32 { 4096 }
fn default_temperature() -> f32 { 0.0 }

/// Retry configuration for inference requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff() -> u64 { 1000 }
fn default_max_backoff() -> u64 { 30000 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| RevuError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| RevuError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

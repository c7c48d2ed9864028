//! PromptGuard configuration management

use crate::error::{Error, Result};
use crate::privacy::RuleDefinition;
use crate::rewrite::RewritePricing;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main PromptGuard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptGuardConfig {
    /// Remote rewrite configuration
    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Detection rule configuration
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl PromptGuardConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Remote rewrite collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Attempt remote rewrites at all
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Bound on the remote call, in milliseconds
    pub timeout_ms: u64,

    /// Completion token limit
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// USD per 1k prompt tokens
    pub input_cost_per_1k: f64,

    /// USD per 1k completion tokens
    pub output_cost_per_1k: f64,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        let pricing = RewritePricing::default();
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 8000,
            max_tokens: 1024,
            temperature: 0.3,
            input_cost_per_1k: pricing.input_cost_per_1k,
            output_cost_per_1k: pricing.output_cost_per_1k,
        }
    }
}

impl RewriteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn pricing(&self) -> RewritePricing {
        RewritePricing {
            input_cost_per_1k: self.input_cost_per_1k,
            output_cost_per_1k: self.output_cost_per_1k,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            cors_origins: Vec::new(),
        }
    }
}

/// Detection rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Built-in rule ids to leave out of the registry
    pub disabled_rules: Vec<String>,

    /// Extra rules appended after the built-in table
    pub custom_rules: Vec<RuleDefinition>,
}

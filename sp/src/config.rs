//! studyplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main studyplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP endpoint configuration
    pub server: ServerConfig,

    /// Upstream completion gateway configuration
    pub gateway: GatewayConfig,

    /// Command-line client configuration
    pub client: ClientConfig,

    /// Prompt template configuration
    pub prompts: PromptsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: studyplan.yml
        let local_config = PathBuf::from("studyplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/studyplan/studyplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("studyplan").join("studyplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Path of the plan-generation route
    pub route: String,

    /// Environment variable holding the static bearer token (unset = no auth)
    #[serde(rename = "auth-token-env")]
    pub auth_token_env: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            route: "/functions/v1/generate-study-plan".to_string(),
            auth_token_env: None,
        }
    }
}

impl ServerConfig {
    /// Resolve the bearer token from the environment, if one is configured
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
    }
}

/// Upstream completion gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Optional cap on response tokens
    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "google/gemini-3-flash-preview".to_string(),
            api_key_env: "AI_GATEWAY_API_KEY".to_string(),
            base_url: "https://ai.gateway.lovable.dev".to_string(),
            timeout_ms: 60_000,
            max_tokens: None,
        }
    }
}

impl GatewayConfig {
    /// Resolve the configuration against the environment
    ///
    /// Fails when the API key variable is unset or empty, so the server can
    /// refuse to start instead of failing every request.
    pub fn resolve(&self) -> Result<ResolvedGatewayConfig> {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                eyre::eyre!(
                    "Gateway API key not found. Set the {} environment variable.",
                    self.api_key_env
                )
            })?;

        Ok(ResolvedGatewayConfig {
            model: self.model.clone(),
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(self.timeout_ms),
            max_tokens: self.max_tokens,
        })
    }
}

/// Gateway settings with the API key already read from the environment
#[derive(Clone)]
pub struct ResolvedGatewayConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl std::fmt::Debug for ResolvedGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedGatewayConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Command-line client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the plan-generation service
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable holding the public key sent as bearer token
    #[serde(rename = "public-key-env")]
    pub public_key_env: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            public_key_env: "STUDYPLAN_PUBLIC_KEY".to_string(),
        }
    }
}

impl ClientConfig {
    /// Read the public key, if set
    pub fn public_key(&self) -> Option<String> {
        std::env::var(&self.public_key_env).ok().filter(|key| !key.is_empty())
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory with `<name>.pmt` overrides for the embedded templates
    pub dir: Option<PathBuf>,
}

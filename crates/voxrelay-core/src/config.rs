//! Configuration resolution for voxrelay.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (`--config`, else `$XDG_CONFIG_HOME/voxrelay/config.toml`)
//! 3. Environment variables
//! 4. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete voxrelay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
}

/// Upstream reasoning gateway.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub model: String,
    /// Stable session identifier forwarded as the request's `user` field.
    pub session_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:18789".to_string(),
            token: String::new(),
            model: "clawdbot:main".to_string(),
            session_key: Some("agent:voice".to_string()),
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("model", &self.model)
            .field("session_key", &self.session_key)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GatewayConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Fast model used to condense long answers for speech.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub enabled: bool,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub model: String,
    /// Answers longer than this (in characters) are condensed.
    pub min_chars: usize,
    /// At most this many characters of the answer go into the prompt.
    pub max_input_chars: usize,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            token: String::new(),
            model: "gpt-4o-mini".to_string(),
            min_chars: 300,
            max_input_chars: 1500,
            timeout_secs: 20,
        }
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("model", &self.model)
            .field("min_chars", &self.min_chars)
            .field("max_input_chars", &self.max_input_chars)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SummarizerConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Condensation runs only when enabled and a token is available.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.token.is_empty()
    }
}

/// Narration behaviour while a relay streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Seconds between heartbeat fillers; 0 disables the heartbeat.
    pub heartbeat_interval_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 8,
        }
    }
}

impl NarrationConfig {
    pub const fn heartbeat_interval(&self) -> Option<Duration> {
        if self.heartbeat_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.heartbeat_interval_secs))
        }
    }
}

impl RelayConfig {
    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(Error::Config("gateway.base_url is empty".into()));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(Error::Config("gateway.timeout_secs must be positive".into()));
        }
        if self.summarizer.enabled && self.summarizer.base_url.trim().is_empty() {
            return Err(Error::Config("summarizer.base_url is empty".into()));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution: file, then environment.
///
/// An explicit `path` must exist; the default path is used only if present.
/// The result is not validated, so command-line overrides can still repair
/// it; call [`RelayConfig::validate`] once every layer is applied.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match default_config_path() {
            Some(default) if default.exists() => load_config_file(&default)?,
            _ => RelayConfig::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("voxrelay").join("config.toml"))
}

/// Parse a TOML config file.
pub fn load_config_file(path: &Path) -> Result<RelayConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply environment overrides, reading variables through `lookup`.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("VOXRELAY_GATEWAY_URL") {
        config.gateway.base_url = val;
    }
    if let Some(val) = lookup("VOXRELAY_GATEWAY_TOKEN") {
        config.gateway.token = val;
    }
    if let Some(val) = lookup("VOXRELAY_MODEL") {
        config.gateway.model = val;
    }
    if let Some(val) = lookup("VOXRELAY_SESSION_KEY") {
        config.gateway.session_key = Some(val).filter(|s| !s.is_empty());
    }
    if let Some(val) = lookup("VOXRELAY_TIMEOUT_SECS") {
        if let Ok(n) = val.parse() {
            config.gateway.timeout_secs = n;
        }
    }
    if let Some(val) = lookup("OPENAI_API_KEY") {
        config.summarizer.token = val;
    }
}

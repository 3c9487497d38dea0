//! Application Configuration
//!
//! Persistent configuration loaded from a TOML file under the user's
//! config directory, with environment variables as the credential source
//! of last resort.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::WayfarerError;
use crate::providers::ProvidersConfig;

/// Top-level configuration for the planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WayfarerConfig {
    /// Provider used for agent runs (gemini/ollama)
    pub default_provider: Option<String>,

    /// Model override passed to the provider
    pub default_model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: Option<f32>,

    /// Max tokens per generation
    pub max_tokens: Option<usize>,

    /// Traveler count assumed when the user never states one
    #[serde(default = "default_travelers")]
    pub default_travelers: u32,

    /// Budget assumed when the user never states one
    #[serde(default = "default_budget")]
    pub default_budget: u64,

    /// Seconds a memory record lives before expiring
    #[serde(default = "default_memory_ttl")]
    pub memory_ttl_secs: u64,

    /// How many past records a turn recalls
    #[serde(default = "default_top_k")]
    pub memory_top_k: usize,

    /// Configuration of the LLM providers
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Credentials for the tool clients
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// API credentials for the external tool services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Serper (Google search) API key; falls back to SERPER_API_KEY
    pub serper_api_key: Option<String>,

    /// OpenRouteService key; falls back to ORS_API_KEY
    pub ors_api_key: Option<String>,

    /// OpenWeather key; falls back to OPEN_WEATHER_API_KEY
    pub openweather_api_key: Option<String>,

    /// exchangerate.host key; falls back to CURRENCY_API_KEY
    pub currency_api_key: Option<String>,
}

fn default_travelers() -> u32 {
    1
}

fn default_budget() -> u64 {
    10_000
}

fn default_memory_ttl() -> u64 {
    3600
}

fn default_top_k() -> usize {
    3
}

impl WayfarerConfig {
    /// Config with sensible default values
    pub fn sensible_defaults() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(4096),
            default_travelers: default_travelers(),
            default_budget: default_budget(),
            memory_ttl_secs: default_memory_ttl(),
            memory_top_k: default_top_k(),
            ..Default::default()
        }
    }

    /// Configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "wayfarer", "wayfarer").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Path of the config file
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Resolve a tool credential from config first, environment second.
    pub fn credential(configured: Option<&String>, env_var: &str) -> Option<String> {
        configured
            .cloned()
            .or_else(|| std::env::var(env_var).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Load configuration from the default config file
pub fn load_config() -> Result<WayfarerConfig, WayfarerError> {
    let path = WayfarerConfig::config_path().ok_or_else(|| {
        WayfarerError::Configuration("Could not determine config path".to_string())
    })?;

    load_config_from(&path)
}

/// Load configuration from an explicit path; defaults when absent
pub fn load_config_from(path: &Path) -> Result<WayfarerConfig, WayfarerError> {
    if !path.exists() {
        return Ok(WayfarerConfig::sensible_defaults());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| WayfarerError::Configuration(format!("Failed to read config: {e}")))?;

    toml::from_str(&content)
        .map_err(|e| WayfarerError::Configuration(format!("Invalid TOML config: {e}")))
}

/// Save configuration to the default config file
pub fn save_config(config: &WayfarerConfig) -> Result<(), WayfarerError> {
    let path = WayfarerConfig::config_path().ok_or_else(|| {
        WayfarerError::Configuration("Could not determine config path".to_string())
    })?;

    save_config_to(&path, config)
}

/// Save configuration to an explicit path
pub fn save_config_to(path: &Path, config: &WayfarerConfig) -> Result<(), WayfarerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| WayfarerError::Configuration(format!("Failed to create config dir: {e}")))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| WayfarerError::Configuration(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| WayfarerError::Configuration(format!("Failed to write config: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensible_defaults() {
        let config = WayfarerConfig::sensible_defaults();
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.default_travelers, 1);
        assert_eq!(config.default_budget, 10_000);
        assert_eq!(config.memory_ttl_secs, 3600);
        assert_eq!(config.memory_top_k, 3);
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn test_credential_prefers_config() {
        let configured = Some("from-config".to_string());
        let got = WayfarerConfig::credential(configured.as_ref(), "WAYFARER_TEST_UNSET_VAR");
        assert_eq!(got.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_credential_empty_is_none() {
        let configured = Some("  ".to_string());
        let got = WayfarerConfig::credential(configured.as_ref(), "WAYFARER_TEST_UNSET_VAR");
        assert!(got.is_none());
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = WayfarerConfig::sensible_defaults();
        config.default_provider = Some("gemini".to_string());

        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.default_provider.as_deref(), Some("gemini"));
        assert_eq!(loaded.memory_top_k, config.memory_top_k);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let loaded = load_config_from(&temp.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.default_travelers, 1);
    }
}

//! Configuration for NutriSync.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::CoreError;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the local state cache
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name of the cached state snapshot inside `data_dir`
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Remote store connection
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Advisory service connection
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

/// Remote upsert service configuration.
///
/// Both `url` and `api_key` must be present for cloud mode; anything less
/// runs local-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Advisory (language model) service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nutrisync")
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nutrisync")
        .join("config.yaml")
}

fn default_cache_file() -> String {
    "amar_health_state.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// True when both endpoint and key are set and non-empty.
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        present(&self.url) && present(&self.api_key)
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_file: default_cache_file(),
            log_level: default_log_level(),
            remote: RemoteConfig::default(),
            advisor: AdvisorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let config_path = default_config_path();

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_yaml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `GEMINI_API_KEY`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("SUPABASE_URL") {
            self.remote.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.remote.api_key = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.advisor.api_key = Some(key);
        }
        self
    }

    /// Full path of the cached state snapshot
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_file)
    }

    /// Ensure data directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_file, "amar_health_state.json");
        assert_eq!(config.log_level, "info");
        assert!(!config.remote.is_configured());
        assert_eq!(config.advisor.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
    }

    #[test]
    fn test_remote_requires_url_and_key() {
        let mut remote = RemoteConfig {
            url: Some("https://example.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(!remote.is_configured());

        remote.api_key = Some("   ".to_string());
        assert!(!remote.is_configured());

        remote.api_key = Some("anon-key".to_string());
        assert!(remote.is_configured());
    }

    #[test]
    fn test_load_from_yaml_with_partial_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "data_dir: /tmp/nutrisync-test\nremote:\n  url: https://db.example\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/nutrisync-test"));
        assert_eq!(config.remote.url.as_deref(), Some("https://db.example"));
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(
            config.cache_path(),
            PathBuf::from("/tmp/nutrisync-test/amar_health_state.json")
        );
    }

    #[test]
    fn test_load_from_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "remote: [unclosed").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_overrides(|key| match key {
            "SUPABASE_URL" => Some("https://db.example".to_string()),
            "SUPABASE_ANON_KEY" => Some("anon".to_string()),
            _ => None,
        });
        assert!(config.remote.is_configured());
        assert!(config.advisor.api_key.is_none());
    }
}

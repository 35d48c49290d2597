//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the API
//! origin, timeouts, query retry and caching behaviour, and where the bearer
//! token is persisted.
//!
//! Configuration is stored at `~/.config/intervue/config.json`. Environment
//! variables (`INTERVUE_API_ORIGIN`, `INTERVUE_TOKEN_BACKEND`,
//! `INTERVUE_REQUEST_TIMEOUT_SECS`) override the file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::auth::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

/// Application name used for config/data directory paths
const APP_NAME: &str = "intervue";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_ORIGIN: &str = "http://localhost:3000";

const ENV_API_ORIGIN: &str = "INTERVUE_API_ORIGIN";
const ENV_TOKEN_BACKEND: &str = "INTERVUE_TOKEN_BACKEND";
const ENV_REQUEST_TIMEOUT: &str = "INTERVUE_REQUEST_TIMEOUT_SECS";

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON file in the user data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; the session ends with the process
    Memory,
}

impl std::str::FromStr for TokenBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" => Ok(TokenBackend::Keyring),
            "memory" => Ok(TokenBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown token backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site origin; API calls go to `<api_origin>/api`.
    pub api_origin: String,
    pub request_timeout_secs: u64,
    /// Total attempts for a read, first try included.
    pub max_query_attempts: u32,
    /// How long a successful read is served from cache. 0 disables reuse.
    pub query_stale_secs: u64,
    pub token_backend: TokenBackend,
    /// Overrides the data directory used by the file token backend.
    pub data_dir: Option<PathBuf>,
    /// Email of the last successful sign-in, offered as the default.
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_query_attempts: DEFAULT_MAX_ATTEMPTS,
            query_stale_secs: 0,
            token_backend: TokenBackend::default(),
            data_dir: None,
            last_email: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent) and apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup(ENV_API_ORIGIN).filter(|v| !v.trim().is_empty()) {
            self.api_origin = origin.trim().to_string();
        }
        if let Some(backend) = lookup(ENV_TOKEN_BACKEND) {
            match backend.parse() {
                Ok(backend) => self.token_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_BACKEND),
            }
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
            match timeout.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(e) => warn!(error = %e, value = %timeout, "Ignoring {}", ENV_REQUEST_TIMEOUT),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_query_attempts)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.query_stale_secs)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Storage backend for the bearer token.
    pub fn token_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        Ok(match self.token_backend {
            TokenBackend::File => Arc::new(FileStorage::new(self.data_dir()?)),
            TokenBackend::Keyring => Arc::new(KeyringStorage::new()),
            TokenBackend::Memory => Arc::new(MemoryStorage::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_origin, "http://localhost:3000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_policy().max_attempts(), 3);
        assert_eq!(config.stale_time(), Duration::ZERO);
        assert_eq!(config.token_backend, TokenBackend::File);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_origin":"https://app.example.com","token_backend":"keyring"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_origin, "https://app.example.com");
        assert_eq!(config.token_backend, TokenBackend::Keyring);
        assert_eq!(config.max_query_attempts, 3);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.api_origin, DEFAULT_API_ORIGIN);
    }

    #[test]
    fn test_last_email_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            last_email: Some("ada@example.com".to_string()),
            token_backend: TokenBackend::Memory,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_email.as_deref(), Some("ada@example.com"));
        assert_eq!(loaded.token_backend, TokenBackend::Memory);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_ORIGIN, " https://staging.example.com "),
            (ENV_TOKEN_BACKEND, "Memory"),
            (ENV_REQUEST_TIMEOUT, "not-a-number"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_origin, "https://staging.example.com");
        assert_eq!(config.token_backend, TokenBackend::Memory);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_file_backend_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let storage = config.token_storage().unwrap();
        storage.set("token", "abc").unwrap();
        assert!(dir.path().join("storage.json").exists());
    }
}

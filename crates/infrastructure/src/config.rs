//! Application configuration.
//!
//! Values come from an optional TOML file (path in `TETHER_CONFIG`,
//! default `tether.toml`) overridden by `TETHER__SECTION__KEY`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use tether_domain::DEFAULT_CONNECTION;

use crate::adapters::DEFAULT_PROFILE_PATH;
use crate::error::{InfrastructureError, InfrastructureResult};
use crate::http::{DEFAULT_RETRIES, RetryPolicy};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "TETHER_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "tether.toml";

/// Request client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the backend.
    pub base_url: String,
    /// Retries per call.
    pub retries: u32,
    /// First backoff delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Backoff cap in milliseconds.
    pub backoff_max_ms: u64,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Customer profile endpoint.
    pub profile_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            retries: DEFAULT_RETRIES,
            backoff_base_ms: 100,
            backoff_max_ms: 2000,
            timeout_ms: 30_000,
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
        }
    }
}

impl ApiSettings {
    /// Returns the retry policy described by these settings.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_retries(self.retries)
            .with_backoff(
                Duration::from_millis(self.backoff_base_ms),
                Duration::from_millis(self.backoff_max_ms),
            )
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Tenant base URL.
    pub domain: String,
    /// Public client id.
    pub client_id: String,
    /// API audience.
    pub audience: Option<String>,
    /// Connection used for interactive login.
    pub connection: String,
    /// Loopback port receiving the authorization redirect.
    pub callback_port: u16,
    /// Token endpoint timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            audience: None,
            connection: DEFAULT_CONNECTION.to_string(),
            callback_port: 8080,
            timeout_ms: 30_000,
        }
    }
}

impl IdentitySettings {
    /// Returns the token endpoint timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Data directory; the platform data directory when unset.
    pub dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Returns the directory holding tokens, session state and device id.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the platform
    /// has no data directory.
    pub fn resolve_dir(&self) -> InfrastructureResult<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("tether"))
            .ok_or(InfrastructureError::NoDataDir)
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Request client
    pub api: ApiSettings,
    /// Identity provider
    pub identity: IdentitySettings,
    /// Storage
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Loads the file named by `TETHER_CONFIG` (or `tether.toml`) and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value has the
    /// wrong type.
    pub fn load() -> InfrastructureResult<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path, Environment::with_prefix("TETHER").separator("__"))
    }

    /// Loads `path` if it exists, then applies `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value has the
    /// wrong type.
    pub fn load_from(path: &str, environment: Environment) -> InfrastructureResult<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

//! Configuration management for rusty-drive.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Service-account key path used when running in production (mounted secret).
pub const PRODUCTION_CREDENTIALS_PATH: &str = "/run/secrets/google_creds";

/// Service-account key path used in development (local file).
pub const DEVELOPMENT_CREDENTIALS_PATH: &str = "credentials.json";

/// Deployment mode, selected via the `APP_ENV` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Production,
    Development,
}

impl DeploymentMode {
    /// Read the deployment mode from `APP_ENV`.
    ///
    /// Anything other than `production` (including an unset variable) is
    /// treated as development.
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").as_deref() {
            Ok("production") => DeploymentMode::Production,
            _ => DeploymentMode::Development,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment mode.
    pub mode: DeploymentMode,

    /// Explicit service-account key path, overriding the mode default.
    pub credentials_path: Option<PathBuf>,
}

impl Config {
    /// Build configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            mode: DeploymentMode::from_env(),
            credentials_path: None,
        }
    }

    /// Build configuration with an explicit credentials path.
    pub fn with_credentials_path(path: PathBuf) -> Self {
        Self {
            mode: DeploymentMode::from_env(),
            credentials_path: Some(path),
        }
    }

    /// Resolve the service-account key file path for this configuration.
    pub fn resolve_credentials_path(&self) -> PathBuf {
        if let Some(path) = &self.credentials_path {
            return path.clone();
        }

        match self.mode {
            DeploymentMode::Production => PathBuf::from(PRODUCTION_CREDENTIALS_PATH),
            DeploymentMode::Development => PathBuf::from(DEVELOPMENT_CREDENTIALS_PATH),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Development,
            credentials_path: None,
        }
    }
}

// Configuration file and environment-variable layering for edgeops
//
// Connection defaults can live in a TOML file under the user config
// directory; environment variables override the file, and CLI flags
// override both. The merged result is folded into a ConnectConfig.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::types::ConnectConfig;
use crate::error::{EdgeError, Result};

/// Environment variable names recognized by edgeops
pub struct EnvVars;

impl EnvVars {
    pub const MGMT_SERVER: &'static str = "EDGEOPS_MGMT_SERVER";
    pub const ORG: &'static str = "EDGEOPS_ORG";
    pub const USERNAME: &'static str = "EDGEOPS_USERNAME";
    pub const PASSWORD: &'static str = "EDGEOPS_PASSWORD";
    pub const TOKEN: &'static str = "EDGEOPS_TOKEN";
}

/// Connection defaults loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Management API base URL
    pub mgmt_server: Option<String>,
    /// Default organization
    pub org: Option<String>,
    /// Username for authentication
    pub username: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
    /// Pre-acquired bearer token
    pub token: Option<String>,
}

impl FileConfig {
    /// Default path of the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EdgeError::Config("could not determine config directory".to_string()))?;
        Ok(config_dir.join("edgeops").join("config.toml"))
    }

    /// Load the configuration file, returning defaults when it is absent
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load a configuration file from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No configuration file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&contents)
            .map_err(|e| EdgeError::Config(format!("invalid config file {:?}: {}", path, e)))?;

        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Apply environment-variable overrides on top of the file values
    pub fn apply_environment(mut self) -> Self {
        if let Ok(server) = env::var(EnvVars::MGMT_SERVER) {
            self.mgmt_server = Some(server);
        }
        if let Ok(org) = env::var(EnvVars::ORG) {
            self.org = Some(org);
        }
        if let Ok(username) = env::var(EnvVars::USERNAME) {
            self.username = Some(username);
        }
        if let Ok(password) = env::var(EnvVars::PASSWORD) {
            self.password = Some(password);
        }
        if let Ok(token) = env::var(EnvVars::TOKEN) {
            self.token = Some(token);
        }
        self
    }

    /// Fill gaps in a CLI-built ConnectConfig from these defaults
    pub fn merge_into(&self, mut config: ConnectConfig) -> ConnectConfig {
        if config.org.is_empty() {
            if let Some(org) = &self.org {
                config.org = org.clone();
            }
        }
        if let Some(server) = &self.mgmt_server {
            if config.mgmt_server.is_empty() {
                config.mgmt_server = server.clone();
            }
        }
        if config.username.is_none() {
            config.username = self.username.clone();
        }
        if config.password.is_none() {
            config.password = self.password.clone();
        }
        if config.token.is_none() {
            config.token = self.token.clone();
        }
        config
    }
}

//! Trackerlink server configuration
//!
//! Loaded from a TOML file (`--config` / `TRACKERLINK_CONFIG`). Every section
//! has defaults, so an empty file or no file at all yields a working setup.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main Trackerlink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: HttpConfig,

    /// Admin authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Settings storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote tracker client configuration
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde alone cannot
    pub fn validate(&self) -> Result<()> {
        if !self.server.settings_path.starts_with('/') {
            return Err(Error::Config(format!(
                "settings_path must start with '/': {}",
                self.server.settings_path
            )));
        }
        if self.auth.user_header.is_empty() {
            return Err(Error::Config("auth.user_header must not be empty".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL of the host application (shown on the settings page)
    pub base_url: String,

    /// Path the settings page is mounted at
    pub settings_path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            base_url: "http://127.0.0.1:18791".to_string(),
            settings_path: "/plugins/servlet/tracker/settings".to_string(),
        }
    }
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the authenticated username, set by the fronting proxy
    pub user_header: String,

    /// Usernames with admin rights
    pub admins: Vec<String>,

    /// Login page of the host application
    pub login_url: String,

    /// Query parameter carrying the return URL on the login page
    pub return_param: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-remote-user".to_string(),
            admins: vec!["admin".to_string()],
            login_url: "/login".to_string(),
            return_param: "os_destination".to_string(),
        }
    }
}

/// Settings storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the global settings store; in-memory when unset
    pub settings_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let file = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackerlink")
            .join("settings.json");

        Self {
            settings_file: Some(file),
        }
    }
}

/// Remote tracker client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Connect timeout for validation requests in seconds (none when unset)
    pub connect_timeout_secs: Option<u64>,
}

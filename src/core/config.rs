//! Application configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Environment variable selecting the execution mode
pub const ENVIRONMENT_VAR: &str = "FLATDOCS_ENV";

/// Execution mode; decides where documents and credentials live by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Read the mode from `FLATDOCS_ENV` ("test" selects [`Environment::Test`])
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("test") => Self::Test,
            _ => Self::Production,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document directory; falls back to the per-environment default
    pub data_dir: Option<PathBuf>,
    /// JSON file mapping usernames to argon2 password hashes
    pub credentials_file: Option<PathBuf>,
    /// Server settings
    pub server: ServerConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Name of the session cookie
    pub session_cookie: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            credentials_file: None,
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4567".to_string(),
            session_cookie: "flatdocs_session".to_string(),
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "flatdocs", "Flatdocs")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk, defaulting when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Directory holding the documents
    pub fn storage_root(&self, env: Environment) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }

        match env {
            Environment::Test => PathBuf::from("test").join("data"),
            Environment::Production => Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("data"))
                .unwrap_or_else(|| PathBuf::from("data")),
        }
    }

    /// Credential file location
    pub fn credentials_path(&self, env: Environment) -> PathBuf {
        if let Some(file) = &self.credentials_file {
            return file.clone();
        }

        match env {
            Environment::Test => PathBuf::from("test").join("users.json"),
            Environment::Production => Self::project_dirs()
                .map(|dirs| dirs.config_dir().join("users.json"))
                .unwrap_or_else(|| PathBuf::from("users.json")),
        }
    }
}

//! Application configuration
//!
//! Loaded from YAML. Every field has a default so a partial (or missing)
//! file still yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, SkillError};

pub const CONFIG_FILE_NAME: &str = "otto_config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub default_repo_root: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_repo_root: PathBuf::from("."),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    pub auto_apply_repairs: bool,
    pub auto_refactor_repo: bool,
}

/// Endpoints of the services skills talk to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub life_os_api_url: String,
    pub otto_api_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            life_os_api_url: "http://localhost:8000".to_string(),
            otto_api_url: "http://localhost:8001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub safety: SafetyConfig,
    pub services: ServicesConfig,
}

impl AppConfig {
    /// Parse a YAML document. An empty document gives the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./otto_config.yaml` is tried,
    /// then the per-user config directory, then the built-in defaults.
    /// Environment overrides are applied last in every case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SkillError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::read(path)?
            }
            None => match Self::candidate_paths().into_iter().find(|p| p.exists()) {
                Some(found) => Self::read(&found)?,
                None => {
                    warn!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = directories::ProjectDirs::from("com", "otto", "otto") {
            paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIFE_OS_API_URL") {
            self.services.life_os_api_url = url;
        }
        if let Ok(url) = std::env::var("OTTO_API_URL") {
            self.services.otto_api_url = url;
        }
    }
}

use crate::error::{Result, UpsintError};
use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "upsint";

/// The filename of the configuration file.
const CONFIG_FILENAME: &str = "config.toml";

// ============================================================================
// Configuration
// ============================================================================

/// User configuration for upsint.
///
/// Loaded once at startup and handed to the commands that need it. Missing
/// fields fall back to their defaults, so partial files work.
///
/// # Example
///
/// ```toml
/// default_remote = "upstream"
/// push_when_creating_pr = true
///
/// [[instances]]
/// name = "work"
/// service = "gitlab"
/// url = "https://gitlab.example.com"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Remote of the parent project. Used to find the project for
    /// `list-*`, `get-changes`, `create-pr` and `checkout-pr`.
    #[serde(default = "default_remote")]
    pub default_remote: String,

    /// Push the current branch to `origin` before opening a pull request.
    #[serde(default = "default_true")]
    pub push_when_creating_pr: bool,

    /// Self-hosted service instances, matched by host.
    #[serde(default)]
    pub instances: Vec<ServiceInstance>,
}

/// A hosting service instance that cannot be recognized from its host name alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Free-form label used in messages
    pub name: String,
    pub service: ServiceKind,
    /// Base URL of the instance, e.g. `https://gitlab.example.com`
    #[serde(default)]
    pub url: Option<String>,
}

impl ServiceInstance {
    /// Host part of `url`, without scheme, credentials, port or path.
    pub fn host(&self) -> Option<String> {
        let url = self.url.as_deref()?.trim();
        let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
        let authority = rest.split('/').next().unwrap_or_default();
        let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = authority.split(':').next().unwrap_or_default();
        if host.is_empty() {
            None
        } else {
            Some(host.to_string())
        }
    }
}

fn default_remote() -> String {
    "upstream".to_string()
}

/// Helper function for serde default values (true).
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_remote: default_remote(),
            push_when_creating_pr: true,
            instances: Vec::new(),
        }
    }
}

// ============================================================================
// Config Validation
// ============================================================================

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`default_remote` must not be empty")]
    EmptyDefaultRemote,

    #[error("instance '{name}' needs a `url` with a host, e.g. \"https://gitlab.example.com\"")]
    InstanceWithoutUrl { name: String },

    #[error("instance '{name}' has an invalid url '{url}'")]
    InvalidInstanceUrl { name: String, url: String },
}

/// Validate a configuration for logical consistency.
///
/// # Validation Rules
///
/// - `default_remote` is not empty
/// - GitLab instances have a `url` with a host (there is no well-known host
///   to fall back to)
/// - any given `url` has a host
pub fn validate_config(config: &Config) -> std::result::Result<(), ConfigError> {
    if config.default_remote.trim().is_empty() {
        return Err(ConfigError::EmptyDefaultRemote);
    }

    for instance in &config.instances {
        match (&instance.url, instance.host()) {
            (None, _) if instance.service == ServiceKind::GitLab => {
                return Err(ConfigError::InstanceWithoutUrl {
                    name: instance.name.clone(),
                });
            }
            (Some(url), None) => {
                return Err(ConfigError::InvalidInstanceUrl {
                    name: instance.name.clone(),
                    url: url.clone(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

// ============================================================================
// Config File Management
// ============================================================================

/// Default config file content with explanatory comments.
///
/// This is written when creating a new config file to help users understand
/// each option without needing to reference documentation.
const DEFAULT_CONFIG_WITH_COMMENTS: &str = r#"# upsint configuration

# Remote of the parent project, used to find the project for list-*,
# get-changes, create-pr and checkout-pr. Falls back to "origin" when the
# repository has no such remote.
default_remote = "upstream"

# Push the current branch to origin before opening a pull request
# - true: push with --set-upstream first
# - false: assume the branch is already pushed
push_when_creating_pr = true

# Self-hosted instances that upsint cannot recognize by host name.
# github.com and hosts containing "gitlab" are detected automatically.
#
# [[instances]]
# name = "work"
# service = "gitlab"   # "github" or "gitlab"
# url = "https://git.example.com"
"#;

/// Get the upsint config directory path (~/.config/upsint/).
///
/// Does not create the directory.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| UpsintError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (~/.config/upsint/config.toml).
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILENAME))
}

/// Load the configuration from `path`, or from [`config_path`] when `None`.
///
/// A missing file is created with default values and comments, and the
/// defaults are returned.
///
/// # Errors
///
/// Returns an error if:
/// - The home directory cannot be determined
/// - The config file cannot be read or created
/// - The config file contains invalid TOML
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    load_config_from(&path)
}

/// Load the configuration stored at `path`, creating it if missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_WITH_COMMENTS)?;
        log::info!("created default configuration at {}", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    parse_config(&content).map_err(|e| {
        UpsintError::Config(format!(
            "Failed to parse config file at {:?}: {}",
            path, e
        ))
    })
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

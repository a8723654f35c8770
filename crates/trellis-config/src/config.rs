//! Configuration types and loading for the trellis system.
//!
//! The main entry point is [`TrellisConfig`], which represents the contents
//! of `trellis.yaml`. Configuration is loaded with [`load_config`] and saved
//! with [`save_config`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Jira section
// ---------------------------------------------------------------------------

/// Jira connection settings and instance-specific field mappings.
///
/// The custom-field ids vary between Jira instances; the defaults match a
/// plain Jira Software setup and can be overridden per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Server host or full base URL (e.g. `jira.example.com` or
    /// `https://jira.example.com`).
    #[serde(default)]
    pub server: String,

    /// Account used for basic auth, usually an e-mail address.
    #[serde(default)]
    pub user: String,

    /// API token. Usually kept out of the file and supplied via the
    /// `TRELLIS_JIRA_TOKEN` environment variable or `--token`.
    #[serde(default)]
    pub token: Option<String>,

    /// Custom field holding the epic link on children of an epic.
    #[serde(default = "default_epic_link_field", rename = "epic-link-field")]
    pub epic_link_field: String,

    /// Custom field holding the epic name on the epic itself.
    #[serde(default = "default_epic_name_field", rename = "epic-name-field")]
    pub epic_name_field: String,

    /// Issue type label used for third-level issues.
    #[serde(default = "default_subtask_type", rename = "subtask-type")]
    pub subtask_type: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            user: String::new(),
            token: None,
            epic_link_field: default_epic_link_field(),
            epic_name_field: default_epic_name_field(),
            subtask_type: default_subtask_type(),
        }
    }
}

fn default_epic_link_field() -> String {
    "customfield_10000".to_string()
}

fn default_epic_name_field() -> String {
    "customfield_10002".to_string()
}

fn default_subtask_type() -> String {
    "Sub-task".to_string()
}

impl JiraConfig {
    /// Normalized base URL for API requests.
    ///
    /// A bare host gets an `https://` prefix; trailing slashes are trimmed.
    pub fn base_url(&self) -> String {
        let server = self.server.trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("https://{server}")
        }
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full trellis configuration, corresponding to `trellis.yaml`.
///
/// All fields use `serde` defaults so that a partially-specified YAML file
/// will be deserialized correctly with sensible default values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrellisConfig {
    /// Jira connection and field mappings.
    #[serde(default)]
    pub jira: JiraConfig,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from the given file path.
///
/// If the file does not exist, a default [`TrellisConfig`] is returned.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
/// or [`ConfigError::ParseError`] if it contains invalid YAML.
pub fn load_config(path: &Path) -> Result<TrellisConfig> {
    if !path.exists() {
        return Ok(TrellisConfig::default());
    }

    let content = std::fs::read_to_string(path)?;

    // An empty file is valid and yields default config.
    if content.trim().is_empty() {
        return Ok(TrellisConfig::default());
    }

    let config: TrellisConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the given file path.
///
/// Parent directories are created if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or
/// [`ConfigError::ParseError`] if serialization fails.
pub fn save_config(path: &Path, config: &TrellisConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let cfg = TrellisConfig::default();
        assert!(cfg.jira.server.is_empty());
        assert!(cfg.jira.token.is_none());
        assert_eq!(cfg.jira.epic_link_field, "customfield_10000");
        assert_eq!(cfg.jira.epic_name_field, "customfield_10002");
        assert_eq!(cfg.jira.subtask_type, "Sub-task");
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let path = PathBuf::from("/nonexistent/path/trellis.yaml");
        let cfg = load_config(&path).unwrap();
        assert!(cfg.jira.server.is_empty());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "jira:\n  server: jira.example.com\n  user: alice@example.com\n";
        let cfg: TrellisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.jira.server, "jira.example.com");
        assert_eq!(cfg.jira.user, "alice@example.com");
        // Everything else should be default
        assert_eq!(cfg.jira.subtask_type, "Sub-task");
        assert_eq!(cfg.jira.epic_link_field, "customfield_10000");
    }

    #[test]
    fn test_kebab_case_field_keys() {
        let yaml = "jira:\n  epic-link-field: customfield_12345\n  subtask-type: Operational Sub-Task\n";
        let cfg: TrellisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.jira.epic_link_field, "customfield_12345");
        assert_eq!(cfg.jira.subtask_type, "Operational Sub-Task");
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.yaml");

        let mut cfg = TrellisConfig::default();
        cfg.jira.server = "jira.example.com".to_string();
        cfg.jira.user = "bot@example.com".to_string();

        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.jira.server, "jira.example.com");
        assert_eq!(loaded.jira.user, "bot@example.com");
    }

    #[test]
    fn test_base_url_normalization() {
        let mut cfg = JiraConfig::default();
        cfg.server = "jira.example.com".to_string();
        assert_eq!(cfg.base_url(), "https://jira.example.com");

        cfg.server = "https://jira.example.com/".to_string();
        assert_eq!(cfg.base_url(), "https://jira.example.com");

        cfg.server = "http://localhost:8080".to_string();
        assert_eq!(cfg.base_url(), "http://localhost:8080");
    }
}

//! Configuration management for CLI, environment variables, and config files.

use crate::credentials::CredentialStore;
use crate::error::{QbtError, ValidationIssue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default qBittorrent Web UI address.
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Main configuration for qbt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the qBittorrent Web API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Where the credential cache lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Overrides the file in the platform temporary directory.
    pub path: Option<PathBuf>,
}

/// Configuration for logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: None,
            password: None,
            timeout: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CredentialsConfig {
    /// Build the credential store for this configuration.
    pub fn store(&self) -> CredentialStore {
        match &self.path {
            Some(path) => CredentialStore::new(path.clone()),
            None => CredentialStore::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &PathBuf) -> Result<Self, QbtError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| QbtError::IoError(e.to_string()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(toml::from_str(&content)?),
        }
    }

    pub fn from_default_locations() -> Result<Self, QbtError> {
        let config_paths = [
            dirs::config_dir().map(|d| d.join("qbt/config.toml")),
            Some(PathBuf::from("./qbt.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn merge_from_env(mut self) -> Result<Self, QbtError> {
        if let Ok(val) = std::env::var("QBT_URL") {
            self.api.url = val;
        }
        if let Ok(val) = std::env::var("QBT_USERNAME") {
            self.api.username = Some(val);
        }
        if let Ok(val) = std::env::var("QBT_PASSWORD") {
            self.api.password = Some(val);
        }
        if let Ok(val) = std::env::var("QBT_TIMEOUT") {
            if val.is_empty() || !val.chars().all(|c| c.is_ascii_digit()) {
                return Err(QbtError::InvalidArgument(
                    "QBT_TIMEOUT has invalid format".into(),
                ));
            }
            self.api.timeout = val
                .parse()
                .map_err(|_| QbtError::InvalidArgument("QBT_TIMEOUT has invalid format".into()))?;
        }
        if let Ok(val) = std::env::var("QBT_CREDENTIALS_FILE") {
            self.credentials.path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("QBT_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(self)
    }

    pub fn merge_from_cli(mut self, cli: &CliArgs) -> Self {
        if let Some(ref url) = cli.url {
            self.api.url = url.clone();
        }

        if let Some(ref username) = cli.username {
            self.api.username = Some(username.clone());
        }

        if let Some(ref password) = cli.password {
            self.api.password = Some(password.clone());
        }

        if let Some(ref path) = cli.credentials_file {
            self.credentials.path = Some(path.clone());
        }

        self
    }

    /// Load configuration: explicit file or default locations, then env, then CLI.
    pub fn load_with_cli(cli: &CliArgs) -> Result<Self, QbtError> {
        let base = match &cli.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        Ok(base.merge_from_env()?.merge_from_cli(cli))
    }

    pub fn validate(&self) -> Result<(), QbtError> {
        let mut issues = Vec::new();

        if self.api.url.is_empty() {
            issues.push(ValidationIssue {
                field: "api.url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if let Err(e) = reqwest::Url::parse(&self.api.url) {
            issues.push(ValidationIssue {
                field: "api.url".to_string(),
                message: format!("Invalid URL format: {}", e),
            });
        }

        if self.api.timeout == 0 || self.api.timeout > 3600 {
            issues.push(ValidationIssue {
                field: "api.timeout".to_string(),
                message: format!(
                    "Timeout must be between 1 and 3600 seconds, got {}",
                    self.api.timeout
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            issues.push(ValidationIssue {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(QbtError::ValidationError(issues))
        }
    }
}

/// Command-line arguments that override configuration values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub config_file: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
}

//! Configuration management for ghastoolkit
//!
//! Configuration is layered: defaults, then a TOML or YAML file, then the
//! GitHub Actions environment variables, then CLI flags (applied by the
//! caller through [`AppConfig::apply_overrides`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::client::graphql::default_query_paths;
use crate::app::{ClientConfig, GitHub};
use crate::constants::{config as config_constants, env as env_constants, github, http, limits};
use crate::errors::{ConfigError, ConfigResult, RepositoryResult};

/// Unified application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// GitHub instance and repository
    pub github: GitHubConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// GraphQL settings
    pub graphql: GraphQlConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where requests go
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitHubConfig {
    /// Instance URL (GitHub.com or a GitHub Enterprise Server)
    pub instance: String,
    /// Default repository (`owner/repo[@branch]`)
    pub repository: Option<String>,
    /// Full git reference to scope requests to
    pub reference: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            instance: github::INSTANCE.to_string(),
            repository: None,
            reference: None,
        }
    }
}

/// File-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Calls allowed per period
    pub rate_limit_calls: u32,
    /// Period the call quota applies to, e.g. "60s"
    #[serde(with = "humantime_serde")]
    pub rate_limit_period: Duration,
    /// Request timeout, e.g. "60s"
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Retries for throttled or failed requests
    pub max_retries: u32,
    /// Base delay for exponential backoff, e.g. "1s"
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    /// Page size for list endpoints
    pub per_page: usize,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            rate_limit_calls: limits::REST_MAX_CALLS,
            rate_limit_period: limits::REST_PERIOD,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            max_retries: limits::MAX_RETRIES,
            retry_base_delay: Duration::from_millis(limits::RETRY_BASE_DELAY_MS),
            per_page: limits::PER_PAGE,
        }
    }
}

/// GraphQL query locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphQlConfig {
    /// Directories searched for `*.graphql` files
    pub query_paths: Vec<PathBuf>,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            query_paths: default_query_paths(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Values taken from CLI flags; `None` leaves the configured value alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instance: Option<String>,
    pub repository: Option<String>,
    pub reference: Option<String>,
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit path or the first one found)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            debug!("Loading config from: {}", path.display());
            config = Self::load_from_file(&path).await?;
        }

        config.apply_env(&std::env::vars().collect());
        Ok(config)
    }

    /// Apply GitHub Actions style environment variables
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(instance) = get(env_constants::SERVER_URL) {
            self.github.instance = instance;
        }
        if let Some(repository) = get(env_constants::REPOSITORY) {
            self.github.repository = Some(repository);
        }
        if let Some(reference) = get(env_constants::REFERENCE) {
            self.github.reference = Some(reference);
        }
    }

    /// Apply CLI flags
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(instance) = &overrides.instance {
            self.github.instance = instance.clone();
        }
        if let Some(repository) = &overrides.repository {
            self.github.repository = Some(repository.clone());
        }
        if let Some(reference) = &overrides.reference {
            self.github.reference = Some(reference.clone());
        }
    }

    /// Build the GitHub context this configuration describes
    pub fn github(&self, token: Option<String>) -> RepositoryResult<GitHub> {
        let github = GitHub::init(
            self.github.repository.as_deref(),
            Some(&self.github.instance),
            token,
        )?;

        Ok(match (github.repository().cloned(), &self.github.reference) {
            (Some(repo), Some(reference)) => github.with_repository(repo.with_reference(reference)),
            _ => github,
        })
    }

    /// Write the default configuration file unless one exists
    ///
    /// Returns the path and whether a file was created.
    pub async fn initialize(path: Option<PathBuf>) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        let io_error = |source| ConfigError::Io {
            path: config_path.clone(),
            source,
        };
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(io_error)?;

        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            PathBuf::from(config_constants::LOCAL_TOML),
            PathBuf::from(config_constants::LOCAL_YAML),
        ];
        if let Ok(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(config_constants::APP_DIR).join("config.toml"))
    }

    /// Load configuration from a TOML or YAML file (by extension)
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        config.validate()?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.rate_limit_calls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_calls".to_string(),
                value: "0".to_string(),
                reason: "At least one call per period is required".to_string(),
            });
        }
        if self.client.rate_limit_period.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_period".to_string(),
                value: "0s".to_string(),
                reason: "The period must be longer than zero".to_string(),
            });
        }
        if self.client.per_page == 0 || self.client.per_page > limits::PER_PAGE {
            return Err(ConfigError::InvalidValue {
                field: "client.per_page".to_string(),
                value: self.client.per_page.to_string(),
                reason: format!("Must be between 1 and {}", limits::PER_PAGE),
            });
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: "Expected error, warn, info, debug or trace".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# ghastoolkit configuration
# Environment variables (GITHUB_SERVER_URL, GITHUB_REPOSITORY, GITHUB_REF)
# override these values; CLI flags override both.
# The token is never read from this file: set GITHUB_TOKEN or run 'auth setup'.

[github]
instance = "{}"
# repository = "owner/repo"
# reference = "refs/heads/main"

[client]
# REST quota: calls per period (token rate limit is ~5000 per hour)
rate_limit_calls = {}
rate_limit_period = "60s"
request_timeout = "60s"
connect_timeout = "30s"
max_retries = {}
retry_base_delay = "1s"
per_page = {}

[graphql]
# Directories searched for *.graphql query files
query_paths = [".github/graphql"]

[logging]
# Used unless --quiet, --verbose or --very-verbose is given
level = "warn"  # error, warn, info, debug, trace
"#,
            github::INSTANCE,
            limits::REST_MAX_CALLS,
            limits::MAX_RETRIES,
            limits::PER_PAGE,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            rate_limit_calls: self.rate_limit_calls,
            rate_limit_period: self.rate_limit_period,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            per_page: self.per_page,
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.github.instance, "https://github.com");
        assert_eq!(config.client.rate_limit_calls, 80);
        assert_eq!(config.client.rate_limit_period, Duration::from_secs(60));
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML that matches the defaults
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("[client]"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ghastoolkit.toml");
        tokio::fs::write(
            &config_path,
            r#"
[github]
instance = "https://ghes.example.com"
repository = "octo/demo"

[client]
rate_limit_calls = 10
rate_limit_period = "2m"
"#,
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.github.instance, "https://ghes.example.com");
        assert_eq!(config.github.repository.as_deref(), Some("octo/demo"));
        assert_eq!(config.client.rate_limit_calls, 10);
        assert_eq!(config.client.rate_limit_period, Duration::from_secs(120));
        // Unspecified values keep their defaults
        assert_eq!(config.client.per_page, 100);
    }

    #[tokio::test]
    async fn test_config_loading_from_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ghastoolkit.yml");
        tokio::fs::write(
            &config_path,
            "github:\n  repository: octo/demo@main\nlogging:\n  level: debug\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.github.repository.as_deref(), Some("octo/demo@main"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.github.instance, "https://github.com");
    }

    #[tokio::test]
    async fn test_config_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[client]\nper_page = 500\n")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        tokio::fs::write(&config_path, "[logging]\nlevel = \"loud\"\n")
            .await
            .unwrap();
        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_precedence_env_then_overrides() {
        let mut config = AppConfig::default();
        config.github.repository = Some("file/repo".to_string());

        let vars: HashMap<String, String> = [
            ("GITHUB_REPOSITORY", "env/repo"),
            ("GITHUB_REF", "refs/pull/9/merge"),
            ("GITHUB_SERVER_URL", ""),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        config.apply_env(&vars);
        assert_eq!(config.github.repository.as_deref(), Some("env/repo"));
        assert_eq!(config.github.instance, "https://github.com");

        config.apply_overrides(&Overrides {
            repository: Some("cli/repo".to_string()),
            ..Default::default()
        });
        assert_eq!(config.github.repository.as_deref(), Some("cli/repo"));

        let github = config.github(None).unwrap();
        let repo = github.repository().unwrap();
        assert_eq!(repo.full_name(), "cli/repo");
        assert!(repo.is_in_pull_request());
    }

    #[tokio::test]
    async fn test_initialize_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let (written, created) = AppConfig::initialize(Some(path.clone())).await.unwrap();
        assert_eq!(written, path);
        assert!(created);

        let (_, created) = AppConfig::initialize(Some(path.clone())).await.unwrap();
        assert!(!created);

        let loaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_to_runtime_config() {
        let runtime = ClientConfigToml {
            per_page: 50,
            ..Default::default()
        }
        .to_runtime_config();
        assert_eq!(runtime.per_page, 50);
        assert!(runtime.tcp_nodelay);
    }
}

//! Error types for ghastoolkit
//!
//! Each layer of the toolkit has its own error enum; `AppError` wraps them
//! all for the CLI and for callers that do not care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Repository reference parsing errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Not of the form `owner/repo[:path][@branch]`
    #[error("Invalid repository '{value}'. Expected owner/repo[:path][@branch]")]
    InvalidFormat { value: String },

    /// GitHub instance URL could not be used
    #[error("Invalid GitHub instance URL '{url}': {reason}")]
    InvalidInstance { url: String, reason: String },
}

/// Route template errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// Template references a value that was not supplied
    #[error("Missing route parameter '{name}' for path {path}")]
    MissingParameter { name: String, path: String },

    /// `{` without a matching `}`
    #[error("Unterminated placeholder in path {path}")]
    UnterminatedPlaceholder { path: String },
}

/// REST API errors
#[derive(Error, Debug)]
pub enum RestError {
    /// HTTP transport failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server answered 401
    #[error("Authentication Issue")]
    Authentication,

    /// Endpoint needs a token but none is configured
    #[error("GitHub Token required for this request")]
    TokenRequired,

    /// Repository-scoped call made without a repository
    #[error("Repository needs to be set")]
    RepositoryRequired,

    /// Status code other than the expected one
    #[error("REST Request failed :: non-expected server error (HTTP {status}, expected {expected})")]
    UnexpectedStatus { status: u16, expected: u16 },

    /// JSON body carried an `errors` member
    #[error("REST Request failed :: error from server: {message}")]
    ServerError { message: String },

    /// POST returned a status other than the expected one
    #[error("Failed to post data (HTTP {status})")]
    PostFailed { status: u16 },

    /// Rate limit exceeded after retries
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded after retries
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Transport kept failing
    #[error("Maximum retry attempts ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Route template could not be expanded
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Body was not valid JSON or did not match the expected type
    #[error("Failed to decode response body")]
    Json(#[from] serde_json::Error),

    /// Body was valid JSON of the wrong shape
    #[error("Unexpected response shape: expected {expected}")]
    UnexpectedShape { expected: &'static str },

    /// Header value could not be constructed
    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    /// Configured rate limit is unusable
    #[error("Invalid rate limit: {reason}")]
    InvalidRateLimit { reason: String },
}

/// GraphQL API errors
#[derive(Error, Debug)]
pub enum GraphQlError {
    /// HTTP transport failure
    #[error("GraphQL request failed")]
    Http(#[from] reqwest::Error),

    /// Non-200 response
    #[error("Failed to get data from GraphQL API (HTTP {status})")]
    Status { status: u16 },

    /// Template variable without a value
    #[error("Missing variable '{name}' for GraphQL query")]
    MissingVariable { name: String },

    /// Malformed `$` placeholder
    #[error("Invalid placeholder in GraphQL query at offset {offset}")]
    InvalidTemplate { offset: usize },

    /// Query file could not be read
    #[error("Failed to read GraphQL query file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Body was not valid JSON
    #[error("Failed to decode GraphQL response")]
    Json(#[from] serde_json::Error),

    /// Shared transport layer failure (rate limiter, retries, headers)
    #[error(transparent)]
    Rest(#[from] RestError),
}

/// Code Scanning API errors
#[derive(Error, Debug)]
pub enum CodeScanningError {
    /// Underlying REST failure
    #[error(transparent)]
    Rest(#[from] RestError),

    /// Service constructed without a repository
    #[error("CodeScanning requires Repository to be set")]
    RepositoryRequired,

    /// Endpoint returned an object where a list was expected
    #[error("Error getting {what} from {scope}")]
    UnexpectedShape {
        what: &'static str,
        scope: &'static str,
    },

    /// SARIF file could not be written
    #[error("Failed to save SARIF file: {path}")]
    SarifWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// SARIF document could not be serialized
    #[error("Failed to encode SARIF document")]
    Json(#[from] serde_json::Error),
}

/// Token management errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No token in the environment
    #[error("Missing GitHub token. Set GITHUB_TOKEN or run 'auth setup'")]
    MissingToken,

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Token failed format validation
    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    /// File I/O error during token storage
    #[error("Failed to store token")]
    TokenStorage(#[from] std::io::Error),

    /// Verification request failed
    #[error(transparent)]
    Rest(#[from] RestError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Failed to access configuration file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid YAML
    #[error("Invalid YAML configuration")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    GraphQl(#[from] GraphQlError),

    #[error(transparent)]
    CodeScanning(#[from] CodeScanningError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl From<RouteError> for AppError {
    fn from(error: RouteError) -> Self {
        AppError::Rest(RestError::Route(error))
    }
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        let rest = match self {
            AppError::Rest(e) => Some(e),
            AppError::CodeScanning(CodeScanningError::Rest(e)) => Some(e),
            AppError::GraphQl(GraphQlError::Rest(e)) => Some(e),
            AppError::Auth(AuthError::Rest(e)) => Some(e),
            AppError::GraphQl(GraphQlError::Http(_)) => return true,
            _ => None,
        };

        matches!(
            rest,
            Some(
                RestError::Http(_)
                    | RestError::RateLimitExceeded
                    | RestError::ServerOverloaded
                    | RestError::MaxRetriesExceeded { .. }
            )
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Repository(_) => "repository",
            AppError::Rest(_) => "rest",
            AppError::GraphQl(_) => "graphql",
            AppError::CodeScanning(_) => "codescanning",
            AppError::Auth(_) => "authentication",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Repository result type alias
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Route result type alias
pub type RouteResult<T> = std::result::Result<T, RouteError>;

/// REST result type alias
pub type RestResult<T> = std::result::Result<T, RestError>;

/// GraphQL result type alias
pub type GraphQlResult<T> = std::result::Result<T, GraphQlError>;

/// Code Scanning result type alias
pub type CodeScanningResult<T> = std::result::Result<T, CodeScanningError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

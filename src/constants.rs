//! Application constants for ghastoolkit
//!
//! This module centralizes all constants used throughout the toolkit,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names (GitHub Actions compatible)
pub mod env {
    /// Personal access or Actions token
    pub const TOKEN: &str = "GITHUB_TOKEN";

    /// Repository in `owner/repo` form
    pub const REPOSITORY: &str = "GITHUB_REPOSITORY";

    /// Full git reference, e.g. `refs/heads/main` or `refs/pull/1/merge`
    pub const REFERENCE: &str = "GITHUB_REF";

    /// Commit SHA being analysed
    pub const SHA: &str = "GITHUB_SHA";

    /// Instance URL (GitHub.com or GitHub Enterprise Server)
    pub const SERVER_URL: &str = "GITHUB_SERVER_URL";
}

/// GitHub instance endpoints
pub mod github {
    /// Public GitHub instance
    pub const INSTANCE: &str = "https://github.com";

    /// REST API root for GitHub.com
    pub const API_REST: &str = "https://api.github.com";

    /// GraphQL endpoint for GitHub.com
    pub const API_GRAPHQL: &str = "https://api.github.com/graphql";

    /// REST API suffix for GitHub Enterprise Server instances
    pub const ENTERPRISE_API_SUFFIX: &str = "/api";

    /// GraphQL suffix for GitHub Enterprise Server instances
    pub const ENTERPRISE_GRAPHQL_SUFFIX: &str = "/api/graphql";

    /// Prefix of pull request references
    pub const PULL_REQUEST_REF_PREFIX: &str = "refs/pull/";

    /// Prefix of branch references
    pub const BRANCH_REF_PREFIX: &str = "refs/heads/";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests (GitHub rejects requests without one)
    pub const USER_AGENT: &str = concat!("ghastoolkit/", env!("CARGO_PKG_VERSION"));

    /// REST API version header value
    pub const API_VERSION: &str = "2022-11-28";

    /// REST API version header name (lowercase, as `HeaderName` requires)
    pub const API_VERSION_HEADER: &str = "x-github-api-version";

    /// Default `Accept` for REST calls
    pub const ACCEPT_REST: &str = "application/vnd.github.v3+json";

    /// Default `Accept` for GraphQL calls
    pub const ACCEPT_GRAPHQL: &str = "application/vnd.github.hawkgirl-preview+json";

    /// `Accept` used to download SARIF documents
    pub const ACCEPT_SARIF: &str = "application/sarif+json";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// GraphQL request timeout
    pub const GRAPHQL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting, pagination and retry configuration
pub mod limits {
    use super::Duration;

    /// REST calls allowed per period, assuming a user token rather than a
    /// GitHub App (~5000 per hour)
    pub const REST_MAX_CALLS: u32 = 80;

    /// Period the REST quota applies to
    pub const REST_PERIOD: Duration = Duration::from_secs(60);

    /// Items requested per page
    pub const PER_PAGE: usize = 100;

    /// Maximum retry attempts for throttled or failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Maximum concurrent instance lookups when diffing pull request alerts
    pub const INSTANCE_LOOKUP_CONCURRENCY: usize = 4;
}

/// Authentication and token storage
pub mod auth {
    /// Prefixes of fine-grained and app tokens
    pub const TOKEN_PREFIXES: &[&str] = &["ghp_", "gho_", "ghu_", "ghs_", "ghr_", "github_pat_"];

    /// Length of a classic hexadecimal token
    pub const CLASSIC_TOKEN_LENGTH: usize = 40;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;

    /// File the token is persisted to
    pub const DOTENV_FILE: &str = ".env";
}

/// GraphQL query registry
pub mod graphql {
    /// Extension of query files loaded from disk
    pub const QUERY_EXTENSION: &str = "graphql";

    /// Page size of nested connections in the bundled queries
    pub const DEPENDENCIES_PAGE_SIZE: usize = 100;

    /// Variables the bundled queries take as `after:` cursor arguments
    pub const CURSOR_VARIABLES: &[&str] = &["cursor", "manifests_cursor", "dependencies_cursor"];
}

/// Configuration file locations
pub mod config {
    /// Directory name under the user config directory
    pub const APP_DIR: &str = "ghastoolkit";

    /// Project-local TOML config
    pub const LOCAL_TOML: &str = "ghastoolkit.toml";

    /// Project-local YAML config
    pub const LOCAL_YAML: &str = "ghastoolkit.yml";
}

// Re-export commonly used constants for convenience
pub use env::{REPOSITORY as ENV_REPOSITORY, TOKEN as ENV_TOKEN};
pub use http::USER_AGENT;
pub use limits::{MAX_RETRIES, PER_PAGE, REST_MAX_CALLS};

//! ghastoolkit
//!
//! A Rust library for GitHub Advanced Security: a rate-limited REST client
//! with route templates and pagination, a GraphQL client driven by named
//! query templates, and a Code Scanning service on top of them.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(ENV_TOKEN, "GITHUB_TOKEN");
        assert_eq!(PER_PAGE, 100);
        assert!(USER_AGENT.starts_with("ghastoolkit/"));
    }

    #[test]
    fn test_error_types() {
        let auth_error = errors::AuthError::MissingToken;
        let app_error = AppError::Auth(auth_error);

        assert_eq!(app_error.category(), "authentication");
        assert!(!app_error.is_recoverable());
    }
}

//! Prelude module for ghastoolkit
//!
//! Re-exports the items most integrations need, so a single
//! `use ghastoolkit::prelude::*;` is enough for typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ghastoolkit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let github = GitHub::from_env()?;
//!     let rest = RestClient::new(&github, &ClientConfig::default())?;
//!     let codescanning = CodeScanning::new(rest)?;
//!
//!     let analyses = codescanning.get_latest_analyses(None, None).await?;
//!     println!("{} tool(s) analysed this ref", analyses.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Context, clients and services
pub use crate::app::{
    AlertInstance, AlertState, Analysis, ClientConfig, CodeQLDatabase, CodeScanning,
    CodeScanningAlert, GetOptions, GitHub, GraphQlClient, Params, Repository, RestClient,
    RestResponse,
};

// Configuration and token handling
pub use crate::auth::{current_token, get_auth_status, AuthStatus};
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{ENV_REPOSITORY, ENV_TOKEN, USER_AGENT};

pub use tokio;

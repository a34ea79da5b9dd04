//! Core toolkit logic
//!
//! This module contains the GitHub context, the REST and GraphQL clients,
//! the Code Scanning service and its data models.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ghastoolkit::app::{AlertState, ClientConfig, CodeScanning, GitHub, RestClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let github = GitHub::init(Some("octo-org/demo@main"), None, std::env::var("GITHUB_TOKEN").ok())?;
//! let rest = RestClient::new(&github, &ClientConfig::default())?;
//! let codescanning = CodeScanning::new(rest)?;
//!
//! for alert in codescanning.get_alerts(AlertState::Open, None, None).await? {
//!     println!("#{} {} ({})", alert.number, alert.rule.id.as_deref().unwrap_or("-"), alert.severity());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codescanning;
pub mod github;
pub mod models;

// Re-export main public API
pub use client::{ClientConfig, GetOptions, GraphQlClient, Params, RestClient, RestResponse};
pub use codescanning::{latest_per_tool, sarif_id, CodeScanning};
pub use github::{GitHub, Repository};
pub use models::{
    AlertInstance, AlertLocation, AlertRule, AlertState, Analysis, CodeQLDatabase,
    CodeScanningAlert, ToolInfo,
};

//! Data models for the Code Scanning API
//!
//! Only the fields the toolkit reads are modelled. Everything is
//! `#[serde(default)]` so partial payloads (and payloads from older
//! Enterprise Server releases) still deserialize.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Alert state filter and value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    #[default]
    Open,
    Closed,
    Dismissed,
    Fixed,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Open => "open",
            AlertState::Closed => "closed",
            AlertState::Dismissed => "dismissed",
            AlertState::Fixed => "fixed",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(AlertState::Open),
            "closed" => Ok(AlertState::Closed),
            "dismissed" => Ok(AlertState::Dismissed),
            "fixed" => Ok(AlertState::Fixed),
            other => Err(format!(
                "unknown alert state '{}' (expected open, closed, dismissed or fixed)",
                other
            )),
        }
    }
}

/// Analysis tool that produced an alert or analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolInfo {
    pub name: Option<String>,
    pub guid: Option<String>,
    pub version: Option<String>,
}

/// Rule that triggered an alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertRule {
    pub id: Option<String>,
    pub name: Option<String>,
    pub severity: Option<String>,
    pub security_severity_level: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Source location of an alert instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertLocation {
    pub path: Option<String>,
    pub start_line: Option<u64>,
    pub end_line: Option<u64>,
    pub start_column: Option<u64>,
    pub end_column: Option<u64>,
}

/// Alert text attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertMessage {
    pub text: Option<String>,
}

/// One occurrence of an alert on a given ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertInstance {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub analysis_key: Option<String>,
    pub category: Option<String>,
    pub environment: Option<String>,
    pub state: Option<AlertState>,
    pub commit_sha: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub message: AlertMessage,
    #[serde(deserialize_with = "null_as_default")]
    pub location: AlertLocation,
    #[serde(deserialize_with = "null_as_default")]
    pub classifications: Vec<Option<String>>,
}

/// A code scanning alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CodeScanningAlert {
    pub number: u64,
    pub state: AlertState,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fixed_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub dismissed_reason: Option<String>,
    pub url: Option<String>,
    pub html_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub rule: AlertRule,
    #[serde(deserialize_with = "null_as_default")]
    pub tool: ToolInfo,
    pub most_recent_instance: Option<AlertInstance>,
}

impl CodeScanningAlert {
    /// Severity for display: security severity when set, else rule severity
    pub fn severity(&self) -> &str {
        self.rule
            .security_severity_level
            .as_deref()
            .or(self.rule.severity.as_deref())
            .unwrap_or("unknown")
    }

    /// `path:line` of the most recent instance
    pub fn location(&self) -> Option<String> {
        let location = &self.most_recent_instance.as_ref()?.location;
        let path = location.path.as_deref()?;
        Some(match location.start_line {
            Some(line) => format!("{}:{}", path, line),
            None => path.to_string(),
        })
    }
}

/// A code scanning analysis (one SARIF upload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Analysis {
    pub id: u64,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub commit_sha: Option<String>,
    pub analysis_key: Option<String>,
    pub environment: Option<String>,
    pub category: Option<String>,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub results_count: u64,
    pub rules_count: u64,
    pub url: Option<String>,
    pub sarif_id: Option<String>,
    pub tool: ToolInfo,
    pub deletable: bool,
    pub warning: Option<String>,
}

impl Analysis {
    pub fn tool_name(&self) -> Option<&str> {
        self.tool.name.as_deref()
    }
}

/// Account that uploaded a CodeQL database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Uploader {
    pub login: Option<String>,
    pub id: Option<u64>,
}

/// A CodeQL database stored for a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CodeQLDatabase {
    pub id: u64,
    pub name: Option<String>,
    pub language: Option<String>,
    pub uploader: Uploader,
    pub content_type: Option<String>,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub commit_oid: Option<String>,
}

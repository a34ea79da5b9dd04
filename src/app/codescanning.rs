//! GitHub Code Scanning REST API
//!
//! <https://docs.github.com/en/rest/code-scanning>

use std::collections::HashSet;
use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::app::client::rest::{GetOptions, RestClient};
use crate::app::client::route::Params;
use crate::app::github::Repository;
use crate::app::models::{AlertInstance, AlertState, Analysis, CodeQLDatabase, CodeScanningAlert};
use crate::constants::{http, limits};
use crate::errors::{CodeScanningError, CodeScanningResult, RestError};

const ORG_ALERTS: &str = "/orgs/{org}/code-scanning/alerts";
const ALERTS: &str = "/repos/{owner}/{repo}/code-scanning/alerts";
const ALERT: &str = "/repos/{owner}/{repo}/code-scanning/alerts/{alert_number}";
const ALERT_INSTANCES: &str = "/repos/{owner}/{repo}/code-scanning/alerts/{alert_number}/instances";
const ANALYSES: &str = "/repos/{org}/{repo}/code-scanning/analyses";
const ANALYSIS: &str = "/repos/{org}/{repo}/code-scanning/analyses/{sarif_id}";
const CODEQL_DATABASES: &str = "/repos/{owner}/{repo}/code-scanning/codeql/databases";
const CODEQL_DATABASE: &str = "/repos/{owner}/{repo}/code-scanning/codeql/databases/{language}";

/// Code Scanning operations for a single repository
#[derive(Debug, Clone)]
pub struct CodeScanning {
    rest: RestClient,
    repository: Repository,
}

impl CodeScanning {
    /// Wraps a REST client that has a repository set
    ///
    /// # Errors
    ///
    /// Returns `CodeScanningError::RepositoryRequired` otherwise
    pub fn new(rest: RestClient) -> CodeScanningResult<Self> {
        let repository = rest
            .repository()
            .cloned()
            .ok_or(CodeScanningError::RepositoryRequired)?;
        Ok(Self { rest, repository })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Alerts across the repository owner's organization
    ///
    /// <https://docs.github.com/en/rest/code-scanning#list-code-scanning-alerts-for-an-organization>
    pub async fn get_organization_alerts(
        &self,
        state: AlertState,
    ) -> CodeScanningResult<Vec<CodeScanningAlert>> {
        let params = Params::new().set("state", state);
        self.rest
            .get_list(ORG_ALERTS, params, GetOptions::authenticated())
            .await
            .map_err(|e| list_error(e, "alerts", "Organization"))
    }

    /// Alerts for the repository
    ///
    /// <https://docs.github.com/en/rest/code-scanning#list-code-scanning-alerts-for-a-repository>
    pub async fn get_alerts(
        &self,
        state: AlertState,
        tool_name: Option<&str>,
        reference: Option<&str>,
    ) -> CodeScanningResult<Vec<CodeScanningAlert>> {
        let params = Params::new()
            .set("state", state)
            .set_opt("tool_name", tool_name)
            .set_opt("ref", reference);
        self.rest
            .get_list(ALERTS, params, GetOptions::authenticated())
            .await
            .map_err(|e| list_error(e, "alerts", "Repository"))
    }

    /// A single alert
    ///
    /// <https://docs.github.com/en/rest/code-scanning#get-a-code-scanning-alert>
    pub async fn get_alert(&self, alert_number: u64) -> CodeScanningResult<CodeScanningAlert> {
        let params = Params::new().set("alert_number", alert_number);
        Ok(self
            .rest
            .get_object(ALERT, params, GetOptions::authenticated())
            .await?)
    }

    /// Instances of an alert, optionally restricted to one ref
    ///
    /// <https://docs.github.com/en/rest/code-scanning#list-instances-of-a-code-scanning-alert>
    pub async fn get_alert_instances(
        &self,
        alert_number: u64,
        reference: Option<&str>,
    ) -> CodeScanningResult<Vec<AlertInstance>> {
        let params = Params::new()
            .set("alert_number", alert_number)
            .set_opt("ref", reference);
        self.rest
            .get_list(ALERT_INSTANCES, params, GetOptions::default())
            .await
            .map_err(|e| list_error(e, "alert instances", "Repository"))
    }

    /// Alerts the current pull request introduces compared to `base`
    ///
    /// Open alerts on the pull request ref that have no instance on `base`.
    /// Empty when the repository reference is not a pull request.
    pub async fn get_alerts_in_pr(&self, base: &str) -> CodeScanningResult<Vec<CodeScanningAlert>> {
        let repository = self.repository();
        let Some(reference) = repository.reference.as_deref() else {
            return Ok(Vec::new());
        };
        if !repository.is_in_pull_request() {
            return Ok(Vec::new());
        }

        let alerts = self
            .get_alerts(AlertState::Open, None, Some(reference))
            .await?;
        tracing::debug!("{} open alerts on {}", alerts.len(), reference);

        let lookups = alerts.into_iter().map(|alert| async move {
            let instances = self.get_alert_instances(alert.number, Some(base)).await?;
            tracing::debug!("Alert {} has {} instances on {}", alert.number, instances.len(), base);
            Ok::<_, CodeScanningError>(instances.is_empty().then_some(alert))
        });

        let introduced: Vec<Option<CodeScanningAlert>> = stream::iter(lookups)
            .buffered(limits::INSTANCE_LOOKUP_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(introduced.into_iter().flatten().collect())
    }

    /// Analyses for a ref (defaults to the repository reference), optionally one tool
    ///
    /// <https://docs.github.com/en/rest/code-scanning#list-code-scanning-analyses-for-a-repository>
    pub async fn get_analyses(
        &self,
        reference: Option<&str>,
        tool: Option<&str>,
    ) -> CodeScanningResult<Vec<Analysis>> {
        let reference = reference.or(self.repository().reference.as_deref());
        let params = Params::new()
            .set_opt("tool_name", tool)
            .set_opt("ref", reference);
        self.rest
            .get_list(ANALYSES, params, GetOptions::default())
            .await
            .map_err(|e| list_error(e, "analyses", "Repository"))
    }

    /// The most recent analysis of every tool
    ///
    /// The API lists newest first, so the first analysis seen per tool wins.
    pub async fn get_latest_analyses(
        &self,
        reference: Option<&str>,
        tool: Option<&str>,
    ) -> CodeScanningResult<Vec<Analysis>> {
        Ok(latest_per_tool(self.get_analyses(reference, tool).await?))
    }

    /// Downloads the SARIF document of an analysis to `output`
    pub async fn download_sarif(&self, output: &Path, sarif_id: u64) -> CodeScanningResult<()> {
        tracing::debug!("Downloading SARIF file :: {}", sarif_id);

        let params = Params::new().set("sarif_id", sarif_id);
        let sarif = self
            .rest
            .get_with(
                ANALYSIS,
                params,
                GetOptions::default().with_accept(http::ACCEPT_SARIF),
            )
            .await?
            .into_value();

        tracing::debug!("Saving SARIF file to :: {}", output.display());
        let write_error = |source| CodeScanningError::SarifWrite {
            path: output.to_path_buf(),
            source,
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_error)?;
        }
        let content = serde_json::to_string_pretty(&sarif)?;
        tokio::fs::write(output, content)
            .await
            .map_err(write_error)?;

        tracing::debug!("Saved SARIF file");
        Ok(())
    }

    /// CodeQL databases stored for the repository
    ///
    /// <https://docs.github.com/en/rest/code-scanning#list-codeql-databases-for-a-repository>
    pub async fn get_codeql_databases(&self) -> CodeScanningResult<Vec<CodeQLDatabase>> {
        self.rest
            .get_list(CODEQL_DATABASES, Params::new(), GetOptions::default())
            .await
            .map_err(|e| list_error(e, "CodeQL databases", "Repository"))
    }

    /// The CodeQL database for one language
    ///
    /// <https://docs.github.com/en/rest/code-scanning#get-a-codeql-database-for-a-repository>
    pub async fn get_codeql_database(&self, language: &str) -> CodeScanningResult<CodeQLDatabase> {
        let params = Params::new().set("language", language);
        Ok(self
            .rest
            .get_object(CODEQL_DATABASE, params, GetOptions::default())
            .await?)
    }
}

/// Trailing integer of an analysis URL, e.g. `.../analyses/201` → `201`
pub fn sarif_id(url: &str) -> Option<u64> {
    let (_, last) = url.trim_end_matches('/').rsplit_once('/')?;
    last.parse().ok()
}

/// Keeps the first analysis of every tool name
pub fn latest_per_tool(analyses: Vec<Analysis>) -> Vec<Analysis> {
    let mut tools = HashSet::new();
    analyses
        .into_iter()
        .filter(|analysis| tools.insert(analysis.tool.name.clone()))
        .collect()
}

/// Reports an object where a list was expected in the toolkit's own terms
fn list_error(error: RestError, what: &'static str, scope: &'static str) -> CodeScanningError {
    match error {
        RestError::UnexpectedShape { .. } => CodeScanningError::UnexpectedShape { what, scope },
        other => CodeScanningError::Rest(other),
    }
}

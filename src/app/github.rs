//! GitHub instance context and repository references
//!
//! `GitHub` carries everything a request needs to know about where it is
//! going: instance URLs, the token and the default repository. It is a plain
//! value so several instances (e.g. GitHub.com and an Enterprise Server) can
//! be used side by side.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{env as env_constants, github};
use crate::errors::{RepositoryError, RepositoryResult};

/// A repository plus the optional git context it is being looked at in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
    /// Full git reference (`refs/heads/main`, `refs/pull/7/merge`)
    pub reference: Option<String>,
    pub branch: Option<String>,
    pub sha: Option<String>,
    /// Sub-path inside the repository
    pub path: Option<String>,
}

impl Repository {
    /// Creates a repository reference without any git context
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            reference: None,
            branch: None,
            sha: None,
            path: None,
        }
    }

    /// Parses `owner/repo`, `owner/repo@branch`, `owner/repo:path` and
    /// `owner/repo:path@branch`
    pub fn parse(value: &str) -> RepositoryResult<Self> {
        let invalid = || RepositoryError::InvalidFormat {
            value: value.to_string(),
        };

        let (name, branch) = match value.trim().split_once('@') {
            Some((name, branch)) if !branch.is_empty() => (name, Some(branch.to_string())),
            Some(_) => return Err(invalid()),
            None => (value.trim(), None),
        };

        let (name, path) = match name.split_once(':') {
            Some((name, path)) if !path.is_empty() => (name, Some(path.to_string())),
            Some(_) => return Err(invalid()),
            None => (name, None),
        };

        let (owner, repo) = name.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference: branch
                .as_ref()
                .map(|b| format!("{}{}", github::BRANCH_REF_PREFIX, b)),
            branch,
            sha: None,
            path,
        })
    }

    /// Sets the full reference, deriving the branch for `refs/heads/*`
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        self.branch = reference
            .strip_prefix(github::BRANCH_REF_PREFIX)
            .map(str::to_string);
        self.reference = Some(reference);
        self
    }

    /// Sets the commit SHA
    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    /// True when the reference is a pull request merge/head ref
    pub fn is_in_pull_request(&self) -> bool {
        self.reference
            .as_deref()
            .is_some_and(|r| r.starts_with(github::PULL_REQUEST_REF_PREFIX))
    }

    /// Pull request number from `refs/pull/{n}/...`
    pub fn pull_request_number(&self) -> Option<u64> {
        self.reference
            .as_deref()?
            .strip_prefix(github::PULL_REQUEST_REF_PREFIX)?
            .split('/')
            .next()?
            .parse()
            .ok()
    }

    /// `owner/repo` without git context
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// HTTPS clone URL on the given instance
    pub fn clone_url(&self, instance: &str) -> String {
        format!(
            "{}/{}/{}.git",
            instance.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{}", self.owner, self.repo, branch),
            None => write!(f, "{}/{}", self.owner, self.repo),
        }
    }
}

impl FromStr for Repository {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// GitHub instance the toolkit talks to
#[derive(Clone)]
pub struct GitHub {
    instance: String,
    api_rest: String,
    api_graphql: String,
    token: Option<String>,
    repository: Option<Repository>,
}

impl GitHub {
    /// Initialise a context
    ///
    /// `instance` defaults to GitHub.com. Any other instance is treated as a
    /// GitHub Enterprise Server whose APIs live under `{instance}/api`.
    pub fn init(
        repository: Option<&str>,
        instance: Option<&str>,
        token: Option<String>,
    ) -> RepositoryResult<Self> {
        let instance = Self::normalize_instance(instance.unwrap_or(github::INSTANCE))?;

        let (api_rest, api_graphql) = if instance == github::INSTANCE {
            (github::API_REST.to_string(), github::API_GRAPHQL.to_string())
        } else {
            (
                format!("{}{}", instance, github::ENTERPRISE_API_SUFFIX),
                format!("{}{}", instance, github::ENTERPRISE_GRAPHQL_SUFFIX),
            )
        };

        let repository = repository.map(Repository::parse).transpose()?;

        Ok(Self {
            instance,
            api_rest,
            api_graphql,
            token: token.filter(|t| !t.is_empty()),
            repository,
        })
    }

    /// Builds a context from the GitHub Actions environment
    pub fn from_env() -> RepositoryResult<Self> {
        let instance = env::var(env_constants::SERVER_URL).ok();
        let repository = env::var(env_constants::REPOSITORY).ok();
        let token = env::var(env_constants::TOKEN).ok();

        let mut github = Self::init(repository.as_deref(), instance.as_deref(), token)?;

        if let Some(repo) = github.repository.take() {
            let mut repo = match env::var(env_constants::REFERENCE) {
                Ok(reference) if !reference.is_empty() => repo.with_reference(reference),
                _ => repo,
            };
            if let Ok(sha) = env::var(env_constants::SHA) {
                repo = repo.with_sha(sha);
            }
            github.repository = Some(repo);
        }

        Ok(github)
    }

    fn normalize_instance(instance: &str) -> RepositoryResult<String> {
        let trimmed = instance.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| RepositoryError::InvalidInstance {
            url: instance.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RepositoryError::InvalidInstance {
                url: instance.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(trimmed.to_string())
    }

    /// Replaces the default repository
    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Replaces the token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn api_rest(&self) -> &str {
        &self.api_rest
    }

    pub fn api_graphql(&self) -> &str {
        &self.api_graphql
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    /// True for anything other than GitHub.com
    pub fn is_enterprise_server(&self) -> bool {
        self.instance != github::INSTANCE
    }
}

impl Default for GitHub {
    fn default() -> Self {
        Self {
            instance: github::INSTANCE.to_string(),
            api_rest: github::API_REST.to_string(),
            api_graphql: github::API_GRAPHQL.to_string(),
            token: None,
            repository: None,
        }
    }
}

impl fmt::Debug for GitHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHub")
            .field("instance", &self.instance)
            .field("api_rest", &self.api_rest)
            .field("api_graphql", &self.api_graphql)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("repository", &self.repository)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_instance() {
        let github = GitHub::init(Some("GeekMasher/ghastoolkit"), None, None).unwrap();

        assert_eq!(github.instance(), "https://github.com");
        assert_eq!(github.api_rest(), "https://api.github.com");
        assert_eq!(github.api_graphql(), "https://api.github.com/graphql");
        assert!(!github.is_enterprise_server());
    }

    #[test]
    fn test_enterprise_server_instance() {
        let github = GitHub::init(
            Some("GeekMasher/ghastoolkit"),
            Some("https://github.geekmasher.dev/"),
            None,
        )
        .unwrap();

        assert_eq!(github.instance(), "https://github.geekmasher.dev");
        assert_eq!(github.api_rest(), "https://github.geekmasher.dev/api");
        assert_eq!(
            github.api_graphql(),
            "https://github.geekmasher.dev/api/graphql"
        );
        assert!(github.is_enterprise_server());
    }

    #[test]
    fn test_invalid_instance() {
        assert!(GitHub::init(None, Some("not a url"), None).is_err());
        assert!(GitHub::init(None, Some("ftp://example.com"), None).is_err());
    }

    #[test]
    fn test_empty_token_is_none() {
        let github = GitHub::init(None, None, Some(String::new())).unwrap();
        assert!(github.token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let github = GitHub::default().with_token("ghp_secret");
        let debug = format!("{:?}", github);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_repository() {
        let repo = Repository::parse("GeekMasher/ghastoolkit").unwrap();
        assert_eq!(repo.owner, "GeekMasher");
        assert_eq!(repo.repo, "ghastoolkit");
        assert!(repo.reference.is_none());

        let repo = Repository::parse("GeekMasher/ghastoolkit@main").unwrap();
        assert_eq!(repo.owner, "GeekMasher");
        assert_eq!(repo.repo, "ghastoolkit");
        assert_eq!(repo.branch.as_deref(), Some("main"));
        assert_eq!(repo.reference.as_deref(), Some("refs/heads/main"));

        let repo = Repository::parse("GeekMasher/ghastoolkit:src/lib@dev").unwrap();
        assert_eq!(repo.path.as_deref(), Some("src/lib"));
        assert_eq!(repo.branch.as_deref(), Some("dev"));
    }

    #[test]
    fn test_parse_repository_invalid() {
        for value in ["ghastoolkit", "/repo", "owner/", "owner/repo@", "a/b/c", "owner/repo:"] {
            assert!(Repository::parse(value).is_err(), "{} should be rejected", value);
        }
    }

    #[test]
    fn test_pull_request_reference() {
        let repo = Repository::new("octo", "demo").with_reference("refs/pull/42/merge");
        assert!(repo.is_in_pull_request());
        assert_eq!(repo.pull_request_number(), Some(42));
        assert!(repo.branch.is_none());

        let repo = Repository::new("octo", "demo").with_reference("refs/heads/main");
        assert!(!repo.is_in_pull_request());
        assert_eq!(repo.pull_request_number(), None);
        assert_eq!(repo.branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_display_and_clone_url() {
        let repo = Repository::parse("octo/demo@main").unwrap();
        assert_eq!(repo.to_string(), "octo/demo@main");
        assert_eq!(repo.full_name(), "octo/demo");
        assert_eq!(
            repo.clone_url("https://github.com/"),
            "https://github.com/octo/demo.git"
        );
    }
}

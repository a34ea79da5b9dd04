//! Route construction for GitHub API paths
//!
//! Paths are templates such as `/repos/{owner}/{repo}/code-scanning/alerts/{alert_number}`.
//! `{owner}`, `{org}` and `{repo}` come from the repository, everything else
//! from the request parameters. Parameters that the template does not use are
//! sent as the query string.

use crate::app::github::{GitHub, Repository};
use crate::errors::{RouteError, RouteResult};

/// Which API root a route is built against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Rest,
    GraphQl,
}

/// Ordered request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing an existing value with the same name
    pub fn set(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
        self
    }

    /// Sets a parameter only when a value is present
    pub fn set_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fully expanded route: absolute URL plus leftover query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub url: String,
    pub query: Vec<(String, String)>,
}

/// Expands a path template against a repository and parameters
///
/// Returns the formatted path and the names of the parameters it consumed.
pub fn format_path(
    path: &str,
    repository: &Repository,
    params: &Params,
) -> RouteResult<(String, Vec<String>)> {
    let mut formatted = String::with_capacity(path.len());
    let mut used = Vec::new();
    let mut chars = path.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                formatted.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                formatted.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(RouteError::UnterminatedPlaceholder {
                        path: path.to_string(),
                    });
                }

                let value = match name.as_str() {
                    "owner" | "org" => repository.owner.as_str(),
                    "repo" => repository.repo.as_str(),
                    other => {
                        let value =
                            params
                                .get(other)
                                .ok_or_else(|| RouteError::MissingParameter {
                                    name: other.to_string(),
                                    path: path.to_string(),
                                })?;
                        used.push(name.clone());
                        value
                    }
                };
                formatted.push_str(value);
            }
            c => formatted.push(c),
        }
    }

    Ok((formatted, used))
}

/// Builds the absolute URL for a path on the given API
pub fn route(
    github: &GitHub,
    path: &str,
    repository: &Repository,
    kind: RouteKind,
    params: &Params,
) -> RouteResult<Route> {
    let (mut formatted, used) = format_path(path, repository, params)?;
    if !formatted.starts_with('/') {
        formatted.insert(0, '/');
    }

    let base = match kind {
        RouteKind::Rest => github.api_rest(),
        RouteKind::GraphQl => github.api_graphql(),
    };

    let query = params
        .iter()
        .filter(|(name, _)| !used.iter().any(|u| u == name))
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

    Ok(Route {
        url: format!("{}{}", base, formatted),
        query,
    })
}

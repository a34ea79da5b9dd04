//! GraphQL API client with a named query registry
//!
//! Queries are templates: `$name` and `${name}` are replaced before the
//! query is sent, and `$$` produces a literal `$`. A few queries ship with
//! the crate; more are loaded from `*.graphql` files on disk, keyed by file
//! stem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use crate::app::client::config::{api_headers, ClientConfig};
use crate::app::client::http::HttpHandler;
use crate::app::github::GitHub;
use crate::constants::{graphql, http};
use crate::errors::{GraphQlError, GraphQlResult};

/// Queries compiled into the binary
const BUNDLED_QUERIES: &[(&str, &str)] = &[
    (
        "GetDependencyAlerts",
        include_str!("queries/GetDependencyAlerts.graphql"),
    ),
    (
        "GetDependencyInfo",
        include_str!("queries/GetDependencyInfo.graphql"),
    ),
];

/// Client for the GitHub GraphQL API
#[derive(Debug)]
pub struct GraphQlClient {
    url: String,
    http: HttpHandler,
    queries: HashMap<String, String>,
}

impl GraphQlClient {
    /// Creates a client with the bundled queries registered
    pub fn new(github: &GitHub, config: &ClientConfig) -> GraphQlResult<Self> {
        let headers = api_headers(github.token(), http::ACCEPT_GRAPHQL)?;
        let client = config.build_http_client_with_timeout(headers, http::GRAPHQL_TIMEOUT)?;
        let http = HttpHandler::new(client, config)?;

        let queries = BUNDLED_QUERIES
            .iter()
            .map(|(name, query)| (name.to_string(), query.to_string()))
            .collect();

        Ok(Self {
            url: github.api_graphql().to_string(),
            http,
            queries,
        })
    }

    /// Loads every `*.graphql` file from the given directories
    ///
    /// Paths that are not directories are skipped. A file whose stem matches
    /// an already registered query replaces it.
    ///
    /// Returns the number of queries loaded.
    pub async fn load_queries<P: AsRef<Path>>(&mut self, paths: &[P]) -> GraphQlResult<usize> {
        let mut loaded = 0;

        for path in paths {
            let path = path.as_ref();
            if !tokio::fs::metadata(path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
            {
                continue;
            }

            let io_error = |source| GraphQlError::Io {
                path: path.to_path_buf(),
                source,
            };
            let mut entries = tokio::fs::read_dir(path).await.map_err(io_error)?;

            while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
                let file = entry.path();
                if file.extension().and_then(|e| e.to_str()) != Some(graphql::QUERY_EXTENSION) {
                    continue;
                }
                let Some(name) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                else {
                    continue;
                };

                let data = tokio::fs::read_to_string(&file)
                    .await
                    .map_err(|source| GraphQlError::Io {
                        path: file.clone(),
                        source,
                    })?;
                tracing::debug!("Loaded GraphQL Query :: {}", name);
                self.queries.insert(name, data);
                loaded += 1;
            }
        }

        Ok(loaded)
    }

    /// Registers a query under `name`
    pub fn register(&mut self, name: impl Into<String>, query: impl Into<String>) {
        self.queries.insert(name.into(), query.into());
    }

    /// Sorted names of every registered query
    pub fn query_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    /// Runs a named query
    ///
    /// An unknown name yields an empty object without touching the network.
    /// GraphQL-level `errors` are logged and the body is still returned.
    pub async fn query(&self, name: &str, vars: &HashMap<String, String>) -> GraphQlResult<Value> {
        let Some(template) = self.queries.get(name) else {
            tracing::warn!("Unknown GraphQL query :: {}", name);
            return Ok(Value::Object(Map::new()));
        };
        let query = format_query(template, vars)?;
        let body = json!({ "query": query });

        let response = self
            .http
            .send(|client| client.post(&self.url).json(&body))
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let content = response.text().await.unwrap_or_default();
            tracing::error!("GraphQL API Status :: {}", status.as_u16());
            tracing::error!("GraphQL Content :: {}", content);
            return Err(GraphQlError::Status {
                status: status.as_u16(),
            });
        }

        let result: Value = serde_json::from_str(&response.text().await?)?;
        if let Some(errors) = result.get("errors").and_then(Value::as_array) {
            for error in errors {
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error");
                tracing::warn!("GraphQL Query failed :: {}", message);
            }
        }

        Ok(result)
    }
}

/// `after: "<cursor>"` argument for paginated queries, empty for the first page
pub fn cursor_argument(cursor: Option<&str>) -> String {
    match cursor {
        Some(cursor) => format!("after: \"{}\"", cursor),
        None => String::new(),
    }
}

/// Substitutes `$name` / `${name}` placeholders; `$$` is a literal `$`
pub fn format_query(template: &str, vars: &HashMap<String, String>) -> GraphQlResult<String> {
    let is_start = |c: char| c == '_' || c.is_ascii_alphabetic();
    let is_part = |c: char| c == '_' || c.is_ascii_alphanumeric();

    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(position) = rest.find('$') {
        output.push_str(&rest[..position]);
        let at = offset + position;
        let after = &rest[position + 1..];

        let (name, consumed) = match after.chars().next() {
            Some('$') => {
                output.push('$');
                rest = &after[1..];
                offset = at + 2;
                continue;
            }
            Some('{') => {
                let close = after
                    .find('}')
                    .ok_or(GraphQlError::InvalidTemplate { offset: at })?;
                let name = &after[1..close];
                if !name.starts_with(is_start) || !name.chars().all(is_part) {
                    return Err(GraphQlError::InvalidTemplate { offset: at });
                }
                (name, close + 1)
            }
            Some(c) if is_start(c) => {
                let end = after.find(|c: char| !is_part(c)).unwrap_or(after.len());
                (&after[..end], end)
            }
            _ => return Err(GraphQlError::InvalidTemplate { offset: at }),
        };

        let value = vars.get(name).ok_or_else(|| GraphQlError::MissingVariable {
            name: name.to_string(),
        })?;
        output.push_str(value);

        rest = &after[consumed..];
        offset = at + 1 + consumed;
    }

    output.push_str(rest);
    Ok(output)
}

/// Directories holding `*.graphql` files relative to the working directory
pub fn default_query_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".github/graphql")]
}

//! REST API client with pagination
//!
//! List endpoints are walked page by page (`per_page`/`page`) until a short
//! page comes back. Object responses are returned as soon as they arrive.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::app::client::config::{rest_headers, ClientConfig};
use crate::app::client::http::HttpHandler;
use crate::app::client::route::{route, Params, Route, RouteKind};
use crate::app::github::{GitHub, Repository};
use crate::errors::{RestError, RestResult};

/// Body of a successful GET
#[derive(Debug, Clone, PartialEq)]
pub enum RestResponse {
    /// A single JSON object
    Object(Value),
    /// Every item of every page
    List(Vec<Value>),
}

impl RestResponse {
    pub fn into_list(self) -> RestResult<Vec<Value>> {
        match self {
            RestResponse::List(items) => Ok(items),
            RestResponse::Object(_) => Err(RestError::UnexpectedShape { expected: "list" }),
        }
    }

    pub fn into_object(self) -> RestResult<Value> {
        match self {
            RestResponse::Object(value) => Ok(value),
            RestResponse::List(_) => Err(RestError::UnexpectedShape { expected: "object" }),
        }
    }

    /// Converts back into a single JSON value
    pub fn into_value(self) -> Value {
        match self {
            RestResponse::Object(value) => value,
            RestResponse::List(items) => Value::Array(items),
        }
    }
}

/// Options for a single GET
#[derive(Debug, Clone, Copy)]
pub struct GetOptions<'a> {
    /// Status code treated as success
    pub expected: StatusCode,
    /// Fail early when no token is configured
    pub authenticated: bool,
    /// Per-request `Accept` override
    pub accept: Option<&'a str>,
}

impl Default for GetOptions<'_> {
    fn default() -> Self {
        Self {
            expected: StatusCode::OK,
            authenticated: false,
            accept: None,
        }
    }
}

impl<'a> GetOptions<'a> {
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Default::default()
        }
    }

    pub fn with_accept(mut self, accept: &'a str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// Client for the GitHub REST API
///
/// Clones share the connection pool and the rate limit quota.
#[derive(Debug, Clone)]
pub struct RestClient {
    github: GitHub,
    repository: Option<Repository>,
    http: Arc<HttpHandler>,
    per_page: usize,
}

impl RestClient {
    /// Creates a client for the context's default repository
    ///
    /// # Errors
    ///
    /// Returns `RestError` if the token cannot be used as a header or the
    /// HTTP client cannot be built
    pub fn new(github: &GitHub, config: &ClientConfig) -> RestResult<Self> {
        let client = config.build_http_client(rest_headers(github.token())?)?;
        let http = HttpHandler::new(client, config)?;

        tracing::debug!("Created REST client for {}", github.api_rest());

        Ok(Self {
            github: github.clone(),
            repository: github.repository().cloned(),
            http: Arc::new(http),
            per_page: config.per_page.max(1),
        })
    }

    /// A client for another repository sharing this client's quota
    pub fn for_repository(&self, repository: Repository) -> Self {
        Self {
            repository: Some(repository),
            ..self.clone()
        }
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    pub fn github(&self) -> &GitHub {
        &self.github
    }

    pub fn has_token(&self) -> bool {
        self.github.token().is_some()
    }

    fn route(&self, path: &str, params: &Params) -> RestResult<Route> {
        let repository = self
            .repository
            .as_ref()
            .ok_or(RestError::RepositoryRequired)?;
        Ok(route(
            &self.github,
            path,
            repository,
            RouteKind::Rest,
            params,
        )?)
    }

    /// GET with default options
    pub async fn get(&self, path: &str, params: Params) -> RestResult<RestResponse> {
        self.get_with(path, params, GetOptions::default()).await
    }

    /// GET a path, following pagination for list responses
    ///
    /// # Errors
    ///
    /// - `RepositoryRequired` when no repository is set
    /// - `TokenRequired` when `options.authenticated` and no token is set
    /// - `Authentication` on 401, `UnexpectedStatus` on any other unexpected status
    /// - `ServerError` when the body carries an `errors` member
    pub async fn get_with(
        &self,
        path: &str,
        params: Params,
        options: GetOptions<'_>,
    ) -> RestResult<RestResponse> {
        let route = self.route(path, &params)?;
        tracing::debug!("Fetching content from URL :: {}", route.url);

        if options.authenticated && !self.has_token() {
            return Err(RestError::TokenRequired);
        }

        let mut results = Vec::new();
        let mut page: usize = 1;

        loop {
            let response = self
                .http
                .send(|client| {
                    let mut request = client
                        .get(&route.url)
                        .query(&route.query)
                        .query(&[("per_page", self.per_page), ("page", page)]);
                    if let Some(accept) = options.accept {
                        request = request.header(ACCEPT, accept);
                    }
                    request
                })
                .await?;

            let body = Self::read_body(response, options.expected).await?;

            match body {
                Value::Object(ref map) if map.contains_key("errors") => {
                    let message = map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string();
                    tracing::error!("{}", message);
                    return Err(RestError::ServerError { message });
                }
                Value::Array(items) => {
                    let count = items.len();
                    results.extend(items);
                    // A short page means this was the last one
                    if count < self.per_page {
                        break;
                    }
                    page += 1;
                }
                other => return Ok(RestResponse::Object(other)),
            }
        }

        Ok(RestResponse::List(results))
    }

    /// GET a list endpoint and deserialize every item
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
        options: GetOptions<'_>,
    ) -> RestResult<Vec<T>> {
        let items = self.get_with(path, params, options).await?.into_list()?;
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// GET an object endpoint and deserialize it
    pub async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
        options: GetOptions<'_>,
    ) -> RestResult<T> {
        let value = self.get_with(path, params, options).await?.into_object()?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST a JSON body
    ///
    /// # Errors
    ///
    /// Returns `Authentication` on 401 and `PostFailed` on any other status
    /// than `expected`
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        data: &B,
        expected: StatusCode,
    ) -> RestResult<Value> {
        let route = self.route(path, &Params::new())?;
        tracing::debug!("Posting content to URL :: {}", route.url);

        let response = self
            .http
            .send(|client| client.post(&route.url).json(data))
            .await?;

        let status = response.status();
        if status != expected {
            tracing::error!("Error code from server :: {}", status.as_u16());
            if status == StatusCode::UNAUTHORIZED {
                return Err(RestError::Authentication);
            }
            return Err(RestError::PostFailed {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// The authenticated user (`GET /user`); needs no repository
    pub async fn current_user(&self) -> RestResult<Value> {
        if !self.has_token() {
            return Err(RestError::TokenRequired);
        }

        let url = format!("{}/user", self.github.api_rest());
        let response = self.http.send(|client| client.get(&url)).await?;
        Self::read_body(response, StatusCode::OK).await
    }

    /// Checks the status and decodes the JSON body
    async fn read_body(response: Response, expected: StatusCode) -> RestResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status != expected {
            tracing::error!("Error code from server :: {}", status.as_u16());
            tracing::error!("Content :: {}", text);
            if status == StatusCode::UNAUTHORIZED {
                return Err(RestError::Authentication);
            }
            return Err(RestError::UnexpectedStatus {
                status: status.as_u16(),
                expected: expected.as_u16(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

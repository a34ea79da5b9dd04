//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the reqwest
//! clients used for the REST and GraphQL APIs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{RestError, RestResult};

/// Configuration for the GitHub HTTP clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Calls allowed per `rate_limit_period`
    pub rate_limit_calls: u32,
    /// Window the call quota applies to
    pub rate_limit_period: Duration,
    /// Retries for throttled or failed requests
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Page size for list endpoints
    pub per_page: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_calls: limits::REST_MAX_CALLS,
            rate_limit_period: limits::REST_PERIOD,
            max_retries: limits::MAX_RETRIES,
            retry_base_delay: Duration::from_millis(limits::RETRY_BASE_DELAY_MS),
            per_page: limits::PER_PAGE,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP client that sends `headers` with every request
    pub fn build_http_client(&self, headers: HeaderMap) -> RestResult<Client> {
        self.build_http_client_with_timeout(headers, self.request_timeout)
    }

    /// Same as [`build_http_client`](Self::build_http_client) with an explicit request timeout
    pub fn build_http_client_with_timeout(
        &self,
        headers: HeaderMap,
        timeout: Duration,
    ) -> RestResult<Client> {
        let mut client_builder = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(RestError::Http)
    }
}

/// Headers shared by every API call: `Accept` and the token
///
/// The authorization value is flagged sensitive so it never shows up in
/// debug output.
pub fn api_headers(token: Option<&str>, accept: &'static str) -> RestResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| RestError::InvalidHeader { name: "Authorization" })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// REST headers: [`api_headers`] plus the pinned API version
pub fn rest_headers(token: Option<&str>) -> RestResult<HeaderMap> {
    let mut headers = api_headers(token, http::ACCEPT_REST)?;
    headers.insert(
        HeaderName::from_static(http::API_VERSION_HEADER),
        HeaderValue::from_static(http::API_VERSION),
    );
    Ok(headers)
}

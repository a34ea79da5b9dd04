//! Core HTTP operations with rate limiting and retry logic
//!
//! Every request waits for the shared call quota, then retries on 429, 503
//! and transport errors with exponential backoff. Requests that are not
//! idempotent (POST, PATCH) only retry transport errors raised before the
//! connection was made, since the server may already have acted on them.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::app::client::config::ClientConfig;
use crate::errors::{RestError, RestResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and the quota from `config`
    ///
    /// # Errors
    ///
    /// Returns `RestError::InvalidRateLimit` if the quota is zero
    pub fn new(client: Client, config: &ClientConfig) -> RestResult<Self> {
        let rate_limiter =
            Self::build_rate_limiter(config.rate_limit_calls, config.rate_limit_period)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Builds a limiter allowing `calls` per `period`, all of them available as a burst
    fn build_rate_limiter(calls: u32, period: Duration) -> RestResult<DirectRateLimiter> {
        let burst = NonZeroU32::new(calls).ok_or_else(|| RestError::InvalidRateLimit {
            reason: "calls per period must be non-zero".to_string(),
        })?;
        let quota = Quota::with_period(period / calls)
            .ok_or_else(|| RestError::InvalidRateLimit {
                reason: "period must be non-zero".to_string(),
            })?
            .allow_burst(burst);
        Ok(RateLimiter::direct(quota))
    }

    /// Sends a request with rate limiting and retry logic
    ///
    /// `build` is called once per attempt since a sent `RequestBuilder` is consumed.
    ///
    /// # Errors
    ///
    /// Returns `RestError` if the request keeps failing or the server keeps
    /// throttling after all retries
    pub async fn send<F>(&self, build: F) -> RestResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        // Jitter avoids every waiting task waking at the same instant
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let mut retries = 0;
        loop {
            let request = build(&self.client).build()?;
            let idempotent = request.method().is_idempotent();

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    let throttled = status == StatusCode::TOO_MANY_REQUESTS;
                    let overloaded = status == StatusCode::SERVICE_UNAVAILABLE;

                    if throttled || overloaded {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = retry_after(&response)
                                .unwrap_or_else(|| self.backoff_delay(retries));
                            tracing::warn!(
                                "Server responded {} for {}. Backing off for {}ms",
                                status.as_u16(),
                                response.url(),
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if throttled {
                            RestError::RateLimitExceeded
                        } else {
                            RestError::ServerOverloaded
                        });
                    }

                    tracing::debug!("Response {} from {}", status.as_u16(), response.url());
                    return Ok(response);
                }
                Err(e) if e.is_builder() => return Err(RestError::Http(e)),
                Err(e) if !idempotent && !e.is_connect() => {
                    tracing::error!("Request failed and is not safe to repeat: {}", e);
                    return Err(RestError::Http(e));
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = self.backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Request failed after {} retries: {}", self.max_retries, e);
                    return Err(RestError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * 2_u32.saturating_pow(attempt)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// `Retry-After` in seconds, when the server sent one
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

//! Rate-limit detection and bounded exponential backoff.
//!
//! Every call to GitHub goes through [`RetryingClient::execute`]. Two
//! budgets are kept per call: one for rate-limit responses and a smaller one
//! for transient failures (connection errors and 5xx responses). When a
//! budget runs out the call fails; nothing retries beyond it.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Bounds on how often and how long a call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed while GitHub reports a rate limit.
    pub max_rate_limit_retries: u32,
    /// Retries allowed after connection errors or 5xx responses.
    pub max_network_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub base_delay: Duration,
    /// Upper bound for any single sleep, including server-provided waits.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 5,
            max_network_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15 * 60),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay for the `retry`-th retry (0-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Something that can wait. Tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// How a response should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    /// Wait and retry; `hint` is the server's requested wait, if any.
    RateLimited { hint: Option<Duration> },
    /// Server-side failure worth another attempt.
    Transient,
    /// Fail without retrying.
    Failed,
}

/// Classify a REST or GraphQL response by status and rate-limit headers.
///
/// `now` is the current Unix time in seconds, used to turn
/// `x-ratelimit-reset` into a wait.
#[must_use]
pub fn classify_response(response: &ApiResponse, now: i64) -> Verdict {
    match response.status {
        200..=299 => Verdict::Success,
        429 => Verdict::RateLimited {
            hint: rate_limit_hint(response, now),
        },
        403 if is_rate_limit_403(response) => Verdict::RateLimited {
            hint: rate_limit_hint(response, now),
        },
        500..=599 => Verdict::Transient,
        _ => Verdict::Failed,
    }
}

fn is_rate_limit_403(response: &ApiResponse) -> bool {
    response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some()
        || response.body.to_ascii_lowercase().contains("rate limit")
}

/// Server-requested wait: `retry-after`, else time until `x-ratelimit-reset`.
#[must_use]
pub fn rate_limit_hint(response: &ApiResponse, now: i64) -> Option<Duration> {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Some(Duration::from_secs(secs));
    }
    if response.header("x-ratelimit-remaining") == Some("0") {
        let reset = response
            .header("x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<i64>().ok())?;
        let wait = reset.saturating_sub(now).saturating_add(1).max(1);
        return Some(Duration::from_secs(u64::try_from(wait).unwrap_or(1)));
    }
    None
}

#[derive(Deserialize)]
struct GraphqlErrorTypes {
    #[serde(default)]
    errors: Vec<GraphqlErrorType>,
}

#[derive(Deserialize)]
struct GraphqlErrorType {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Like [`classify_response`], but also treats a 200 carrying a
/// `RATE_LIMITED` GraphQL error as a rate limit.
#[must_use]
pub fn classify_graphql_response(response: &ApiResponse, now: i64) -> Verdict {
    let verdict = classify_response(response, now);
    if verdict != Verdict::Success {
        return verdict;
    }
    let rate_limited = serde_json::from_str::<GraphqlErrorTypes>(&response.body)
        .map(|body| {
            body.errors
                .iter()
                .any(|e| e.kind.as_deref() == Some("RATE_LIMITED"))
        })
        .unwrap_or(false);
    if rate_limited {
        Verdict::RateLimited {
            hint: rate_limit_hint(response, now),
        }
    } else {
        Verdict::Success
    }
}

/// Pull GitHub's `message` out of an error body, or fall back to a prefix of
/// the raw text.
#[must_use]
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    trimmed.chars().take(200).collect()
}

/// Sends requests through a [`Transport`], retrying within a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingClient<T, S> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: Transport, S: Sleeper> RetryingClient<T, S> {
    pub fn new(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying rate limits and transient failures.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.execute_with(request, classify_response)
    }

    /// Send `request`, using `classify` to decide what each response means.
    pub fn execute_with<F>(&self, request: &ApiRequest, classify: F) -> Result<ApiResponse>
    where
        F: Fn(&ApiResponse, i64) -> Verdict,
    {
        let mut rate_limit_retries = 0u32;
        let mut transient_retries = 0u32;

        loop {
            debug!("{} {}", request.method.as_str(), request.url);
            match self.transport.send(request) {
                Ok(response) => match classify(&response, Utc::now().timestamp()) {
                    Verdict::Success => return Ok(response),
                    Verdict::RateLimited { hint } => {
                        if rate_limit_retries >= self.policy.max_rate_limit_retries {
                            return Err(ClientError::RateLimited {
                                url: request.url.clone(),
                                attempts: rate_limit_retries + transient_retries + 1,
                            });
                        }
                        let delay = hint
                            .unwrap_or_else(|| self.policy.backoff(rate_limit_retries))
                            .min(self.policy.max_delay);
                        warn!(
                            status = response.status,
                            retry = rate_limit_retries + 1,
                            "Rate limit exceeded. Waiting for {} seconds...",
                            delay.as_secs()
                        );
                        self.sleeper.sleep(delay);
                        rate_limit_retries += 1;
                    }
                    Verdict::Transient => {
                        if transient_retries >= self.policy.max_network_retries {
                            return Err(ClientError::Api {
                                status: response.status,
                                url: request.url.clone(),
                                message: error_message(&response.body),
                            });
                        }
                        let delay = self.policy.backoff(transient_retries);
                        warn!(
                            status = response.status,
                            retry = transient_retries + 1,
                            "Request failed with status {}. Retrying in {} seconds...",
                            response.status,
                            delay.as_secs()
                        );
                        self.sleeper.sleep(delay);
                        transient_retries += 1;
                    }
                    Verdict::Failed => {
                        return Err(ClientError::Api {
                            status: response.status,
                            url: request.url.clone(),
                            message: error_message(&response.body),
                        });
                    }
                },
                Err(error) => {
                    if transient_retries >= self.policy.max_network_retries {
                        return Err(ClientError::Network {
                            url: request.url.clone(),
                            attempts: rate_limit_retries + transient_retries + 1,
                            message: error.0,
                        });
                    }
                    let delay = self.policy.backoff(transient_retries);
                    warn!(
                        retry = transient_retries + 1,
                        "Request error: {}. Retrying in {} seconds...",
                        error,
                        delay.as_secs()
                    );
                    self.sleeper.sleep(delay);
                    transient_retries += 1;
                }
            }
        }
    }
}

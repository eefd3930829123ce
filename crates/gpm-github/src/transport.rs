//! Raw HTTP exchange with GitHub.
//!
//! [`Transport`] is the seam between the retry layer and the network: the
//! production implementation wraps a blocking `reqwest` client, tests plug
//! in scripted responses.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ClientError, Result};

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("gpm/", env!("CARGO_PKG_VERSION"));

/// HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

/// A request ready to be sent; retried requests are sent unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn patch(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// Status, headers and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait Transport {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking `reqwest` transport authenticated with a personal access token.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::Setup("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().map_err(|e| TransportError(e.to_string()))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = ApiResponse::new(200, "[]").with_header("X-RateLimit-Remaining", "0");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
        assert_eq!(response.header("X-RATELIMIT-REMAINING"), Some("0"));
        assert_eq!(response.header("link"), None);
    }

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(201, "").is_success());
        assert!(!ApiResponse::new(304, "").is_success());
    }

    #[test]
    fn test_client_creation() {
        assert!(ReqwestTransport::new("ghp_example", DEFAULT_REQUEST_TIMEOUT).is_ok());
    }

    #[test]
    fn rejects_token_with_newline() {
        let err = ReqwestTransport::new("ghp\nexample", DEFAULT_REQUEST_TIMEOUT).unwrap_err();
        assert!(matches!(err, ClientError::Setup(_)));
    }
}

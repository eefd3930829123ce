//! GitHub API client: REST page-number pagination and GraphQL cursors on
//! top of the retry layer.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::retry::{RetryPolicy, RetryingClient, Sleeper, ThreadSleeper, classify_graphql_response};
use crate::transport::{
    ApiRequest, ApiResponse, DEFAULT_REQUEST_TIMEOUT, ReqwestTransport, Transport,
};

/// GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub GraphQL endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Page size for REST list endpoints (GitHub's maximum).
pub const REST_PAGE_SIZE: usize = 100;

/// Everything needed to build a production client.
#[derive(Clone)]
pub struct ClientSettings {
    pub token: String,
    pub api_url: String,
    pub graphql_url: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientSettings {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Client for the GitHub REST and GraphQL APIs.
#[derive(Debug, Clone)]
pub struct GithubClient<T = ReqwestTransport, S = ThreadSleeper> {
    http: RetryingClient<T, S>,
    api_url: String,
    graphql_url: String,
}

impl GithubClient {
    /// Creates a client that talks to GitHub over HTTPS.
    pub fn connect(settings: &ClientSettings) -> Result<Self> {
        let transport = ReqwestTransport::new(&settings.token, settings.timeout)?;
        Ok(Self::with_transport(
            transport,
            ThreadSleeper,
            settings.retry,
            &settings.api_url,
            &settings.graphql_url,
        ))
    }
}

impl<T: Transport, S: Sleeper> GithubClient<T, S> {
    pub fn with_transport(
        transport: T,
        sleeper: S,
        retry: RetryPolicy,
        api_url: &str,
        graphql_url: &str,
    ) -> Self {
        Self {
            http: RetryingClient::new(transport, sleeper, retry),
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
        }
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// Absolute URL for a REST path such as `/orgs/acme/projects`.
    #[must_use]
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Fetch every page of a REST list endpoint.
    ///
    /// Pages are requested by number (`per_page=100&page=N`). Paging stops
    /// when the `Link` header no longer offers `rel="next"`, or, without a
    /// `Link` header, when a page comes back short.
    pub fn get_all<R: DeserializeOwned>(&self, path: &str) -> Result<Vec<R>> {
        let base = self.rest_url(path);
        let separator = if base.contains('?') { '&' } else { '?' };
        let mut results = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!("{base}{separator}per_page={REST_PAGE_SIZE}&page={page}");
            let response = self.http.execute(&ApiRequest::get(&url))?;
            let batch: Vec<R> = decode(&url, &response)?;
            let count = batch.len();
            results.extend(batch);

            let more = match response.header("link") {
                Some(link) => has_next_link(link),
                None => count == REST_PAGE_SIZE,
            };
            if !more || count == 0 {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} records from {} in {} page(s)", results.len(), base, page);
        Ok(results)
    }

    pub fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.rest_url(path);
        let response = self.http.execute(&ApiRequest::get(&url))?;
        decode(&url, &response)
    }

    pub fn post<R: DeserializeOwned>(&self, path: &str, body: Value) -> Result<R> {
        let url = self.rest_url(path);
        let response = self.http.execute(&ApiRequest::post(&url, body))?;
        decode(&url, &response)
    }

    pub fn patch<R: DeserializeOwned>(&self, path: &str, body: Value) -> Result<R> {
        let url = self.rest_url(path);
        let response = self.http.execute(&ApiRequest::patch(&url, body))?;
        decode(&url, &response)
    }

    /// Run a GraphQL query or mutation and decode its `data`.
    pub fn graphql<R: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<R> {
        let request = ApiRequest::post(
            &self.graphql_url,
            json!({ "query": query, "variables": variables }),
        );
        let response = self.http.execute_with(&request, classify_graphql_response)?;
        let envelope: GraphqlEnvelope<R> = decode(&self.graphql_url, &response)?;

        if !envelope.errors.is_empty() {
            return Err(ClientError::GraphQl {
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        envelope.data.ok_or_else(|| ClientError::Decode {
            url: self.graphql_url.clone(),
            reason: "response has neither data nor errors".to_string(),
        })
    }

    /// Follow a GraphQL connection through every page.
    ///
    /// `variables` must not contain `cursor`; it is set on each request.
    /// `select` picks the connection out of the decoded `data`.
    pub fn graphql_pages<R, N, F>(
        &self,
        query: &str,
        variables: Map<String, Value>,
        select: F,
    ) -> Result<Vec<N>>
    where
        R: DeserializeOwned,
        F: Fn(R) -> Option<Connection<N>>,
    {
        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut vars = variables.clone();
            vars.insert(
                "cursor".to_string(),
                cursor.clone().map_or(Value::Null, Value::String),
            );
            let data: R = self.graphql(query, Value::Object(vars))?;
            let connection = select(data).ok_or_else(|| ClientError::Decode {
                url: self.graphql_url.clone(),
                reason: "connection missing from response".to_string(),
            })?;
            nodes.extend(connection.nodes.into_iter().flatten());

            let next = connection.page_info.end_cursor;
            if !connection.page_info.has_next_page || next.is_none() || next == cursor {
                break;
            }
            cursor = next;
        }

        Ok(nodes)
    }
}

#[derive(Deserialize)]
struct GraphqlEnvelope<R> {
    data: Option<R>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// A GraphQL connection (`nodes` plus `pageInfo`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<N>>,
    #[serde(default)]
    pub page_info: PageInfo,
}

impl<N> Default for Connection<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            page_info: PageInfo::default(),
        }
    }
}

impl<N> Connection<N> {
    /// Non-null nodes of this page.
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes.into_iter().flatten().collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// True when an RFC 8288 `Link` header contains `rel="next"`.
#[must_use]
pub fn has_next_link(link: &str) -> bool {
    link.split(',').any(|part| {
        part.split(';')
            .skip(1)
            .any(|param| matches!(param.trim(), "rel=\"next\"" | "rel=next"))
    })
}

fn decode<R: DeserializeOwned>(url: &str, response: &ApiResponse) -> Result<R> {
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_detection() {
        let link = r#"<https://api.github.com/orgs/acme/projects?page=2>; rel="next", <https://api.github.com/orgs/acme/projects?page=5>; rel="last""#;
        assert!(has_next_link(link));

        let last = r#"<https://api.github.com/orgs/acme/projects?page=1>; rel="prev", <https://api.github.com/orgs/acme/projects?page=1>; rel="first""#;
        assert!(!has_next_link(last));
    }

    #[test]
    fn settings_debug_hides_token() {
        let settings = ClientSettings::new("ghp_secret");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn empty_body_decodes_as_null() {
        let value: Value = decode("u", &ApiResponse::new(204, "")).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn connection_skips_null_nodes() {
        let connection: Connection<u32> =
            serde_json::from_str(r#"{"nodes": [1, null, 3], "pageInfo": {"hasNextPage": false}}"#)
                .unwrap();
        assert_eq!(connection.into_nodes(), vec![1, 3]);
    }
}

//! GitHub API access for project migration.
//!
//! All calls are blocking and sequential. Each one goes through
//! [`RetryingClient`], which retries rate limits and transient failures
//! within a [`RetryPolicy`] and then gives up with a typed [`ClientError`].
//!
//! # Architecture
//!
//! - `transport` - the HTTP seam ([`Transport`]) and its `reqwest` implementation
//! - `retry` - rate-limit detection, backoff, bounded retries
//! - `client` - REST page-number pagination and GraphQL cursor pagination
//! - `classic`, `v2`, `issues` - typed endpoints

pub mod classic;
pub mod client;
pub mod error;
pub mod issues;
pub mod retry;
pub mod transport;
pub mod v2;

pub use classic::{RestCard, RestColumn, RestProject};
pub use client::{
    ClientSettings, Connection, DEFAULT_API_URL, DEFAULT_GRAPHQL_URL, GithubClient, PageInfo,
    REST_PAGE_SIZE, has_next_link,
};
pub use error::{ClientError, Result};
pub use issues::IssueNode;
pub use retry::{RetryPolicy, RetryingClient, Sleeper, ThreadSleeper, Verdict};
pub use transport::{
    ApiRequest, ApiResponse, DEFAULT_REQUEST_TIMEOUT, Method, ReqwestTransport, Transport,
    TransportError,
};
pub use v2::{
    ContentNode, CreatedProject, FieldInput, FieldNode, FieldValueNode, ItemNode, NewOption,
    OptionNode, ProjectNode, ProjectUpdate,
};

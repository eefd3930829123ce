//! Error types for GitHub API calls.

use thiserror::Error;

/// Errors that can occur while talking to GitHub.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Non-success response that retrying cannot fix, or a server error
    /// that outlived the retry budget.
    #[error("GitHub API error ({status}) for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// Still rate limited after the configured number of retries.
    #[error("GitHub API rate limit still exceeded for {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    /// Connection, TLS or timeout failure that outlived the retry budget.
    #[error("network error calling {url} after {attempts} attempts: {message}")]
    Network {
        url: String,
        attempts: u32,
        message: String,
    },

    /// GraphQL returned errors alongside (or instead of) data.
    #[error("GraphQL query failed: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Setup(String),
}

impl ClientError {
    /// Returns a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Api { status: 401, .. } => "GitHub rejected the token. Check that it is valid.",
            Self::Api { status: 403 | 404, .. } => {
                "GitHub denied access. Check the organization name and the token's scopes."
            }
            Self::Api { .. } | Self::GraphQl { .. } => "GitHub rejected the request.",
            Self::RateLimited { .. } => "GitHub API rate limit reached. Please try again later.",
            Self::Network { .. } => {
                "Could not connect to GitHub. Please check your internet connection."
            }
            Self::Decode { .. } => "GitHub returned a response this tool does not understand.",
            Self::Setup(_) => "An unexpected error occurred.",
        }
    }

    /// Returns whether a later run could succeed without changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

/// Result type alias for GitHub API operations.
pub type Result<T> = std::result::Result<T, ClientError>;

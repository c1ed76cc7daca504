//! Webmention error types
//!
//! Inbound processing is strict and reports a `WebmentionError` to the
//! sender. Outbound sending reports a `SendError`, which the best-effort
//! trigger only logs.

use site_common::{ApiError, IntoApiError};
use thiserror::Error;

/// URL resolution failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed URL: {0}")]
    Malformed(String),
}

/// Transport-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Inbound webmention failure
#[derive(Debug, Error)]
pub enum WebmentionError {
    /// The request itself is malformed; nothing was fetched
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    SourceUnreachable(String),

    /// The source was fetched but lacks the markup needed to store it
    #[error("{0}")]
    InvalidSource(String),

    #[error("{0}")]
    TargetNotFound(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl IntoApiError for WebmentionError {
    fn into_api_error(self) -> ApiError {
        match self {
            WebmentionError::Storage(e) => {
                tracing::error!("Webmention storage failure: {:#}", e);
                ApiError::server_error("Could not store webmention")
            }
            other => ApiError::invalid_request(other.to_string()),
        }
    }
}

/// Outbound webmention failure
#[derive(Debug, Error)]
pub enum SendError {
    #[error("could not fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid webmention endpoint: {0}")]
    InvalidEndpoint(#[from] ResolveError),

    #[error("endpoint {endpoint} rejected webmention with status {status}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("post `{0}` does not exist")]
    PostNotFound(String),

    #[error("post `{0}` does not link to anything")]
    NothingToSend(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

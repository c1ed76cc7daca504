//! HTTP error envelope
//!
//! Every failed request is answered with the same JSON shape:
//! `{"error": "<short code>", "error_description": "<human readable>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Response statuses the site emits, with their OAuth-style short codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    InvalidRequest,
    NotFound,
    ServerError,
}

impl HttpStatus {
    /// Numeric status code
    pub fn code(self) -> u16 {
        match self {
            HttpStatus::InvalidRequest => 400,
            HttpStatus::NotFound => 404,
            HttpStatus::ServerError => 500,
        }
    }

    /// Short code used in the `error` field
    pub fn description(self) -> &'static str {
        match self {
            HttpStatus::InvalidRequest => "invalid_request",
            HttpStatus::NotFound => "not_found",
            HttpStatus::ServerError => "server_error",
        }
    }

    pub fn status_code(self) -> StatusCode {
        StatusCode::from_u16(self.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Serialized error body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub error_description: String,
}

/// An error ready to be sent back over HTTP
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: HttpStatus,
    pub description: String,
}

/// Type alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: HttpStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    /// A 400 `invalid_request` error
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(HttpStatus::InvalidRequest, description)
    }

    /// A 500 `server_error` error
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(HttpStatus::ServerError, description)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.status.description().to_string(),
            error_description: self.description.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status.description(), self.status.code(), self.description)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status.status_code(), Json(self.body())).into_response()
    }
}

/// Trait for converting errors into the HTTP error envelope
///
/// Implement this for domain error types so handlers can use `?` after
/// calling `.to_api_err()`.
///
/// # Example
///
/// ```rust,ignore
/// use site_common::{ApiError, IntoApiError};
///
/// impl IntoApiError for MyError {
///     fn into_api_error(self) -> ApiError {
///         ApiError::invalid_request(self.to_string())
///     }
/// }
/// ```
pub trait IntoApiError {
    /// Convert this error into an API error
    fn into_api_error(self) -> ApiError;
}

impl IntoApiError for ApiError {
    fn into_api_error(self) -> ApiError {
        self
    }
}

impl IntoApiError for anyhow::Error {
    fn into_api_error(self) -> ApiError {
        ApiError::server_error(self.to_string())
    }
}

/// Extension trait for Result types to convert to API errors
pub trait ResultExt<T> {
    /// Convert the error to an API error
    fn to_api_err(self) -> Result<T, ApiError>;
}

impl<T, E: IntoApiError> ResultExt<T> for Result<T, E> {
    fn to_api_err(self) -> Result<T, ApiError> {
        self.map_err(|e| e.into_api_error())
    }
}

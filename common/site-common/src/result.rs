//! Result helpers for successful HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// `200 OK` with an empty body
///
/// Webmention receivers answer accepted notifications this way.
pub fn empty_ok() -> Response {
    StatusCode::OK.into_response()
}

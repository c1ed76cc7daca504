//! Site Common - Shared utilities for the Microlight site
//!
//! This crate provides functionality shared by the site binary and its
//! integration tests:
//!
//! - **Initialization**: [`init_tracing`] for standardized logging setup
//! - **Errors**: [`ApiError`] and the [`IntoApiError`] trait for the
//!   `{error, error_description}` JSON envelope
//! - **Results**: the empty `200 OK` a webmention receiver answers with
//!
//! # Example
//!
//! ```rust,ignore
//! use site_common::{empty_ok, ApiError};
//!
//! async fn handler() -> Result<axum::response::Response, ApiError> {
//!     if bad_condition {
//!         return Err(ApiError::invalid_request("Target URL was not provided"));
//!     }
//!     Ok(empty_ok())
//! }
//! ```

pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use error::{ApiError, ApiResult, ErrorBody, HttpStatus, IntoApiError, ResultExt};
pub use init::init_tracing;
pub use result::empty_ok;

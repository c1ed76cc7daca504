//! `POST /webmention` receiver endpoint

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    response::Response,
    Form, Json,
};
use site_common::{empty_ok, ApiError, ApiResult, ResultExt};

use super::state::AppState;
use crate::webmention::{InboundRequest, WebmentionError};

/// Webmention body, accepted form-encoded or as JSON
pub struct InboundBody(pub InboundRequest);

#[async_trait]
impl<S> FromRequest<S> for InboundBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<InboundRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::invalid_request(e.body_text()))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<InboundRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::invalid_request(e.body_text()))?;
            Ok(Self(body))
        }
    }
}

/// Receive a webmention
pub async fn receive_webmention(
    State(state): State<AppState>,
    InboundBody(request): InboundBody,
) -> ApiResult<Response> {
    state
        .receiver
        .receive(&request)
        .await
        .inspect_err(|e| {
            if !matches!(e, WebmentionError::Storage(_)) {
                tracing::info!(
                    source_url = %request.source,
                    target_url = %request.target,
                    "Webmention rejected: {}",
                    e
                );
            }
        })
        .to_api_err()?;

    Ok(empty_ok())
}

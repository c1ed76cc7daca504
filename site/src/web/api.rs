//! REST API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use site_common::{ApiError, ApiResult, HttpStatus, ResultExt};

use super::state::AppState;
use crate::db::{InteractionWithAuthor, PostStatus};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.count_people() {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Health check database query failed: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct InteractionsParams {
    pub post_slug: Option<String>,
}

/// Interactions for one post
#[derive(Debug, Serialize, Deserialize)]
pub struct InteractionsListResponse {
    pub post_slug: String,
    pub interactions: Vec<InteractionWithAuthor>,
    pub total: usize,
}

/// List the stored interactions of a post with their authors
pub async fn list_interactions(
    State(state): State<AppState>,
    Query(params): Query<InteractionsParams>,
) -> ApiResult<Json<InteractionsListResponse>> {
    let slug = params
        .post_slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request("post_slug was not provided"))?;

    let post = state
        .db
        .get_post_by_slug(&slug)
        .to_api_err()?
        .filter(|post| post.status != PostStatus::Deleted)
        .ok_or_else(|| ApiError::new(HttpStatus::NotFound, "Post does not exist"))?;

    let interactions = state
        .db
        .list_interactions_for_post(post.id)
        .inspect_err(|e| tracing::error!("Failed to list interactions for {}: {}", slug, e))
        .to_api_err()?;

    Ok(Json(InteractionsListResponse {
        post_slug: slug,
        total: interactions.len(),
        interactions,
    }))
}

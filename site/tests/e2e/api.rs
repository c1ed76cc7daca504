//! E2E test: read-only JSON API

use axum::{response::Html, routing::get, Router};

use crate::support::{reply_html, spawn, TestSite, TARGET};
use microlight_site::web::api::{HealthResponse, InteractionsListResponse};
use site_common::ErrorBody;

#[tokio::test]
async fn test_health() {
    let site = TestSite::start().await;
    let health: HealthResponse = reqwest::get(format!("{}/api/health", site.url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.database);
}

#[tokio::test]
async fn test_interactions_for_post() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);

    let body = reply_html(TARGET);
    let router = Router::new().route("/replies/1", get(move || async move { Html(body) }));
    let source = format!("{}/replies/1", spawn(router).await);
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);

    let list: InteractionsListResponse =
        reqwest::get(format!("{}/api/interactions?post_slug=abc", site.url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

    assert_eq!(list.total, 1);
    assert_eq!(list.interactions[0].interaction.url, source);
    assert_eq!(list.interactions[0].author.name, "Alice");
}

#[tokio::test]
async fn test_interactions_for_missing_post() {
    let site = TestSite::start().await;

    let response = reqwest::get(format!("{}/api/interactions?post_slug=nope", site.url))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "not_found");

    let response = reqwest::get(format!("{}/api/interactions", site.url)).await.unwrap();
    assert_eq!(response.status(), 400);
}

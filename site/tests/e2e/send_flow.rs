//! E2E test: outbound webmentions reach the endpoint a target advertises

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::support::{spawn, TestSite};
use microlight_site::db::PostStatus;
use microlight_site::webmention::{SendError, SendOutcome};

type Received = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn header_target() -> impl IntoResponse {
    (
        [(header::LINK, r#"</endpoint>; rel="webmention""#)],
        Html("<p>advertised in the header</p>"),
    )
}

async fn markup_target() -> Html<&'static str> {
    Html(r#"<html><head><link rel="sneaky webmention" href="endpoint"></head><body>hi</body></html>"#)
}

async fn quiet_target() -> Html<&'static str> {
    Html("<p>no endpoint here</p>")
}

async fn endpoint(
    State(received): State<Received>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    received.lock().unwrap().push(form);
    StatusCode::ACCEPTED
}

async fn refusing_endpoint() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// Remote site with several target pages; returns (origin, received forms)
async fn spawn_remote() -> (String, Received) {
    let received: Received = Arc::default();
    let router = Router::new()
        .route("/header/post", get(header_target))
        .route("/markup/post", get(markup_target))
        .route("/quiet/post", get(quiet_target))
        .route("/endpoint", post(endpoint))
        .route("/markup/endpoint", post(endpoint))
        .with_state(received.clone());
    (spawn(router).await, received)
}

#[tokio::test]
async fn test_link_header_endpoint_receives_form() {
    let site = TestSite::start().await;
    let (remote, received) = spawn_remote().await;
    let target = format!("{}/header/post", remote);
    site.add_post("abc", "reply", Some(&target));

    let outcome = site.sender().send_for_post("abc").await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Sent {
            endpoint: format!("{}/endpoint", remote),
            status: 202
        }
    );

    let forms = received.lock().unwrap().clone();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["source"], "https://blog.example/?post_slug=abc");
    assert_eq!(forms[0]["target"], target);
}

#[tokio::test]
async fn test_relative_markup_endpoint() {
    let site = TestSite::start().await;
    let (remote, received) = spawn_remote().await;
    let target = format!("{}/markup/post", remote);

    let endpoint = site.sender().discover_endpoint(&target).await.unwrap();
    assert_eq!(
        endpoint.map(|u| u.to_string()),
        Some(format!("{}/markup/endpoint", remote))
    );

    site.sender()
        .send(&target, "https://blog.example/?post_slug=abc")
        .await
        .unwrap();
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_endpoint_is_not_an_error() {
    let site = TestSite::start().await;
    let (remote, received) = spawn_remote().await;

    let outcome = site
        .sender()
        .send(&format!("{}/quiet/post", remote), "https://blog.example/?post_slug=abc")
        .await
        .unwrap();
    assert_eq!(outcome, SendOutcome::NoEndpoint);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_send_is_swallowed_by_trigger() {
    let site = TestSite::start().await;
    let router = Router::new()
        .route("/refusing/post", get(header_target))
        .route("/endpoint", post(refusing_endpoint));
    let remote = spawn(router).await;
    let target = format!("{}/refusing/post", remote);
    site.add_post("abc", "like", Some(&target));

    let err = site.sender().send_for_post("abc").await.unwrap_err();
    assert!(matches!(err, SendError::Rejected { status: 400, .. }));

    // The trigger only logs
    site.sender().notify_best_effort("abc").await;
}

#[tokio::test]
async fn test_deleted_post_still_notifies_target() {
    let site = TestSite::start().await;
    let (remote, received) = spawn_remote().await;
    let target = format!("{}/header/post", remote);
    site.add_post("abc", "repost", Some(&target));

    assert!(site.db.set_post_status("abc", PostStatus::Deleted).unwrap());
    site.sender().notify_best_effort("abc").await;

    let forms = received.lock().unwrap().clone();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["target"], target);
}

#[tokio::test]
async fn test_unknown_post() {
    let site = TestSite::start().await;
    let err = site.sender().send_for_post("missing").await.unwrap_err();
    assert!(matches!(err, SendError::PostNotFound(_)));
}

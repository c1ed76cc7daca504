//! E2E test: the timeout and the streamed size cap on outbound fetches

use axum::{body::Body, http::StatusCode, response::Html, routing::get, Router};
use futures_util::stream;
use std::convert::Infallible;
use std::time::Duration;

use crate::support::{reply_html, spawn, TestSite, TARGET};
use microlight_site::webmention::{FetchError, FetchRequest, Fetcher, ReqwestFetcher, SendError};
use site_common::ErrorBody;

const CAP: usize = 4096;

/// `chunks` chunks of 1 KiB, sent chunked with no Content-Length
fn streamed(status: StatusCode, chunks: usize) -> (StatusCode, Body) {
    let parts = (0..chunks).map(|_| Ok::<_, Infallible>(vec![b'x'; 1024]));
    (status, Body::from_stream(stream::iter(parts)))
}

async fn spawn_remote() -> String {
    let router = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Html(reply_html(TARGET))
            }),
        )
        .route("/small", get(|| async { streamed(StatusCode::OK, 2) }))
        .route("/huge", get(|| async { streamed(StatusCode::OK, 8) }))
        .route("/huge-gone", get(|| async { streamed(StatusCode::GONE, 8) }));
    spawn(router).await
}

async fn start_site() -> TestSite {
    TestSite::start_with(|config| {
        config.webmention.timeout_seconds = 1;
        config.webmention.max_response_size = CAP;
    })
    .await
}

#[tokio::test]
async fn test_slow_source_is_unreachable() {
    let site = start_site().await;
    site.add_post("abc", "article", None);
    let remote = spawn_remote().await;

    let response = site.notify(&format!("{}/slow", remote), TARGET).await;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error_description, "Source URL could not be fetched");
}

#[tokio::test]
async fn test_slow_target_times_out_on_send() {
    let site = start_site().await;
    let remote = spawn_remote().await;

    let err = site
        .sender()
        .discover_endpoint(&format!("{}/slow", remote))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SendError::Fetch {
            source: FetchError::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_streamed_body_over_cap_is_too_large() {
    let site = start_site().await;
    site.add_post("abc", "article", None);
    let remote = spawn_remote().await;
    let fetcher = ReqwestFetcher::new(&site.config.webmention).unwrap();

    let small = fetcher
        .fetch(FetchRequest::get(format!("{}/small", remote)))
        .await
        .unwrap();
    assert_eq!(small.body.len(), 2048);

    let err = fetcher
        .fetch(FetchRequest::get(format!("{}/huge", remote)))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::TooLarge { limit: CAP, .. }));

    let response = site.notify(&format!("{}/huge", remote), TARGET).await;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error_description, "Source URL could not be fetched");
}

#[tokio::test]
async fn test_oversized_error_body_keeps_status() {
    let site = start_site().await;
    let remote = spawn_remote().await;
    let fetcher = ReqwestFetcher::new(&site.config.webmention).unwrap();

    let gone = fetcher
        .fetch(FetchRequest::get(format!("{}/huge-gone", remote)))
        .await
        .unwrap();
    assert_eq!(gone.status, 410);
    assert_eq!(gone.body.len(), CAP);
}

//! E2E test: inbound webmentions are verified, fetched and stored

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::support::{reply_html, spawn, TestSite, TARGET};
use site_common::ErrorBody;

/// A remote page whose status and body can change between requests
#[derive(Clone)]
struct RemotePage {
    response: Arc<Mutex<(u16, String)>>,
    hits: Arc<AtomicUsize>,
}

impl RemotePage {
    fn new(status: u16, body: String) -> Self {
        Self {
            response: Arc::new(Mutex::new((status, body))),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set(&self, status: u16, body: &str) {
        *self.response.lock().unwrap() = (status, body.to_string());
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_page(State(page): State<RemotePage>) -> (StatusCode, Html<String>) {
    page.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = page.response.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), Html(body))
}

async fn spawn_source(page: RemotePage) -> String {
    let router = Router::new()
        .route("/replies/1", get(serve_page))
        .with_state(page);
    format!("{}/replies/1", spawn(router).await)
}

async fn error_body(response: reqwest::Response) -> ErrorBody {
    response.json().await.expect("Error body is not JSON")
}

#[tokio::test]
async fn test_reply_is_stored_with_author() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(200, reply_html(TARGET));
    let source = spawn_source(page.clone()).await;

    let response = site.notify(&source, TARGET).await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().is_empty());

    let interaction = site.db.find_interaction_by_url(&source).unwrap().unwrap();
    assert_eq!(interaction.contents, "Nice post!");
    assert_eq!(interaction.datetime, "2023-01-01T00:00:00Z");

    let person = site.db.find_person_by_url("https://alice.example").unwrap().unwrap();
    assert_eq!(person.name, "Alice");
    assert_eq!(interaction.person_id, person.id);
    assert_eq!(site.db.count_people().unwrap(), 1);
}

#[tokio::test]
async fn test_renotification_updates_then_gone_source_deletes() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(200, reply_html(TARGET));
    let source = spawn_source(page.clone()).await;

    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    let first = site.db.find_interaction_by_url(&source).unwrap().unwrap();

    page.set(200, &reply_html(TARGET).replace("Nice post!", "Nice post, edited"));
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    let second = site.db.find_interaction_by_url(&source).unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.contents, "Nice post, edited");

    page.set(410, "");
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    assert!(site.db.find_interaction_by_url(&source).unwrap().is_none());

    // Retracting again is still a success
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
}

#[tokio::test]
async fn test_gone_source_with_oversized_body_still_deletes() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(200, reply_html(TARGET));
    let source = spawn_source(page.clone()).await;

    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    assert!(site.db.find_interaction_by_url(&source).unwrap().is_some());

    let limit = site.config.webmention.max_response_size;
    page.set(410, &"x".repeat(2 * limit));
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    assert!(site.db.find_interaction_by_url(&source).unwrap().is_none());
}

#[tokio::test]
async fn test_unlinked_source_deletes_interaction() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(200, reply_html(TARGET));
    let source = spawn_source(page.clone()).await;

    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    page.set(200, "<p>I take it back.</p>");
    assert_eq!(site.notify(&source, TARGET).await.status(), 200);
    assert!(site.db.find_interaction_by_url(&source).unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_target_is_rejected_without_fetching() {
    let site = TestSite::start().await;
    let page = RemotePage::new(200, reply_html(TARGET));
    let source = spawn_source(page.clone()).await;

    let response = site.notify(&source, "https://blog.example/?post_slug=missing").await;
    assert_eq!(response.status(), 400);
    let body = error_body(response).await;
    assert_eq!(body.error, "invalid_request");
    assert_eq!(body.error_description, "Target post does not exist");
    assert_eq!(page.hits(), 0);
}

#[tokio::test]
async fn test_invalid_requests() {
    let site = TestSite::start().await;

    let body = error_body(site.notify("", TARGET).await).await;
    assert_eq!(body.error_description, "Source URL was not provided");

    let body = error_body(site.notify(TARGET, TARGET).await).await;
    assert_eq!(body.error_description, "Source and Target URLs cannot be the same");

    let body = error_body(site.notify("mailto:alice@alice.example", TARGET).await).await;
    assert_eq!(body.error_description, "Source URL is not a valid URL");
}

#[tokio::test]
async fn test_source_without_author_is_invalid() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(200, reply_html(TARGET).replace("p-author h-card", "byline"));
    let source = spawn_source(page).await;

    let response = site.notify(&source, TARGET).await;
    assert_eq!(response.status(), 400);
    let body = error_body(response).await;
    assert_eq!(
        body.error_description,
        "Source URL does not contain an author card within the post"
    );
}

#[tokio::test]
async fn test_failing_source_is_unreachable() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let page = RemotePage::new(500, String::new());
    let source = spawn_source(page).await;

    let response = site.notify(&source, TARGET).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        error_body(response).await.error_description,
        "Source URL returned non-success status code"
    );
}

#[tokio::test]
async fn test_json_body_is_accepted() {
    let site = TestSite::start().await;
    site.add_post("abc", "article", None);
    let source = spawn_source(RemotePage::new(200, reply_html(TARGET))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/webmention", site.url))
        .json(&serde_json::json!({ "source": source, "target": TARGET }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(site.db.find_interaction_by_url(&source).unwrap().is_some());
}

#[tokio::test]
async fn test_non_post_is_method_not_allowed() {
    let site = TestSite::start().await;
    let response = reqwest::get(format!("{}/webmention", site.url)).await.unwrap();
    assert_eq!(response.status(), 405);
}

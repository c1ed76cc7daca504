//! Shared fixtures for the E2E tests

use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

use microlight_site::config::SiteFileConfig;
use microlight_site::db::{CreatePost, Database, PostStatus};
use microlight_site::web::{self, AppState};
use microlight_site::webmention::{ReqwestFetcher, Sender};

pub const SITE_BASE: &str = "https://blog.example/";
pub const TARGET: &str = "https://blog.example/?post_slug=abc";

/// Serve `router` on an ephemeral loopback port, returning its origin
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock server failed");
    });
    format!("http://{}", addr)
}

/// A running site backed by a throwaway database
pub struct TestSite {
    pub url: String,
    pub db: Database,
    pub config: SiteFileConfig,
    _dir: TempDir,
}

impl TestSite {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with config tweaks applied on top of the test defaults
    pub async fn start_with(configure: impl FnOnce(&mut SiteFileConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = SiteFileConfig::default();
        config.site.base_url = SITE_BASE.to_string();
        config.database.path = Some(dir.path().join("site.db"));
        config.webmention.timeout_seconds = 5;
        configure(&mut config);

        let db = Database::open_at(config.database.resolved_path().unwrap()).unwrap();
        let state = AppState::new(db.clone(), &config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            web::serve_on(listener, state).await.expect("Site server failed");
        });

        Self {
            url,
            db,
            config,
            _dir: dir,
        }
    }

    pub fn add_post(&self, slug: &str, post_type: &str, url: Option<&str>) {
        self.db
            .create_post(CreatePost {
                slug: slug.to_string(),
                title: None,
                content: "Hello world".to_string(),
                post_type: post_type.to_string(),
                status: PostStatus::Public,
                tags: vec![],
                url: url.map(String::from),
            })
            .unwrap();
    }

    pub fn sender(&self) -> Sender {
        let fetcher = Arc::new(ReqwestFetcher::new(&self.config.webmention).unwrap());
        Sender::new(
            fetcher,
            self.db.clone(),
            self.config.site.clone(),
            self.config.webmention.user_agent.clone(),
        )
    }

    pub async fn notify(&self, source: &str, target: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/webmention", self.url))
            .form(&[("source", source), ("target", target)])
            .send()
            .await
            .expect("Failed to reach site")
    }
}

/// Reply markup linking to `target`
pub fn reply_html(target: &str) -> String {
    format!(
        r#"<!doctype html><html><body><div class="h-entry"><time class="dt-published" datetime="2023-01-01T00:00:00Z"></time><div class="p-author h-card"><a class="u-url" href="https://alice.example">Alice</a></div><a href="{}">ref</a><p class="e-content">Nice post!</p></div></body></html>"#,
        target
    )
}

//! Outbound webmentions
//!
//! Sending is best effort: a post operation that triggers a webmention has
//! already succeeded, so [`Sender::notify_best_effort`] only logs failures.

use std::sync::Arc;
use url::Url;

use super::discover::discover;
use super::error::SendError;
use super::fetch::{FetchRequest, Fetcher};
use crate::config::SiteSection;
use crate::db::{Database, Post};

/// Post types that reference another page
const MENTIONING_TYPES: &[&str] = &["reply", "like", "repost", "bookmark"];

/// Result of a send attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The target does not advertise an endpoint
    NoEndpoint,
    Sent { endpoint: String, status: u16 },
}

/// Whether saving `post` should notify the page it references
pub fn should_send(post: &Post) -> bool {
    MENTIONING_TYPES.contains(&post.post_type.as_str())
        && post.url.as_deref().is_some_and(|u| !u.trim().is_empty())
}

/// Discovers endpoints and delivers webmentions
#[derive(Clone)]
pub struct Sender {
    fetcher: Arc<dyn Fetcher>,
    db: Database,
    site: SiteSection,
    user_agent: String,
}

impl Sender {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        db: Database,
        site: SiteSection,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            db,
            site,
            user_agent: user_agent.into(),
        }
    }

    /// Return the webmention endpoint `target` advertises, if any
    ///
    /// A `Link` header on a HEAD response is used directly; otherwise the
    /// page is fetched and both the headers and the markup are searched.
    pub async fn discover_endpoint(&self, target: &str) -> Result<Option<Url>, SendError> {
        let head = FetchRequest::head(target).with_header("User-Agent", &self.user_agent);
        match self.fetcher.fetch(head).await {
            Ok(response) if response.is_success() => {
                if let Some(endpoint) = discover(target, &response)? {
                    return Ok(Some(endpoint));
                }
            }
            Ok(response) => {
                tracing::debug!(url = target, status = response.status, "HEAD not usable for discovery");
            }
            Err(e) => {
                tracing::debug!(url = target, "HEAD failed, fetching page: {}", e);
            }
        }

        let request = FetchRequest::get(target).with_header("User-Agent", &self.user_agent);
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|source| SendError::Fetch {
                url: target.to_string(),
                source,
            })?;

        Ok(discover(target, &response)?)
    }

    /// Notify `target` that `source` links to it
    pub async fn send(&self, target: &str, source: &str) -> Result<SendOutcome, SendError> {
        let Some(endpoint) = self.discover_endpoint(target).await? else {
            tracing::debug!(url = target, "No webmention endpoint advertised");
            return Ok(SendOutcome::NoEndpoint);
        };

        let endpoint = endpoint.to_string();
        let request = FetchRequest::post_form(
            endpoint.clone(),
            vec![
                ("source".to_string(), source.to_string()),
                ("target".to_string(), target.to_string()),
            ],
        )
        .with_header("User-Agent", &self.user_agent);

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|source| SendError::Fetch {
                url: endpoint.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(SendError::Rejected {
                endpoint,
                status: response.status,
                body: response.body.chars().take(200).collect(),
            });
        }

        tracing::info!(url = target, endpoint = %endpoint, status = response.status, "Webmention sent");
        Ok(SendOutcome::Sent {
            endpoint,
            status: response.status,
        })
    }

    /// Send the webmention for a stored post, from its permalink to its `url`
    pub async fn send_for_post(&self, slug: &str) -> Result<SendOutcome, SendError> {
        if self.db.count_posts_by_slug(slug)? == 0 {
            return Err(SendError::PostNotFound(slug.to_string()));
        }
        let post = self
            .db
            .get_post_by_slug(slug)?
            .ok_or_else(|| SendError::PostNotFound(slug.to_string()))?;

        let target = match post.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(SendError::NothingToSend(slug.to_string())),
        };

        self.send(&target, &self.site.permalink(slug)).await
    }

    /// Outbound trigger run after a post is created, updated or deleted.
    ///
    /// Never fails; problems are logged.
    pub async fn notify_best_effort(&self, slug: &str) {
        let post = match self.db.get_post_by_slug(slug) {
            Ok(Some(post)) => post,
            Ok(None) => {
                tracing::warn!(slug, "Skipping webmention for missing post");
                return;
            }
            Err(e) => {
                tracing::warn!(slug, "Could not load post for webmention: {:#}", e);
                return;
            }
        };

        if !should_send(&post) {
            tracing::debug!(slug, post_type = %post.post_type, "Post type does not send webmentions");
            return;
        }

        match self.send_for_post(slug).await {
            Ok(SendOutcome::Sent { endpoint, status }) => {
                tracing::debug!(slug, endpoint = %endpoint, status, "Webmention delivered");
            }
            Ok(SendOutcome::NoEndpoint) => {
                tracing::debug!(slug, "Target does not accept webmentions");
            }
            Err(e) => {
                tracing::warn!(slug, "Webmention failed: {}", e);
            }
        }
    }
}

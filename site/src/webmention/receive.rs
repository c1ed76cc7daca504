//! Inbound webmention processing
//!
//! verify → target post lookup → extract → reconcile author → store.

use std::sync::Arc;

use super::error::WebmentionError;
use super::extract::{Extractor, SourceContent};
use super::fetch::Fetcher;
use super::reconcile::reconcile;
use super::store::{store, StoreAction, StoreOutcome};
use super::verify::{verify, InboundRequest};
use crate::config::{SiteFileConfig, SiteSection};
use crate::db::{Database, PostStatus};

/// Accepts webmentions for this site's posts
#[derive(Clone)]
pub struct Receiver {
    db: Database,
    extractor: Extractor,
    site: SiteSection,
    reject_loopback: bool,
}

impl Receiver {
    pub fn new(db: Database, fetcher: Arc<dyn Fetcher>, config: &SiteFileConfig) -> Self {
        Self {
            db,
            extractor: Extractor::new(
                fetcher,
                config.webmention.user_agent.clone(),
                config.site.placeholder_photo.clone(),
            ),
            site: config.site.clone(),
            reject_loopback: config.webmention.reject_loopback,
        }
    }

    /// Id of the live post `target` points at
    fn target_post_id(&self, target: &str) -> Result<i64, WebmentionError> {
        let slug = self.site.slug_from_url(target).ok_or_else(|| {
            WebmentionError::TargetNotFound("Target URL is not a post on this site".to_string())
        })?;

        let post = self
            .db
            .get_post_by_slug(&slug)?
            .ok_or_else(|| WebmentionError::TargetNotFound("Target post does not exist".to_string()))?;

        if post.status == PostStatus::Deleted {
            return Err(WebmentionError::TargetNotFound(
                "Target post has been deleted".to_string(),
            ));
        }
        Ok(post.id)
    }

    /// Process one inbound webmention
    pub async fn receive(&self, request: &InboundRequest) -> Result<StoreOutcome, WebmentionError> {
        let verified = verify(request, self.reject_loopback)?;
        let post_id = self.target_post_id(&verified.target)?;

        let content = self
            .extractor
            .extract(&verified.source, &verified.target)
            .await?;

        let outcome = match content {
            SourceContent::Retracted => {
                store(&self.db, &verified.source, post_id, StoreAction::Retract)?
            }
            SourceContent::Entry(entry) => {
                let person = reconcile(&self.db, &entry.author)?;
                store(
                    &self.db,
                    &verified.source,
                    post_id,
                    StoreAction::Upsert {
                        entry: &entry,
                        person: &person,
                    },
                )?
            }
        };

        tracing::info!(
            source_url = %verified.source,
            target_url = %verified.target,
            outcome = ?outcome,
            "Webmention processed"
        );
        Ok(outcome)
    }
}

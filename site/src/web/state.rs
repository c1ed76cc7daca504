//! Shared application state

use anyhow::Result;
use std::sync::Arc;

use crate::config::SiteFileConfig;
use crate::db::Database;
use crate::webmention::{Fetcher, Receiver, ReqwestFetcher};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: Database,
    /// Inbound webmention pipeline
    pub receiver: Receiver,
}

impl AppState {
    /// Create app state that fetches over the network
    pub fn new(db: Database, config: &SiteFileConfig) -> Result<Self> {
        let fetcher = Arc::new(ReqwestFetcher::new(&config.webmention)?);
        Ok(Self::with_fetcher(db, config, fetcher))
    }

    pub fn with_fetcher(db: Database, config: &SiteFileConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let receiver = Receiver::new(db.clone(), fetcher, config);
        Self { db, receiver }
    }
}

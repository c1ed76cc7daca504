//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const CONFIG_FILE: &str = ".microlight.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/microlight/
///
/// Returns the path if found, None otherwise.
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("microlight").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level site configuration (from .microlight.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteFileConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub webmention: WebmentionSection,
}

/// Public site settings
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Absolute URL the site is served from. Permalinks are
    /// `{base_url}?post_slug={slug}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Photo used for webmention authors whose h-card has no `u-photo`
    #[serde(default = "default_placeholder_photo")]
    pub placeholder_photo: String,
}

/// Database configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    /// SQLite file; defaults to ~/.microlight/microlight.db
    pub path: Option<PathBuf>,
}

/// HTTP server configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Webmention fetching and verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct WebmentionSection {
    /// Upper bound for every remote fetch (target, source, endpoint)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Bodies larger than this are abandoned mid-download
    #[serde(default = "default_max_response_size")]
    pub max_response_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Refuse `localhost` and loopback source/target URLs.
    /// Off by default to stay compatible with existing senders.
    #[serde(default)]
    pub reject_loopback: bool,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_placeholder_photo() -> String {
    "/uploads/me.jpg".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_response_size() -> usize {
    1024 * 1024
}

fn default_user_agent() -> String {
    format!("Microlight/{} (webmention)", env!("CARGO_PKG_VERSION"))
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            placeholder_photo: default_placeholder_photo(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for WebmentionSection {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_response_size: default_max_response_size(),
            user_agent: default_user_agent(),
            reject_loopback: false,
        }
    }
}

impl SiteSection {
    /// Site root, always ending in `/`
    pub fn root(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    /// Absolute URL of a post
    pub fn permalink(&self, slug: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(slug.as_bytes()).collect();
        format!("{}?post_slug={}", self.root(), encoded)
    }

    /// Recover the slug from one of this site's permalinks.
    ///
    /// Returns `None` for URLs that do not point at a post on this site.
    pub fn slug_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}?", self.root());
        if !url.starts_with(&prefix) {
            return None;
        }

        let parsed = Url::parse(url).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "post_slug")
            .map(|(_, value)| value.into_owned())
            .filter(|slug| !slug.is_empty())
    }
}

impl DatabaseSection {
    /// Resolved database path
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".microlight").join("microlight.db"))
    }
}

impl SiteFileConfig {
    /// Load config from .microlight.toml
    ///
    /// Search order:
    /// 1. `MICROLIGHT_CONFIG` environment variable
    /// 2. Walk up directory tree from cwd looking for .microlight.toml
    /// 3. Check ~/.config/microlight/.microlight.toml (global fallback)
    /// 4. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("MICROLIGHT_CONFIG") {
            tracing::debug!("Loading config from MICROLIGHT_CONFIG: {}", path);
            return Self::load_from_path(Path::new(&path));
        }

        if let Some(config_path) = find_config_file(CONFIG_FILE) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SiteFileConfig = toml::from_str(content)?;
        Url::parse(&config.site.base_url)
            .with_context(|| format!("site.base_url is not an absolute URL: {}", config.site.base_url))?;
        Ok(config)
    }
}

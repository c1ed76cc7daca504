//! Inbound request verification
//!
//! Runs before any network work; the first failing check wins.

use serde::Deserialize;
use std::net::IpAddr;
use url::{Host, Url};

use super::error::WebmentionError;

/// Decoded body of an inbound webmention
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InboundRequest {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

/// Source and target after verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest {
    pub source: String,
    pub target: String,
}

fn parse_web_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback() || ip.is_unspecified(),
        None => false,
    }
}

/// Check an inbound request's `source` and `target`.
///
/// Loopback hosts pass unless `reject_loopback` is set.
pub fn verify(
    request: &InboundRequest,
    reject_loopback: bool,
) -> Result<VerifiedRequest, WebmentionError> {
    let source = request.source.trim();
    let target = request.target.trim();

    if source.is_empty() {
        return Err(WebmentionError::InvalidRequest(
            "Source URL was not provided".to_string(),
        ));
    }
    if target.is_empty() {
        return Err(WebmentionError::InvalidRequest(
            "Target URL was not provided".to_string(),
        ));
    }
    if source == target {
        return Err(WebmentionError::InvalidRequest(
            "Source and Target URLs cannot be the same".to_string(),
        ));
    }

    let source_url = parse_web_url(source).ok_or_else(|| {
        WebmentionError::InvalidRequest("Source URL is not a valid URL".to_string())
    })?;
    let target_url = parse_web_url(target).ok_or_else(|| {
        WebmentionError::InvalidRequest("Target URL is not a valid URL".to_string())
    })?;

    if reject_loopback {
        if is_loopback(&source_url) {
            return Err(WebmentionError::InvalidRequest(
                "Source URL must not point at a loopback address".to_string(),
            ));
        }
        if is_loopback(&target_url) {
            return Err(WebmentionError::InvalidRequest(
                "Target URL must not point at a loopback address".to_string(),
            ));
        }
    }

    Ok(VerifiedRequest {
        source: source.to_string(),
        target: target.to_string(),
    })
}

//! Resolution of possibly-relative URLs found in remote documents

use url::{ParseError, Url};

use super::error::ResolveError;

fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

fn web_url(raw: &str) -> Result<Url, ResolveError> {
    match Url::parse(raw) {
        Ok(url) if is_web_url(&url) => Ok(url),
        _ => Err(ResolveError::Malformed(raw.to_string())),
    }
}

/// Resolve `candidate` against the document it was found in.
///
/// Absolute candidates must already be http(s). Root-relative candidates
/// (`/x`) hang off the base's origin; anything else is a sibling of the base
/// document, i.e. it replaces everything after the base path's last `/`.
pub fn resolve(candidate: &str, base: &str) -> Result<Url, ResolveError> {
    let candidate = candidate.trim();

    if let Some(rest) = candidate.strip_prefix("//") {
        let base = web_url(base)?;
        return web_url(&format!("{}://{}", base.scheme(), rest));
    }

    match Url::parse(candidate) {
        Ok(_) => return web_url(candidate),
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(_) => return Err(ResolveError::Malformed(candidate.to_string())),
    }

    let base = web_url(base)?;
    let mut origin = format!("{}://{}", base.scheme(), base.host_str().unwrap_or_default());
    if let Some(port) = base.port() {
        origin.push_str(&format!(":{}", port));
    }

    let joined = if candidate.starts_with('/') {
        format!("{}{}", origin, candidate)
    } else {
        let path = base.path();
        let dir = path.rfind('/').map(|idx| &path[..idx]).unwrap_or("");
        format!("{}{}/{}", origin, dir, candidate)
    };

    web_url(&joined)
}

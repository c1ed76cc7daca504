//! Webmention endpoint discovery
//!
//! The `Link` header wins over markup. Within markup, the first `<link>` or
//! `<a>` in document order whose `rel` contains the `webmention` token is
//! used. The endpoint is resolved against the target URL.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::error::ResolveError;
use super::fetch::FetchResponse;
use super::html::{has_token, ParsedHtml};
use super::resolve::resolve;

const REL_TOKEN: &str = "webmention";

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").unwrap());
static REL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*rel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s;,]+))"#).unwrap()
});

fn rel_has_token(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case(REL_TOKEN))
}

/// Endpoint advertised by `Link` header values, repeated or comma-joined
pub fn endpoint_from_link_headers<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    for value in values {
        for link in LINK_RE.captures_iter(value) {
            let params = &link[2];
            let advertised = REL_RE.captures_iter(params).any(|rel| {
                rel.get(1)
                    .or_else(|| rel.get(2))
                    .or_else(|| rel.get(3))
                    .is_some_and(|m| rel_has_token(m.as_str()))
            });
            if advertised {
                return Some(link[1].trim().to_string());
            }
        }
    }
    None
}

/// Endpoint advertised by `<link>` or `<a>` markup
pub fn endpoint_from_html(body: &str, url: &str) -> Option<String> {
    let parsed = ParsedHtml::parse(body, url);
    parsed
        .select_all("link[rel][href], a[rel][href]")
        .into_iter()
        .find(|el| has_token(el, "rel", REL_TOKEN))
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
}

/// Find and resolve the endpoint for a fetched target.
///
/// `Ok(None)` means the target does not accept webmentions.
pub fn discover(target_url: &str, response: &FetchResponse) -> Result<Option<Url>, ResolveError> {
    let raw = endpoint_from_link_headers(response.header_values("link"))
        .or_else(|| endpoint_from_html(&response.body, target_url));

    match raw {
        Some(raw) => {
            tracing::debug!(url = target_url, endpoint = %raw, "Discovered webmention endpoint");
            resolve(&raw, target_url).map(Some)
        }
        None => Ok(None),
    }
}

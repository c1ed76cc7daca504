//! Source content extraction
//!
//! Fetches the source of an inbound webmention and pulls out the h-entry
//! that links to the target: published time, author card and content.

use scraper::ElementRef;
use std::sync::Arc;
use url::Url;

use super::error::WebmentionError;
use super::fetch::{FetchRequest, Fetcher};
use super::html::{closest_with_class, element_text, has_class, select_first, ParsedHtml};
use super::resolve::resolve;
use crate::db::{InteractionKind, NewPerson};

/// Anchor classes that mark the kind of interaction, most specific first
const KIND_CLASSES: &[(&str, InteractionKind)] = &[
    ("u-like-of", InteractionKind::Like),
    ("u-repost-of", InteractionKind::Repost),
    ("u-bookmark-of", InteractionKind::Bookmark),
    ("u-in-reply-to", InteractionKind::Reply),
];

/// The parts of a source entry that get stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub author: NewPerson,
    pub datetime: String,
    pub contents: String,
    pub kind: InteractionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// The source is gone or no longer links to the target
    Retracted,
    Entry(SourceEntry),
}

fn invalid(reason: &str) -> WebmentionError {
    WebmentionError::InvalidSource(reason.to_string())
}

fn raw_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Absolute form of a URL found in the source; absolute inputs are kept verbatim
fn absolutize(href: &str, source_url: &str) -> Option<String> {
    let href = href.trim();
    let resolved = resolve(href, source_url).ok()?;
    if Url::parse(href).is_ok() {
        Some(href.to_string())
    } else {
        Some(resolved.to_string())
    }
}

fn detect_kind(links: &[ElementRef<'_>]) -> InteractionKind {
    KIND_CLASSES
        .iter()
        .find(|(class, _)| links.iter().any(|link| has_class(link, class)))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

/// Extract the entry linking to `target_url` from a fetched source body
pub fn parse_source(
    body: &str,
    source_url: &str,
    target_url: &str,
    placeholder_photo: &str,
) -> Result<SourceContent, WebmentionError> {
    let parsed = ParsedHtml::parse(body, source_url);

    let links: Vec<ElementRef<'_>> = parsed
        .select_all("a[href]")
        .into_iter()
        .filter(|a| a.value().attr("href") == Some(target_url))
        .collect();
    let Some(first_link) = links.first() else {
        return Ok(SourceContent::Retracted);
    };

    let entry = closest_with_class(first_link, "h-entry")
        .or_else(|| parsed.select_all(".h-entry").into_iter().next())
        .ok_or_else(|| invalid("Source URL does not contain a h-entry container"))?;

    let published = select_first(&entry, ".dt-published")
        .and_then(|el| match el.value().attr("datetime") {
            Some(datetime) => Some(datetime.trim().to_string()),
            None => Some(raw_text(&el)),
        })
        .filter(|published| !published.is_empty())
        .ok_or_else(|| invalid("Source URL does not contain a published date"))?;

    let card = select_first(&entry, ".p-author, .h-card, .hcard, .vcard")
        .ok_or_else(|| invalid("Source URL does not contain an author card within the post"))?;

    let photo_url = select_first(&card, "img.u-photo[src]")
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| absolutize(src, source_url))
        .unwrap_or_else(|| placeholder_photo.to_string());

    let name = match select_first(&card, ".p-name") {
        Some(el) => raw_text(&el),
        None => element_text(&card),
    };

    // An anchor card without u-url implies its own href
    let url = select_first(&card, "a.u-url[href]")
        .and_then(|a| a.value().attr("href"))
        .or_else(|| match card.value().name() {
            "a" => card.value().attr("href"),
            _ => None,
        })
        .and_then(|href| absolutize(href, source_url))
        .ok_or_else(|| invalid("Source URL does not contain the author's home URL"))?;

    let contents = select_first(&entry, ".e-content, .p-content")
        .map(|el| raw_text(&el))
        .unwrap_or_default();

    Ok(SourceContent::Entry(SourceEntry {
        author: NewPerson {
            url,
            name,
            photo_url,
        },
        datetime: published,
        contents,
        kind: detect_kind(&links),
    }))
}

/// Fetches and parses webmention sources
#[derive(Clone)]
pub struct Extractor {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
    placeholder_photo: String,
}

impl Extractor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        user_agent: impl Into<String>,
        placeholder_photo: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            placeholder_photo: placeholder_photo.into(),
        }
    }

    pub async fn extract(
        &self,
        source_url: &str,
        target_url: &str,
    ) -> Result<SourceContent, WebmentionError> {
        let request = FetchRequest::get(source_url).with_header("User-Agent", &self.user_agent);
        let response = self.fetcher.fetch(request).await.map_err(|e| {
            tracing::info!(source_url, "Source fetch failed: {}", e);
            WebmentionError::SourceUnreachable("Source URL could not be fetched".to_string())
        })?;

        if response.status == 410 {
            tracing::debug!(source_url, "Source is gone");
            return Ok(SourceContent::Retracted);
        }
        if !response.is_success() {
            return Err(WebmentionError::SourceUnreachable(
                "Source URL returned non-success status code".to_string(),
            ));
        }

        parse_source(&response.body, source_url, target_url, &self.placeholder_photo)
    }
}

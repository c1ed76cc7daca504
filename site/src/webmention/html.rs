//! Tolerant HTML parsing and the small DOM helpers built on it

use scraper::{ElementRef, Html, Selector};

/// A parsed remote document together with the parser's complaints
pub struct ParsedHtml {
    pub document: Html,
    pub errors: Vec<String>,
}

impl ParsedHtml {
    /// Parse `body`; never fails, whatever the markup looks like
    pub fn parse(body: &str, url: &str) -> Self {
        let document = Html::parse_document(body);
        let errors: Vec<String> = document.errors.iter().map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            tracing::debug!(url, count = errors.len(), "Ignoring HTML parse errors");
        }
        Self { document, errors }
    }

    /// Elements matching `selector`, in document order
    pub fn select_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        self.document.select(&selector).collect()
    }
}

pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element
pub fn element_text(el: &ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Whether `attr` holds `token` as one of its space-separated values
pub fn has_token(el: &ElementRef<'_>, attr: &str, token: &str) -> bool {
    el.value()
        .attr(attr)
        .map(|value| {
            value
                .split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token))
        })
        .unwrap_or(false)
}

/// First descendant of `scope` matching `selector`
pub fn select_first<'a>(scope: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return None,
    };
    scope.select(&selector).next()
}

/// Closest ancestor of `el` (itself included) carrying `class`
pub fn closest_with_class<'a>(el: &ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    if has_class(el, class) {
        return Some(*el);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| has_class(ancestor, class))
}

// src/services/extractor.rs

//! Article field extraction.
//!
//! Each field is read through a cascade: an ordered table of functions with
//! the signature `fn(&Page) -> Option<T>`, tried in turn until one returns a
//! value. Only the link and the title are required.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde_json::Value;

use crate::models::FeedItem;
use crate::services::links::page_identity_links;
use crate::services::{UrlNormalizer, parse_selector};
use crate::utils::date::{find_date_in_text, parse_datetime};
use crate::utils::text::{non_empty, normalize_whitespace, title_from_slug, truncate_graphemes};

/// Minimum length of a paragraph used as a description.
const MIN_PARAGRAPH_CHARS: usize = 50;
/// Paragraph descriptions are cut to this many grapheme clusters.
const MAX_DESCRIPTION_GRAPHEMES: usize = 500;

const DATE_META: [(&str, &str); 6] = [
    ("property", "article:published_time"),
    ("property", "og:published_time"),
    ("name", "publish_date"),
    ("name", "date"),
    ("name", "dc.date"),
    ("name", "DC.date"),
];
const JSON_LD_DATE_KEYS: [&str; 3] = ["datePublished", "dateCreated", "uploadDate"];

/// `February 12, 2026` style dates.
static MONTH_NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.? \d{1,2}, 20\d{2}\b")
        .expect("month pattern compiles")
});

/// A parsed article page and its resolved canonical link.
pub struct Page {
    pub document: Html,
    pub link: String,
}

type Cascade<T> = &'static [fn(&Page) -> Option<T>];

const TITLE_CASCADE: Cascade<String> = &[
    |p| p.meta(&[("property", "og:title")]),
    |p| p.meta(&[("name", "twitter:title"), ("property", "twitter:title")]),
    |p| p.meta(&[("name", "title")]),
    |p| p.first_text("h1"),
    |p| p.first_text("title"),
    title_from_link,
];

const DESCRIPTION_CASCADE: Cascade<String> = &[
    |p| p.meta(&[("property", "og:description")]),
    |p| p.meta(&[("name", "description")]),
    |p| p.meta(&[("name", "twitter:description"), ("property", "twitter:description")]),
    first_substantial_paragraph,
];

const DATE_CASCADE: Cascade<DateTime<FixedOffset>> =
    &[date_from_meta, date_from_time_element, date_from_json_ld, date_from_visible_text];

const AUTHOR_CASCADE: Cascade<String> =
    &[|p| p.meta(&[("name", "author"), ("property", "article:author")])];

fn first_of<T>(cascade: Cascade<T>, page: &Page) -> Option<T> {
    cascade.iter().find_map(|step| step(page))
}

/// Builds feed items from article pages of one site section.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    normalizer: UrlNormalizer,
}

impl ContentExtractor {
    pub fn new(normalizer: UrlNormalizer) -> Self {
        Self { normalizer }
    }

    /// Extract a feed item from a fetched page.
    ///
    /// `url` is the requested URL, `effective_url` the post-redirect URL.
    /// Returns `None` when no link candidate passes the normalizer or no
    /// title can be found.
    pub fn extract(&self, url: &str, html: &str, effective_url: Option<&str>) -> Option<FeedItem> {
        let document = Html::parse_document(html);
        let base = effective_url.unwrap_or(url);
        let link = self.resolve_link(&document, url, base)?;
        let page = Page { document, link };

        let title = first_of(TITLE_CASCADE, &page)?;
        let mut item = FeedItem::new(title, page.link.clone());
        item.description = first_of(DESCRIPTION_CASCADE, &page);
        item.published = first_of(DATE_CASCADE, &page);
        item.author = first_of(AUTHOR_CASCADE, &page);
        Some(item)
    }

    /// Canonical link, then `og:url`, then the effective URL, then the
    /// requested URL. Every candidate must pass the normalizer.
    fn resolve_link(&self, document: &Html, url: &str, base: &str) -> Option<String> {
        let mut candidates = page_identity_links(document).unwrap_or_default();
        candidates.push(base.to_string());
        candidates.push(url.to_string());
        candidates
            .iter()
            .find_map(|candidate| self.normalizer.normalize(candidate, base))
    }
}

impl Page {
    /// First non-empty `content` of the given `meta` attribute/value pairs.
    pub fn meta(&self, candidates: &[(&str, &str)]) -> Option<String> {
        candidates.iter().find_map(|(attr, value)| {
            let selector = parse_selector(&format!(r#"meta[{attr}="{value}"][content]"#)).ok()?;
            self.document
                .select(&selector)
                .filter_map(|e| e.value().attr("content"))
                .find_map(non_empty)
        })
    }

    /// Whitespace-normalized text of the first element matching `css`.
    pub fn first_text(&self, css: &str) -> Option<String> {
        let selector = parse_selector(css).ok()?;
        self.document
            .select(&selector)
            .next()
            .and_then(|e| non_empty(&element_text(&e)))
    }
}

/// Text of an element with inline markup joined as written.
fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn title_from_link(page: &Page) -> Option<String> {
    let path = url::Url::parse(&page.link).ok()?.path().to_string();
    let slug = path.trim_end_matches('/').rsplit('/').next()?;
    let decoded = urlencoding::decode(slug).ok()?;
    title_from_slug(&decoded)
}

fn first_substantial_paragraph(page: &Page) -> Option<String> {
    let selector = parse_selector("article p, main p").ok()?;
    page.document
        .select(&selector)
        .map(|p| normalize_whitespace(&element_text(&p)))
        .find(|text| text.chars().count() >= MIN_PARAGRAPH_CHARS)
        .map(|text| truncate_graphemes(&text, MAX_DESCRIPTION_GRAPHEMES))
}

fn date_from_meta(page: &Page) -> Option<DateTime<FixedOffset>> {
    DATE_META
        .iter()
        .find_map(|pair| page.meta(&[*pair]).and_then(|v| parse_datetime(&v)))
}

fn date_from_time_element(page: &Page) -> Option<DateTime<FixedOffset>> {
    let selector = parse_selector("time").ok()?;
    page.document.select(&selector).find_map(|time| {
        let candidate = time
            .value()
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| element_text(&time));
        parse_datetime(&candidate)
    })
}

fn date_from_json_ld(page: &Page) -> Option<DateTime<FixedOffset>> {
    json_ld_objects(&page.document).iter().find_map(|obj| {
        JSON_LD_DATE_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .find_map(parse_datetime)
    })
}

fn date_from_visible_text(page: &Page) -> Option<DateTime<FixedOffset>> {
    let text = visible_text(&page.document);
    find_date_in_text(&text).or_else(|| month_name_date(&text))
}

fn month_name_date(text: &str) -> Option<DateTime<FixedOffset>> {
    MONTH_NAME_DATE
        .find_iter(text)
        .find_map(|m| parse_datetime(&m.as_str().replace('.', "")))
}

/// Objects in every JSON-LD block, flattening top-level arrays and `@graph`.
fn json_ld_objects(document: &Html) -> Vec<serde_json::Map<String, Value>> {
    let Ok(selector) = parse_selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut objects = Vec::new();
    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(parsed) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let entries = match parsed {
            Value::Array(items) => items,
            other => vec![other],
        };
        for entry in entries {
            if let Value::Object(mut map) = entry {
                if let Some(Value::Array(graph)) = map.remove("@graph") {
                    objects.push(map);
                    objects.extend(graph.into_iter().filter_map(|g| match g {
                        Value::Object(m) => Some(m),
                        _ => None,
                    }));
                } else {
                    objects.push(map);
                }
            }
        }
    }
    objects
}

/// Text content outside `<script>`, `<style>` and `<noscript>`.
fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if !hidden {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }
    parts.join(" ")
}

// src/services/links.rs

//! Outbound article links of a single page.

use std::collections::HashSet;

use scraper::Html;
use serde_json::Value;

use crate::error::Result;
use crate::services::{UrlNormalizer, parse_selector};

/// Script blocks worth scanning for embedded links.
const JSON_SCRIPT_TYPES: [&str; 2] = ["application/json", "application/ld+json"];
const NEXT_DATA_ID: &str = "__NEXT_DATA__";

/// Ordered, deduplicated article links found in a page.
///
/// Sources in priority order: anchor hrefs, the canonical link, `og:url`,
/// string values inside JSON script blobs, then a raw scan of the markup
/// for section-shaped paths.
pub fn extract_page_links(
    html: &str,
    page_url: &str,
    normalizer: &UrlNormalizer,
) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let mut links = LinkSet::new(normalizer, page_url);

    let anchor_sel = parse_selector("a[href]")?;
    for anchor in document.select(&anchor_sel) {
        if let Some(href) = anchor.value().attr("href") {
            links.add(href);
        }
    }

    for href in page_identity_links(&document)? {
        links.add(&href);
    }

    let script_sel = parse_selector("script")?;
    for script in document.select(&script_sel) {
        let element = script.value();
        let is_json = element.id() == Some(NEXT_DATA_ID)
            || element
                .attr("type")
                .is_some_and(|t| JSON_SCRIPT_TYPES.contains(&t.trim()));
        if !is_json {
            continue;
        }
        let raw: String = script.text().collect();
        let Ok(payload) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        for value in json_strings(&payload) {
            for candidate in links_in_json_string(value, normalizer) {
                links.add(&candidate);
            }
        }
    }

    for found in normalizer.section_path_pattern().find_iter(html) {
        links.add(found.as_str());
    }

    Ok(links.into_vec())
}

/// Canonical and `og:url` hrefs of a document, in that order.
pub fn page_identity_links(document: &Html) -> Result<Vec<String>> {
    let canonical_sel = parse_selector(r#"link[rel~="canonical"][href]"#)?;
    let og_sel = parse_selector(r#"meta[property="og:url"][content]"#)?;

    let canonical = document
        .select(&canonical_sel)
        .filter_map(|e| e.value().attr("href"));
    let og = document
        .select(&og_sel)
        .filter_map(|e| e.value().attr("content"));
    Ok(canonical.chain(og).map(str::to_string).collect())
}

/// Candidate hrefs inside one JSON string value.
///
/// The value itself counts when it looks like a URL or a section path;
/// section paths embedded in longer text are picked out as well.
fn links_in_json_string(value: &str, normalizer: &UrlNormalizer) -> Vec<String> {
    let text = value.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let section = normalizer.section();
    let section_prefix = format!("{section}/");
    let relative_prefix = &section_prefix[1..];

    if text.starts_with("http://") || text.starts_with("https://") || text.starts_with(&section_prefix)
    {
        candidates.push(text.to_string());
    } else if !relative_prefix.is_empty() && text.starts_with(relative_prefix) {
        candidates.push(format!("/{text}"));
    }

    candidates.extend(
        normalizer
            .section_path_pattern()
            .find_iter(text)
            .map(|m| m.as_str().to_string()),
    );
    candidates
}

/// All string values of a JSON document, depth-first in document order.
fn json_strings(root: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        match current {
            Value::String(s) => out.push(s.as_str()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::Object(map) => {
                let values: Vec<&Value> = map.values().collect();
                stack.extend(values.into_iter().rev());
            }
            _ => {}
        }
    }
    out
}

/// Normalizing, order-preserving URL set.
struct LinkSet<'a> {
    normalizer: &'a UrlNormalizer,
    base: &'a str,
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl<'a> LinkSet<'a> {
    fn new(normalizer: &'a UrlNormalizer, base: &'a str) -> Self {
        Self {
            normalizer,
            base,
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    fn add(&mut self, raw: &str) {
        if let Some(url) = self.normalizer.normalize(raw, self.base) {
            if self.seen.insert(url.clone()) {
                self.urls.push(url);
            }
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

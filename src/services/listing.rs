// src/services/listing.rs

//! Listing page scraper.
//!
//! Pulls feed items out of a page using configured CSS selectors: one
//! selector for the item containers and optional per-field selectors
//! evaluated inside each container.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{FeedItem, ItemSelectors};
use crate::services::parse_selector;
use crate::utils::date::parse_datetime;
use crate::utils::resolve_url;
use crate::utils::text::non_empty;

/// Compiled selectors for one listing page layout.
#[derive(Debug, Clone)]
pub struct ListingScraper {
    items: Selector,
    title: Option<Selector>,
    link: Option<Selector>,
    description: Option<Selector>,
    date: Option<Selector>,
    author: Option<Selector>,
    attr_name: String,
    first_anchor: Selector,
}

impl ListingScraper {
    /// Compile the configured selectors. Invalid CSS is an error here, not
    /// at scrape time.
    pub fn new(selectors: &ItemSelectors) -> Result<Self> {
        let optional = |s: &Option<String>| s.as_deref().map(parse_selector).transpose();

        Ok(Self {
            items: parse_selector(&selectors.items)?,
            title: optional(&selectors.title)?,
            link: optional(&selectors.link)?,
            description: optional(&selectors.description)?,
            date: optional(&selectors.date)?,
            author: optional(&selectors.author)?,
            attr_name: selectors.attr_name.clone(),
            first_anchor: parse_selector("a")?,
        })
    }

    /// Items found on a page with distinct links, in page order.
    ///
    /// Containers without a title or a resolvable link are skipped. Capping
    /// is left to the assembler so collection order sees every item.
    pub fn scrape(&self, html: &str, page_url: &str) -> Vec<FeedItem> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut containers = 0;

        for container in document.select(&self.items) {
            containers += 1;
            let Some(item) = self.parse_item(&container, base.as_ref()) else {
                continue;
            };
            if !seen.insert(item.link.clone()) {
                continue;
            }
            items.push(item);
        }

        if containers == 0 {
            log::warn!("No containers match selector on {page_url}");
        } else {
            log::info!("Parsed {} of {containers} containers on {page_url}", items.len());
        }
        items
    }

    fn parse_item(&self, container: &ElementRef<'_>, base: Option<&Url>) -> Option<FeedItem> {
        let title = select_text(container, self.title.as_ref())?;
        let link = self.item_link(container, base)?;

        let mut item = FeedItem::new(title, link);
        item.description = select_text(container, self.description.as_ref());
        item.author = select_text(container, self.author.as_ref());
        item.published = self
            .date
            .as_ref()
            .and_then(|sel| container.select(sel).next())
            .and_then(|e| {
                let raw = e
                    .value()
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| e.text().collect());
                parse_datetime(&raw)
            });
        Some(item)
    }

    /// Link selector, else the container itself when it is an `<a>`, else
    /// the container's first `<a>`.
    fn item_link(&self, container: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
        let element = match &self.link {
            Some(sel) => container.select(sel).next()?,
            None if container.value().name() == "a" => *container,
            None => container.select(&self.first_anchor).next()?,
        };
        let raw = element.value().attr(&self.attr_name)?.trim();
        if raw.is_empty() {
            return None;
        }
        match base {
            Some(base) => resolve_url(base, raw).map(String::from),
            None => Url::parse(raw).ok().map(String::from),
        }
    }
}

fn select_text(container: &ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let element = container.select(selector?).next()?;
    non_empty(&element.text().collect::<String>())
}

// src/services/feed_filter.rs

//! Parsing of existing RSS/Atom feeds and category filtering.

use crate::error::{AppError, Result};
use crate::models::FeedItem;
use crate::utils::text::non_empty;

/// A parsed upstream feed.
#[derive(Debug, Clone, Default)]
pub struct SourceFeed {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub items: Vec<FeedItem>,
}

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes.
///
/// Entries keep a guid only when the source declares an id; feed-rs's
/// generated ids are suppressed so guid-less items fall back to their link.
pub fn parse_feed(bytes: &[u8]) -> Result<SourceFeed> {
    let feed = feed_rs::parser::Builder::new()
        .id_generator(|_links, _title, _uri| String::new())
        .build()
        .parse(bytes)
        .map_err(AppError::feed)?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.trim().to_string())?;
            let title = entry.title.and_then(|t| non_empty(&t.content))?;

            let mut item = FeedItem::new(title, link);
            item.description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .filter(|d| !d.trim().is_empty());
            item.published = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.fixed_offset());
            item.author = entry
                .authors
                .into_iter()
                .map(|p| p.name)
                .find(|name| !name.trim().is_empty());
            item.guid = Some(entry.id).filter(|id| !id.trim().is_empty());
            item.categories = entry
                .categories
                .into_iter()
                .flat_map(|c| {
                    let label = c
                        .label
                        .filter(|l| !l.trim().eq_ignore_ascii_case(c.term.trim()));
                    std::iter::once(c.term).chain(label)
                })
                .filter(|c| !c.trim().is_empty())
                .collect();
            Some(item)
        })
        .collect();

    Ok(SourceFeed {
        title: feed.title.and_then(|t| non_empty(&t.content)),
        link: feed.links.first().map(|l| l.href.clone()),
        description: feed.description.and_then(|d| non_empty(&d.content)),
        items,
    })
}

/// Case-insensitive category allow-list.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    wanted: Vec<String>,
}

impl CategoryFilter {
    pub fn new(categories: &[String]) -> Result<Self> {
        let wanted: Vec<String> = categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if wanted.is_empty() {
            return Err(AppError::config("categories must not be empty"));
        }
        Ok(Self { wanted })
    }

    /// Whether any of the item's categories is on the list.
    pub fn matches(&self, item: &FeedItem) -> bool {
        item.categories
            .iter()
            .any(|c| self.wanted.contains(&c.trim().to_lowercase()))
    }

    pub fn apply(&self, items: Vec<FeedItem>) -> Vec<FeedItem> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

// src/pipeline/assemble.rs

//! Feed assembly: validation, de-duplication, capping and ordering of items
//! before they reach a renderer.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::FeedItem;
use crate::pipeline::render::EmissionOrder;

/// How the incoming item list was collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOrder {
    /// Items arrive most recent first; keep the order.
    #[default]
    NewestFirst,
    /// Items arrive oldest first; the newest are at the end.
    OldestFirst,
    /// Order is arbitrary; sort by publish date, undated last.
    ByDateDesc,
}

/// What to do with items that carry no publish date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// Render without a date.
    #[default]
    Omit,
    /// Stamp with the build time.
    BuildTime,
}

/// One validated entry, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntry {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub published: Option<DateTime<FixedOffset>>,
}

/// Turns collected items into the entry list handed to a renderer.
#[derive(Debug, Clone, Default)]
pub struct FeedAssembler {
    pub max_items: Option<usize>,
    pub order: CollectionOrder,
    pub missing_date: MissingDatePolicy,
}

impl FeedAssembler {
    pub fn new(order: CollectionOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_missing_date(mut self, policy: MissingDatePolicy) -> Self {
        self.missing_date = policy;
        self
    }

    /// Produce entries that a renderer with the given emission behavior will
    /// write newest first.
    pub fn assemble(&self, items: Vec<FeedItem>, emission: EmissionOrder) -> Vec<RenderEntry> {
        let total = items.len();
        let mut entries = self.dedup(items.into_iter().filter_map(validate));
        let dropped = total - entries.len();
        if dropped > 0 {
            log::debug!("Dropped {dropped} of {total} items as invalid or duplicate");
        }

        entries = self.order_and_cap(entries);

        if self.missing_date == MissingDatePolicy::BuildTime {
            let now = Utc::now().fixed_offset();
            for entry in entries.iter_mut().filter(|e| e.published.is_none()) {
                entry.published = Some(now);
            }
        }

        if emission == EmissionOrder::Reversed {
            entries.reverse();
        }
        entries
    }

    /// First occurrence wins. An item collapses into an earlier one sharing
    /// its link, or sharing an explicitly provided guid.
    fn dedup(&self, entries: impl Iterator<Item = (RenderEntry, bool)>) -> Vec<RenderEntry> {
        let mut seen_links = HashSet::new();
        let mut seen_guids = HashSet::new();
        let mut kept = Vec::new();

        for (entry, explicit_guid) in entries {
            if seen_links.contains(&entry.link) || (explicit_guid && seen_guids.contains(&entry.guid))
            {
                continue;
            }
            seen_links.insert(entry.link.clone());
            seen_guids.insert(entry.guid.clone());
            kept.push(entry);
        }
        kept
    }

    fn order_and_cap(&self, mut entries: Vec<RenderEntry>) -> Vec<RenderEntry> {
        let cap = self.max_items.unwrap_or(usize::MAX);
        match self.order {
            CollectionOrder::NewestFirst => {
                entries.truncate(cap);
            }
            CollectionOrder::OldestFirst => {
                let skip = entries.len().saturating_sub(cap);
                entries.drain(..skip);
                entries.reverse();
            }
            CollectionOrder::ByDateDesc => {
                // stable: equal dates keep collection order
                entries.sort_by(|a, b| match (&a.published, &b.published) {
                    (Some(a), Some(b)) => b.cmp(a),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                });
                entries.truncate(cap);
            }
        }
        entries
    }
}

/// Required fields check. Returns the entry and whether its guid was given.
fn validate(item: FeedItem) -> Option<(RenderEntry, bool)> {
    let title = item.title.trim().to_string();
    let guid = item
        .guid
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string);

    let mut link = item.link.trim().to_string();
    if link.is_empty() {
        match guid.as_deref() {
            Some(g) if g.starts_with("http://") || g.starts_with("https://") => {
                link = g.to_string();
            }
            _ => {
                log::warn!("Dropping item without link: {title:?}");
                return None;
            }
        }
    }
    if title.is_empty() {
        log::warn!("Dropping item without title: {link}");
        return None;
    }

    let explicit_guid = guid.is_some();
    Some((
        RenderEntry {
            guid: guid.unwrap_or_else(|| link.clone()),
            title,
            link,
            description: item.description.filter(|d| !d.trim().is_empty()),
            author: item.author.filter(|a| !a.trim().is_empty()),
            categories: item.categories,
            published: item.published,
        },
        explicit_guid,
    ))
}

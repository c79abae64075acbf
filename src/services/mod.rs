//! Service layer for the feed builder.
//!
//! This module contains the business logic for:
//! - URL validation (`UrlNormalizer`)
//! - Article field extraction (`ContentExtractor`)
//! - Article discovery over listings, sitemaps and links (`LinkDiscovery`)
//! - CSS-selector listing scrapes (`ListingScraper`)
//! - Upstream feed parsing and category filtering (`CategoryFilter`)

pub mod discovery;
pub mod extractor;
pub mod feed_filter;
pub mod frontier;
pub mod links;
pub mod listing;
pub mod normalizer;
pub mod sitemap;

use scraper::Selector;

use crate::error::{AppError, Result};

pub use discovery::{DiscoverySettings, LinkDiscovery};
pub use extractor::ContentExtractor;
pub use feed_filter::{CategoryFilter, SourceFeed, parse_feed};
pub use frontier::Frontier;
pub use links::extract_page_links;
pub use listing::ListingScraper;
pub use normalizer::UrlNormalizer;

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

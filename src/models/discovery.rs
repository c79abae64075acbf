//! Link discovery structures.

use serde::Serialize;

/// A validated article URL together with where it was found.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Canonical absolute URL
    pub url: String,

    /// Listing page, sitemap file or article page that linked to it
    pub discovered_from: String,
}

impl CandidateUrl {
    pub fn new(url: impl Into<String>, discovered_from: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovered_from: discovered_from.into(),
        }
    }
}

/// Result of a full discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Count of URLs found on the listing pages
    pub listing_count: usize,

    /// Count of URLs found through sitemaps
    pub sitemap_count: usize,

    /// Pages fetched during recursive discovery
    pub pages_visited: usize,

    /// Every candidate, first occurrence order
    pub urls: Vec<CandidateUrl>,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn url_strings(&self) -> Vec<String> {
        self.urls.iter().map(|c| c.url.clone()).collect()
    }
}

// src/services/discovery.rs

//! Link discovery engine.
//!
//! Finds article URLs for one site section in three steps:
//!
//! 1. **Listing pages**: links on the configured index pages.
//! 2. **Sitemaps**: `robots.txt` declarations first, then well-known
//!    sitemap locations, following nested sitemap indexes up to a file cap.
//! 3. **Recursive crawl**: breadth-first over everything found so far,
//!    collecting links from each fetched article, up to a page cap.
//!
//! No single fetch failure is fatal. The report lists candidates in
//! first-seen order: listing, then sitemap, then crawl.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::models::{CandidateUrl, DiscoveryReport};
use crate::services::frontier::Frontier;
use crate::services::links::extract_page_links;
use crate::services::sitemap::{is_sitemap_url, robots_sitemaps, sitemap_entries};
use crate::services::UrlNormalizer;
use crate::utils::http::Fetcher;

/// Where to look and how far to go.
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Site root used to resolve sitemap entries, e.g. `https://www.minimax.io`
    pub site_root: String,
    /// Index pages of the content section
    pub listing_urls: Vec<String>,
    /// Sitemap locations to try after the robots.txt declarations
    pub sitemap_urls: Vec<String>,
    /// `robots.txt` location, if it should be consulted
    pub robots_url: Option<String>,
    /// Maximum pages fetched during the recursive crawl
    pub max_discovery_pages: usize,
    /// Maximum sitemap files fetched
    pub max_sitemaps: usize,
}

/// Runs discovery for one site section.
pub struct LinkDiscovery {
    fetcher: Arc<dyn Fetcher>,
    normalizer: UrlNormalizer,
    settings: DiscoverySettings,
}

impl LinkDiscovery {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        normalizer: UrlNormalizer,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            settings,
        }
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    /// Run all three phases.
    pub async fn run(&self) -> DiscoveryReport {
        let listing = self.listing_links().await;
        let sitemap = self.sitemap_links().await;

        let mut frontier = Frontier::new();
        for candidate in listing.iter().chain(sitemap.iter()) {
            frontier.push(&candidate.url, &candidate.discovered_from);
        }

        self.crawl(&mut frontier).await;

        let report = DiscoveryReport {
            listing_count: listing.len(),
            sitemap_count: sitemap.len(),
            pages_visited: frontier.visited_count(),
            urls: frontier.into_candidates(),
        };
        log::info!(
            "Discovered {} candidate URLs (listing: {}, sitemap: {}, pages crawled: {})",
            report.urls.len(),
            report.listing_count,
            report.sitemap_count,
            report.pages_visited
        );
        report
    }

    /// Phase 1: links on every listing page, deduplicated across pages.
    pub async fn listing_links(&self) -> Vec<CandidateUrl> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for listing_url in &self.settings.listing_urls {
            let response = match self.fetcher.get(listing_url).await {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Failed to fetch listing page {listing_url}: {e}");
                    continue;
                }
            };

            let links =
                match extract_page_links(&response.body, &response.final_url, &self.normalizer) {
                    Ok(links) => links,
                    Err(e) => {
                        log::warn!("Failed to read links from {listing_url}: {e}");
                        continue;
                    }
                };
            if links.is_empty() {
                log::warn!("No article links on listing page {listing_url}");
            }
            for url in links {
                if seen.insert(url.clone()) {
                    found.push(CandidateUrl::new(url, listing_url.as_str()));
                }
            }
        }
        found
    }

    /// Phase 2: article links from robots-declared and well-known sitemaps.
    pub async fn sitemap_links(&self) -> Vec<CandidateUrl> {
        let mut queue: VecDeque<String> = self.settings.sitemap_urls.iter().cloned().collect();
        for declared in self.declared_sitemaps().await.into_iter().rev() {
            queue.push_front(declared);
        }

        let mut seen_sitemaps = HashSet::new();
        let mut seen_urls = HashSet::new();
        let mut found = Vec::new();
        let mut scanned = 0;

        while scanned < self.settings.max_sitemaps {
            let Some(sitemap_url) = queue.pop_front() else {
                break;
            };
            if !seen_sitemaps.insert(sitemap_url.clone()) {
                continue;
            }
            scanned += 1;

            let body = match self.fetcher.get(&sitemap_url).await {
                Ok(response) => response.body,
                Err(e) => {
                    log::warn!("Failed to read sitemap {sitemap_url}: {e}");
                    continue;
                }
            };

            for entry in sitemap_entries(&body) {
                if is_sitemap_url(&entry) {
                    if self.normalizer.host_matches(&entry) && !seen_sitemaps.contains(&entry) {
                        queue.push_back(entry);
                    }
                    continue;
                }
                if let Some(url) = self.normalizer.normalize(&entry, &self.settings.site_root) {
                    if seen_urls.insert(url.clone()) {
                        found.push(CandidateUrl::new(url, sitemap_url.as_str()));
                    }
                }
            }
        }

        log::debug!("Scanned {scanned} sitemap files, {} article URLs", found.len());
        found
    }

    async fn declared_sitemaps(&self) -> Vec<String> {
        let Some(robots_url) = self.settings.robots_url.as_deref() else {
            return Vec::new();
        };
        match self.fetcher.get(robots_url).await {
            Ok(response) => robots_sitemaps(&response.body),
            Err(e) => {
                log::debug!("No robots.txt at {robots_url}: {e}");
                Vec::new()
            }
        }
    }

    /// Phase 3: breadth-first crawl bounded by `max_discovery_pages`.
    async fn crawl(&self, frontier: &mut Frontier) {
        while frontier.visited_count() < self.settings.max_discovery_pages {
            let Some(page_url) = frontier.next_unvisited() else {
                break;
            };

            let response = match self.fetcher.get(&page_url).await {
                Ok(response) => response,
                Err(e) => {
                    log::debug!("Crawl fetch failed {page_url}: {e}");
                    continue;
                }
            };

            match extract_page_links(&response.body, &page_url, &self.normalizer) {
                Ok(links) => {
                    for url in links {
                        frontier.push(&url, &page_url);
                    }
                }
                Err(e) => log::debug!("Failed to read links from {page_url}: {e}"),
            }
        }

        if frontier.queued() > 0 {
            log::debug!(
                "Crawl stopped at {} pages with {} still queued",
                frontier.visited_count(),
                frontier.queued()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::fake::FakeFetcher;

    const ROOT: &str = "https://www.minimax.io";

    fn settings() -> DiscoverySettings {
        DiscoverySettings {
            site_root: ROOT.to_string(),
            listing_urls: vec![format!("{ROOT}/news")],
            sitemap_urls: vec![format!("{ROOT}/sitemap.xml")],
            robots_url: Some(format!("{ROOT}/robots.txt")),
            max_discovery_pages: 60,
            max_sitemaps: 80,
        }
    }

    fn discovery(fetcher: FakeFetcher, settings: DiscoverySettings) -> LinkDiscovery {
        let normalizer = UrlNormalizer::new("minimax.io", "/news").unwrap();
        LinkDiscovery::new(Arc::new(fetcher), normalizer, settings)
    }

    #[tokio::test]
    async fn test_listing_anchor_then_json() {
        let fetcher = FakeFetcher::new().page(
            "https://www.minimax.io/news",
            r#"<a href="/news/minimax-m25">M2.5</a>
               <script type="application/json">{"list":["/news/minimax-agent"]}</script>"#,
        );
        let report = discovery(fetcher, settings()).run().await;
        assert_eq!(
            report.url_strings(),
            vec![
                "https://www.minimax.io/news/minimax-m25",
                "https://www.minimax.io/news/minimax-agent",
            ]
        );
        assert_eq!(report.listing_count, 2);
    }

    #[tokio::test]
    async fn test_sitemap_text_fallback() {
        let fetcher = FakeFetcher::new().page(
            "https://www.minimax.io/sitemap.xml",
            "not xml at all https://www.minimax.io/news/from-text \
             https://other.com/news/offsite",
        );
        let report = discovery(fetcher, settings()).run().await;
        assert_eq!(
            report.url_strings(),
            vec!["https://www.minimax.io/news/from-text"]
        );
        assert_eq!(report.sitemap_count, 1);
    }

    #[tokio::test]
    async fn test_robots_sitemap_is_read_first_and_indexes_followed() {
        let fetcher = FakeFetcher::new()
            .page(
                "https://www.minimax.io/robots.txt",
                "Sitemap: https://www.minimax.io/declared.xml",
            )
            .page(
                "https://www.minimax.io/declared.xml",
                r#"<sitemapindex>
                     <sitemap><loc>https://www.minimax.io/nested.xml</loc></sitemap>
                     <sitemap><loc>https://evil.com/nested.xml</loc></sitemap>
                   </sitemapindex>"#,
            )
            .page(
                "https://www.minimax.io/nested.xml",
                "<urlset><url><loc>https://www.minimax.io/news/nested-post</loc></url></urlset>",
            )
            .page(
                "https://www.minimax.io/sitemap.xml",
                "<urlset><url><loc>https://www.minimax.io/news/guessed-post</loc></url></urlset>",
            );
        let fetcher = Arc::new(fetcher);
        let normalizer = UrlNormalizer::new("minimax.io", "/news").unwrap();
        let engine = LinkDiscovery::new(fetcher.clone(), normalizer, settings());

        let urls: Vec<_> = engine
            .sitemap_links()
            .await
            .into_iter()
            .map(|c| c.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://www.minimax.io/news/guessed-post",
                "https://www.minimax.io/news/nested-post",
            ]
        );
        let requests = fetcher.requests();
        assert_eq!(requests[1], "https://www.minimax.io/declared.xml");
        assert!(!requests.iter().any(|r| r.contains("evil.com")));
    }

    #[tokio::test]
    async fn test_sitemap_cap_and_dedup() {
        let fetcher = FakeFetcher::new().page(
            "https://www.minimax.io/sitemap.xml",
            "<urlset><url><loc>https://www.minimax.io/sitemap.xml</loc></url>\
             <url><loc>https://www.minimax.io/more.xml</loc></url></urlset>",
        );
        let fetcher = Arc::new(fetcher);
        let mut settings = settings();
        settings.robots_url = None;
        settings.max_sitemaps = 1;
        let engine = LinkDiscovery::new(
            fetcher.clone(),
            UrlNormalizer::new("minimax.io", "/news").unwrap(),
            settings,
        );

        assert!(engine.sitemap_links().await.is_empty());
        assert_eq!(fetcher.requests(), vec!["https://www.minimax.io/sitemap.xml"]);
    }

    #[tokio::test]
    async fn test_nested_indexes_stop_at_sitemap_cap() {
        let fetcher = FakeFetcher::new()
            .page(
                "https://www.minimax.io/sitemap.xml",
                r#"<sitemapindex>
                     <sitemap><loc>https://www.minimax.io/missing.xml</loc></sitemap>
                     <sitemap><loc>https://www.minimax.io/a.xml</loc></sitemap>
                     <sitemap><loc>https://www.minimax.io/b.xml</loc></sitemap>
                   </sitemapindex>"#,
            )
            .page(
                "https://www.minimax.io/a.xml",
                "<urlset><url><loc>https://www.minimax.io/news/from-a</loc></url></urlset>",
            )
            .page(
                "https://www.minimax.io/b.xml",
                "<urlset><url><loc>https://www.minimax.io/news/from-b</loc></url></urlset>",
            );
        let fetcher = Arc::new(fetcher);
        let mut settings = settings();
        settings.robots_url = None;
        settings.max_sitemaps = 3;
        let engine = LinkDiscovery::new(
            fetcher.clone(),
            UrlNormalizer::new("minimax.io", "/news").unwrap(),
            settings,
        );

        let urls: Vec<_> = engine
            .sitemap_links()
            .await
            .into_iter()
            .map(|c| c.url)
            .collect();
        // the failed fetch still counts toward the cap
        assert_eq!(urls, vec!["https://www.minimax.io/news/from-a"]);
        assert_eq!(
            fetcher.requests(),
            vec![
                "https://www.minimax.io/sitemap.xml",
                "https://www.minimax.io/missing.xml",
                "https://www.minimax.io/a.xml",
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_follows_links_and_dedups() {
        let fetcher = FakeFetcher::new()
            .page(
                "https://www.minimax.io/news",
                r#"<a href="/news/a">A</a><a href="/news/b">B</a>"#,
            )
            .page(
                "https://www.minimax.io/news/a",
                r#"<a href="/news/b">B</a><a href="/news/c">C</a>"#,
            )
            .page(
                "https://www.minimax.io/news/c",
                r#"<a href="/news/a">A</a><a href="/news/d">D</a>"#,
            );
        let report = discovery(fetcher, settings()).run().await;
        assert_eq!(
            report.url_strings(),
            vec![
                "https://www.minimax.io/news/a",
                "https://www.minimax.io/news/b",
                "https://www.minimax.io/news/c",
                "https://www.minimax.io/news/d",
            ]
        );
        assert_eq!(report.urls[2].discovered_from, "https://www.minimax.io/news/a");
        assert_eq!(report.pages_visited, 4);
    }

    #[tokio::test]
    async fn test_crawl_respects_page_cap() {
        let mut fetcher = FakeFetcher::new().page(
            "https://www.minimax.io/news",
            r#"<a href="/news/p0">0</a>"#,
        );
        for i in 0..20 {
            fetcher = fetcher.page(
                &format!("https://www.minimax.io/news/p{i}"),
                &format!(r#"<a href="/news/p{}">next</a>"#, i + 1),
            );
        }
        let fetcher = Arc::new(fetcher);
        let mut settings = settings();
        settings.max_discovery_pages = 3;
        settings.robots_url = None;
        settings.sitemap_urls.clear();
        let engine = LinkDiscovery::new(
            fetcher.clone(),
            UrlNormalizer::new("minimax.io", "/news").unwrap(),
            settings,
        );

        let report = engine.run().await;
        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.urls.len(), 4);
        // listing page + three crawled pages
        assert_eq!(fetcher.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_everything_failing_yields_empty_report() {
        let report = discovery(FakeFetcher::new(), settings()).run().await;
        assert!(report.is_empty());
    }
}

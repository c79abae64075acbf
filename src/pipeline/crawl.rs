// src/pipeline/crawl.rs

//! Site crawl pipeline: discovery followed by per-article extraction.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{CandidateUrl, DiscoveryReport, FeedItem};
use crate::services::{ContentExtractor, LinkDiscovery};
use crate::utils::http::Fetcher;

/// Items collected by one crawl.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub report: DiscoveryReport,
    pub items: Vec<FeedItem>,
    /// Candidates that failed to fetch or yielded no item
    pub failures: usize,
}

/// Discovers article URLs and turns each into a feed item.
pub struct CrawlPipeline {
    fetcher: Arc<dyn Fetcher>,
    discovery: LinkDiscovery,
    extractor: ContentExtractor,
    max_items: usize,
    concurrency: usize,
}

impl CrawlPipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        discovery: LinkDiscovery,
        max_items: usize,
        concurrency: usize,
    ) -> Self {
        let extractor = ContentExtractor::new(discovery.normalizer().clone());
        Self {
            fetcher,
            discovery,
            extractor,
            max_items,
            concurrency: concurrency.max(1),
        }
    }

    /// Run discovery, then fetch candidates in discovery order until
    /// `max_items` distinct items are collected.
    pub async fn run(&self) -> Result<CrawlOutcome> {
        let start_time = Utc::now();
        let report = self.discovery.run().await;
        if report.is_empty() {
            return Err(AppError::discovery("no candidate URLs found"));
        }

        let mut outcome = CrawlOutcome::default();
        let mut seen = HashSet::new();

        let mut articles = stream::iter(report.urls.iter().cloned())
            .map(|candidate| async move {
                let result = self.fetch_item(&candidate).await;
                (candidate, result)
            })
            .buffered(self.concurrency);

        while let Some((candidate, result)) = articles.next().await {
            match result {
                Ok(item) => {
                    if seen.insert(item.link.clone()) {
                        outcome.items.push(item);
                    }
                }
                Err(e) => {
                    outcome.failures += 1;
                    log::warn!("Skipping {}: {e}", candidate.url);
                }
            }
            if outcome.items.len() >= self.max_items {
                break;
            }
        }
        drop(articles);

        let elapsed = Utc::now() - start_time;
        log::info!(
            "Extracted {} items from {} candidates ({} skipped) in {}s",
            outcome.items.len(),
            report.urls.len(),
            outcome.failures,
            elapsed.num_seconds()
        );

        outcome.report = report;
        Ok(outcome)
    }

    async fn fetch_item(&self, candidate: &CandidateUrl) -> Result<FeedItem> {
        let response = self.fetcher.get(&candidate.url).await?;
        let mut item = self
            .extractor
            .extract(&candidate.url, &response.body, Some(&response.final_url))
            .ok_or_else(|| AppError::extraction(&candidate.url, "no title or valid link"))?;
        item.guid.get_or_insert_with(|| candidate.url.clone());
        Ok(item)
    }
}

// src/jobs/site_crawl.rs

//! `site_crawl`: discover a site section's articles and publish them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::jobs::{FeedTarget, Job, default_output};
use crate::models::{ChannelMeta, HttpOptions, JobConfig, JobContext, JobResult};
use crate::pipeline::{CollectionOrder, CrawlPipeline, FeedAssembler};
use crate::services::{DiscoverySettings, LinkDiscovery, UrlNormalizer};
use crate::utils::http::{Fetcher, HttpClient};
use crate::utils::site_root;
use crate::utils::text::title_from_slug;

pub const JOB_TYPE: &str = "site_crawl";

/// Well-known sitemap locations under the site root.
const SITEMAP_PATHS: [&str; 6] = [
    "sitemap.xml",
    "sitemap_index.xml",
    "sitemap-index.xml",
    "sitemaps.xml",
    "sitemap/news.xml",
    "sitemap-news.xml",
];

#[derive(Debug, Clone, Deserialize)]
pub struct SiteCrawlSettings {
    /// Site home page, e.g. `https://www.minimax.io`
    pub site_url: String,

    /// Content section path
    #[serde(default = "defaults::section")]
    pub section: String,

    /// Host suffix articles must live on (default: site host minus `www.`)
    #[serde(default)]
    pub domain: Option<String>,

    /// Index pages (default: site URL plus section)
    #[serde(default)]
    pub listing_urls: Vec<String>,

    /// Sitemap locations (default: the well-known list)
    #[serde(default)]
    pub sitemaps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteCrawlOptions {
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    #[serde(default = "defaults::max_discovery_pages")]
    pub max_discovery_pages: usize,

    #[serde(default = "defaults::max_sitemaps")]
    pub max_sitemaps: usize,

    /// Article fetches in flight at once
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    #[serde(flatten)]
    pub http: HttpOptions,
}

pub struct SiteCrawlJob {
    target: FeedTarget,
    pipeline: CrawlPipeline,
    max_items: usize,
}

/// Registry factory.
pub fn create(config: &JobConfig) -> Result<Box<dyn Job>> {
    Ok(Box::new(SiteCrawlJob::from_config(config)?))
}

impl SiteCrawlJob {
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let options: SiteCrawlOptions = config.options()?;
        let client = HttpClient::new(&options.http)?;
        Self::build(config, options, Arc::new(client))
    }

    /// Build against a caller-supplied fetcher.
    pub fn with_fetcher(config: &JobConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::build(config, config.options()?, fetcher)
    }

    fn build(config: &JobConfig, options: SiteCrawlOptions, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let name = config.display_name();
        let settings: SiteCrawlSettings = config.settings()?;
        if options.max_items == 0 {
            return Err(AppError::config(format!("{name}: options.max_items must be > 0")));
        }

        let site_url = Url::parse(settings.site_url.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .ok_or_else(|| {
                AppError::config(format!("{name}: site_url is not an http(s) URL"))
            })?;
        let host = site_url.host_str().unwrap_or_default().to_ascii_lowercase();
        let domain = settings
            .domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| host.trim_start_matches("www.").to_string());

        let normalizer = UrlNormalizer::new(&domain, &settings.section)?;
        let root = site_root(&site_url);
        let section_url = format!(
            "{}{}",
            settings.site_url.trim().trim_end_matches('/'),
            normalizer.section()
        );

        let listing_urls = if settings.listing_urls.is_empty() {
            vec![section_url.clone()]
        } else {
            settings.listing_urls.clone()
        };
        let sitemap_urls = settings.sitemaps.clone().unwrap_or_else(|| {
            SITEMAP_PATHS
                .iter()
                .map(|path| format!("{root}/{path}"))
                .collect()
        });

        let section_title = title_from_slug(normalizer.section().trim_start_matches('/'))
            .unwrap_or_else(|| "News".to_string());
        let target = FeedTarget::from_config(
            config,
            &default_output(&name),
            ChannelMeta::new(
                format!("{host} {section_title}"),
                section_url,
                format!("Latest articles from {host}{}", normalizer.section()),
            ),
        )?;

        let discovery = LinkDiscovery::new(
            Arc::clone(&fetcher),
            normalizer,
            DiscoverySettings {
                site_root: root.clone(),
                listing_urls,
                sitemap_urls,
                robots_url: Some(format!("{root}/robots.txt")),
                max_discovery_pages: options.max_discovery_pages,
                max_sitemaps: options.max_sitemaps,
            },
        );

        Ok(Self {
            target,
            pipeline: CrawlPipeline::new(fetcher, discovery, options.max_items, options.concurrency),
            max_items: options.max_items,
        })
    }
}

#[async_trait]
impl Job for SiteCrawlJob {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobResult> {
        let outcome = self.pipeline.run().await?;
        if outcome.items.is_empty() {
            return Err(AppError::job(
                self.name(),
                format!("no items extracted from {} candidates", outcome.report.urls.len()),
            ));
        }

        let assembler = FeedAssembler::new(CollectionOrder::NewestFirst).with_max_items(self.max_items);
        self.target.publish(ctx, &assembler, outcome.items).await
    }
}

mod defaults {
    pub fn section() -> String {
        "/news".to_string()
    }
    pub fn max_items() -> usize {
        80
    }
    pub fn max_discovery_pages() -> usize {
        60
    }
    pub fn max_sitemaps() -> usize {
        80
    }
    pub fn concurrency() -> usize {
        1
    }
}

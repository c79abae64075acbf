// src/jobs/selector_scrape.rs

//! `selector_scrape`: one listing page, items picked with CSS selectors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::jobs::{FeedTarget, Job, default_output};
use crate::models::{ChannelMeta, HttpOptions, ItemSelectors, JobConfig, JobContext, JobResult};
use crate::pipeline::{CollectionOrder, FeedAssembler};
use crate::services::ListingScraper;
use crate::utils::http::{Fetcher, HttpClient};

pub const JOB_TYPE: &str = "selector_scrape";

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorScrapeSettings {
    pub url: String,
    pub selectors: ItemSelectors,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorScrapeOptions {
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    /// Collection order of the page's items
    #[serde(default)]
    pub order: CollectionOrder,

    #[serde(flatten)]
    pub http: HttpOptions,
}

pub struct SelectorScrapeJob {
    target: FeedTarget,
    url: String,
    scraper: ListingScraper,
    options: SelectorScrapeOptions,
    fetcher: Arc<dyn Fetcher>,
}

pub fn create(config: &JobConfig) -> Result<Box<dyn Job>> {
    Ok(Box::new(SelectorScrapeJob::from_config(config)?))
}

impl SelectorScrapeJob {
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let options = Self::options(config)?;
        let client = HttpClient::new(&options.http)?;
        Self::build(config, options, Arc::new(client))
    }

    pub fn with_fetcher(config: &JobConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::build(config, Self::options(config)?, fetcher)
    }

    fn options(config: &JobConfig) -> Result<SelectorScrapeOptions> {
        let mut options: SelectorScrapeOptions = config.options()?;
        options.http = options.http.with_default_timeout(defaults::TIMEOUT);
        Ok(options)
    }

    fn build(
        config: &JobConfig,
        options: SelectorScrapeOptions,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let name = config.display_name();
        let settings: SelectorScrapeSettings = config.settings()?;
        let url = settings.url.trim().to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::config(format!("{name}: url is not an http(s) URL")));
        }
        if options.max_items == 0 {
            return Err(AppError::config(format!("{name}: options.max_items must be > 0")));
        }

        let scraper = ListingScraper::new(&settings.selectors)
            .map_err(|e| AppError::config(format!("{name}: {e}")))?;
        let target = FeedTarget::from_config(
            config,
            &default_output(&name),
            ChannelMeta::new(&name, &url, format!("{name} RSS Feed")),
        )?;

        Ok(Self {
            target,
            url,
            scraper,
            options,
            fetcher,
        })
    }
}

#[async_trait]
impl Job for SelectorScrapeJob {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobResult> {
        let response = self.fetcher.get(&self.url).await?;
        let items = self.scraper.scrape(&response.body, &response.final_url);
        if items.is_empty() {
            return Err(AppError::job(self.name(), format!("no items parsed from {}", self.url)));
        }

        let assembler = FeedAssembler::new(self.options.order).with_max_items(self.options.max_items);
        self.target.publish(ctx, &assembler, items).await
    }
}

mod defaults {
    pub const TIMEOUT: u64 = 10;

    pub fn max_items() -> usize {
        20
    }
}

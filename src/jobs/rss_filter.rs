// src/jobs/rss_filter.rs

//! `rss_filter`: republish the entries of an existing feed that carry one of
//! the configured categories.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::jobs::{FeedTarget, Job, default_output};
use crate::models::{ChannelMeta, HttpOptions, JobConfig, JobContext, JobResult};
use crate::pipeline::{CollectionOrder, FeedAssembler};
use crate::services::{CategoryFilter, SourceFeed, parse_feed};
use crate::utils::http::{Fetcher, HttpClient};

pub const JOB_TYPE: &str = "rss_filter";

#[derive(Debug, Clone, Deserialize)]
pub struct RssFilterSettings {
    pub source_url: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RssFilterOptions {
    #[serde(default)]
    pub max_items: Option<usize>,

    #[serde(flatten)]
    pub http: HttpOptions,
}

pub struct RssFilterJob {
    target: FeedTarget,
    source_url: String,
    filter: CategoryFilter,
    max_items: Option<usize>,
    /// Channel fields left to the source feed
    inherit_title: bool,
    inherit_description: bool,
    fetcher: Arc<dyn Fetcher>,
}

pub fn create(config: &JobConfig) -> Result<Box<dyn Job>> {
    Ok(Box::new(RssFilterJob::from_config(config)?))
}

impl RssFilterJob {
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let options = Self::options(config)?;
        let client = HttpClient::new(&options.http)?;
        Self::build(config, options, Arc::new(client))
    }

    pub fn with_fetcher(config: &JobConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::build(config, Self::options(config)?, fetcher)
    }

    fn options(config: &JobConfig) -> Result<RssFilterOptions> {
        let mut options: RssFilterOptions = config.options()?;
        options.http = options
            .http
            .with_default_timeout(defaults::TIMEOUT)
            .with_default_accept(defaults::ACCEPT);
        Ok(options)
    }

    fn build(config: &JobConfig, options: RssFilterOptions, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let name = config.display_name();
        let settings: RssFilterSettings = config.settings()?;
        let source_url = settings.source_url.trim().to_string();
        if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
            return Err(AppError::config(format!("{name}: source_url is not an http(s) URL")));
        }
        let filter = CategoryFilter::new(&settings.categories)
            .map_err(|e| AppError::config(format!("{name}: {e}")))?;

        let target = FeedTarget::from_config(
            config,
            &default_output(&name),
            ChannelMeta::new(
                format!("{source_url} - filtered"),
                &source_url,
                format!("{source_url} filtered by category"),
            ),
        )?;

        Ok(Self {
            target,
            source_url,
            filter,
            max_items: options.max_items,
            inherit_title: is_unset(&config.title),
            inherit_description: is_unset(&config.description),
            fetcher,
        })
    }

    /// Channel for this run, filling unset fields from the source feed.
    fn channel_target(&self, source: &SourceFeed) -> FeedTarget {
        let mut target = self.target.clone();
        if self.inherit_title {
            if let Some(title) = &source.title {
                target.channel.title = format!("{title} - filtered");
            }
        }
        if self.inherit_description {
            if let Some(description) = &source.description {
                target.channel.description = description.clone();
            }
        }
        target
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[async_trait]
impl Job for RssFilterJob {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobResult> {
        let response = self.fetcher.get(&self.source_url).await?;
        let source = parse_feed(response.body.as_bytes())?;
        let total = source.items.len();
        let target = self.channel_target(&source);

        let kept = self.filter.apply(source.items);
        log::info!("{}: {} of {total} entries match", self.name(), kept.len());
        if kept.is_empty() {
            return Err(AppError::job(self.name(), "no entries match the categories"));
        }

        let mut assembler = FeedAssembler::new(CollectionOrder::NewestFirst);
        assembler.max_items = self.max_items;
        target.publish(ctx, &assembler, kept).await
    }
}

mod defaults {
    pub const TIMEOUT: u64 = 15;
    pub const ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8";
}

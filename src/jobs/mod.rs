//! Config-driven feed jobs.
//!
//! A job turns one `[[jobs]]` entry into one feed file. Job types are looked
//! up in a [`JobRegistry`] and executed in isolation by the [`JobRunner`].
//!
//! Built-in types:
//! - `site_crawl`: sitemap and link discovery over a site section
//! - `selector_scrape`: CSS selectors over one listing page
//! - `rss_filter`: category filter over an existing feed
//! - `json_api`: items from a JSON listing endpoint

pub mod json_api;
pub mod registry;
pub mod rss_filter;
pub mod runner;
pub mod selector_scrape;
pub mod site_crawl;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ChannelMeta, FeedItem, JobConfig, JobContext, JobResult};
use crate::pipeline::{FeedAssembler, FeedRenderer, MissingDatePolicy, RssRenderer};
use crate::storage::{FeedStorage, LocalStorage, sanitize_output};

pub use registry::{JobFactory, JobRegistry};
pub use runner::{JobRunner, RunReport};

/// One runnable feed job.
#[async_trait]
pub trait Job: Send + Sync {
    /// Name used in results and logs.
    fn name(&self) -> &str;

    /// Produce the feed. Any error becomes a failed result for this job only.
    async fn run(&self, ctx: &JobContext) -> Result<JobResult>;
}

/// `<name>.xml`, lowercased with runs of other characters folded to `_`.
pub fn default_output(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            stem.extend(c.to_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "feed.xml".to_string()
    } else {
        format!("{stem}.xml")
    }
}

/// `[options]` keys honored by every job type when publishing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishOptions {
    /// `omit` or `build_time`
    #[serde(default)]
    pub missing_date: MissingDatePolicy,
}

/// Where a job writes and what its channel says about itself.
#[derive(Debug, Clone)]
pub struct FeedTarget {
    pub name: String,
    pub output: String,
    pub channel: ChannelMeta,
    pub missing_date: MissingDatePolicy,
}

impl FeedTarget {
    /// Apply the config's `output` and channel overrides on top of the job
    /// type's defaults. The output name is checked here.
    pub fn from_config(config: &JobConfig, default_output: &str, defaults: ChannelMeta) -> Result<Self> {
        let name = config.display_name();
        let output = config.output_or(default_output);
        sanitize_output(&output).map_err(|e| AppError::config(format!("{name}: {e}")))?;
        let publish: PublishOptions = config.options()?;

        let pick = |value: &Option<String>, fallback: String| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };

        let channel = ChannelMeta {
            title: pick(&config.title, defaults.title),
            link: pick(&config.link, defaults.link),
            description: pick(&config.description, defaults.description),
            language: config
                .language
                .clone()
                .filter(|l| !l.trim().is_empty())
                .or(defaults.language),
        };

        Ok(Self {
            name,
            output,
            channel,
            missing_date: publish.missing_date,
        })
    }

    /// Assemble, render and write the feed. The target's missing-date policy
    /// replaces the assembler's.
    pub async fn publish(
        &self,
        ctx: &JobContext,
        assembler: &FeedAssembler,
        items: Vec<FeedItem>,
    ) -> Result<JobResult> {
        let renderer = RssRenderer::new();
        let assembler = assembler.clone().with_missing_date(self.missing_date);
        let entries = assembler.assemble(items, renderer.emission_order());
        if entries.is_empty() {
            return Err(AppError::job(&self.name, "no valid items to publish"));
        }

        let bytes = renderer.render(&self.channel, &entries)?;
        let storage = LocalStorage::new(&ctx.feeds_dir);
        let path = storage.write_feed(&self.output, &bytes).await?;

        log::info!(
            "{}: wrote {} items to {}",
            self.name,
            entries.len(),
            path.display()
        );
        Ok(JobResult::success(
            &self.name,
            format!("{} items -> {}", entries.len(), path.display()),
        ))
    }
}

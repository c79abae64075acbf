// src/jobs/json_api.rs

//! `json_api`: feed items from one or more JSON listing endpoints.
//!
//! A single endpoint is configured with top-level keys. Several endpoints
//! go in a `[[jobs.sources]]` list; their items are merged, sorted by date
//! and capped once. A source that fails is logged and skipped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::jobs::{FeedTarget, Job, default_output};
use crate::models::{ChannelMeta, FeedItem, HttpOptions, JobConfig, JobContext, JobResult};
use crate::pipeline::{CollectionOrder, FeedAssembler};
use crate::utils::date::parse_datetime;
use crate::utils::http::{Fetcher, HttpClient};
use crate::utils::resolve_url;
use crate::utils::text::non_empty;

pub const JOB_TYPE: &str = "json_api";

/// One endpoint and its field mapping.
///
/// Field names accept dot paths. An empty `items_path` means the document
/// itself is the array.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonSource {
    pub api_url: String,

    /// Base for relative item links (default: the API URL)
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "defaults::items_path")]
    pub items_path: String,

    /// Keep only items tagged with this value
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "defaults::tags_field")]
    pub tags_field: String,

    #[serde(default = "defaults::title_field")]
    pub title_field: String,

    #[serde(default = "defaults::link_field")]
    pub link_field: String,

    #[serde(default = "defaults::description_field")]
    pub description_field: String,

    #[serde(default = "defaults::date_field")]
    pub date_field: String,

    #[serde(default = "defaults::author_field")]
    pub author_field: String,

    /// Category added to every item of this source
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceList {
    sources: Vec<JsonSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonApiOptions {
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    #[serde(flatten)]
    pub http: HttpOptions,
}

/// A validated source.
#[derive(Debug, Clone)]
struct Endpoint {
    source: JsonSource,
    api_url: String,
    base: Url,
}

pub struct JsonApiJob {
    target: FeedTarget,
    endpoints: Vec<Endpoint>,
    max_items: usize,
    fetcher: Arc<dyn Fetcher>,
}

pub fn create(config: &JobConfig) -> Result<Box<dyn Job>> {
    Ok(Box::new(JsonApiJob::from_config(config)?))
}

impl JsonApiJob {
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let options = Self::options(config)?;
        let client = HttpClient::new(&options.http)?;
        Self::build(config, options, Arc::new(client))
    }

    pub fn with_fetcher(config: &JobConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::build(config, Self::options(config)?, fetcher)
    }

    fn options(config: &JobConfig) -> Result<JsonApiOptions> {
        let mut options: JsonApiOptions = config.options()?;
        options.http = options
            .http
            .with_default_timeout(defaults::TIMEOUT)
            .with_default_accept(defaults::ACCEPT);
        Ok(options)
    }

    fn build(config: &JobConfig, options: JsonApiOptions, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let name = config.display_name();
        if options.max_items == 0 {
            return Err(AppError::config(format!("{name}: options.max_items must be > 0")));
        }

        let sources = if config.settings.contains_key("sources") {
            config.settings::<SourceList>()?.sources
        } else {
            vec![config.settings::<JsonSource>()?]
        };
        if sources.is_empty() {
            return Err(AppError::config(format!("{name}: sources must not be empty")));
        }
        let endpoints = sources
            .into_iter()
            .map(|source| Endpoint::new(source).map_err(|e| AppError::config(format!("{name}: {e}"))))
            .collect::<Result<Vec<_>>>()?;

        let target = FeedTarget::from_config(
            config,
            &default_output(&name),
            ChannelMeta::new(&name, endpoints[0].base.as_str(), format!("{name} RSS Feed")),
        )?;

        Ok(Self {
            target,
            endpoints,
            max_items: options.max_items,
            fetcher,
        })
    }

    async fn collect(&self, endpoint: &Endpoint) -> Result<Vec<FeedItem>> {
        let response = self.fetcher.get(&endpoint.api_url).await?;
        let document: Value = serde_json::from_str(&response.body)?;
        endpoint.parse_items(&document)
    }
}

impl Endpoint {
    fn new(source: JsonSource) -> std::result::Result<Self, String> {
        let api_url = source.api_url.trim().to_string();
        if Url::parse(&api_url).is_err() {
            return Err(format!("api_url {api_url:?} is not a URL"));
        }

        let base_str = source.base_url.as_deref().unwrap_or(&api_url).trim().to_string();
        let base = Url::parse(&base_str)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| format!("{base_str} is not an http(s) URL"))?;

        Ok(Self {
            source,
            api_url,
            base,
        })
    }

    /// Convert the listing document into items, applying the tag filter.
    fn parse_items(&self, document: &Value) -> Result<Vec<FeedItem>> {
        let source = &self.source;
        let list = lookup(document, &source.items_path)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::extraction(&self.api_url, format!("no array at '{}'", source.items_path))
            })?;

        let wanted = source
            .tag
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let label = source.label.as_deref().and_then(non_empty);

        let items = list
            .iter()
            .filter_map(|post| {
                let tags = tag_names(lookup(post, &source.tags_field));
                if let Some(wanted) = &wanted {
                    if !tags.iter().any(|t| t.to_lowercase() == *wanted) {
                        return None;
                    }
                }
                let mut item = self.parse_item(post)?;
                item.categories = label.iter().cloned().chain(tags).collect();
                Some(item)
            })
            .collect();
        Ok(items)
    }

    fn parse_item(&self, post: &Value) -> Option<FeedItem> {
        let source = &self.source;
        let title = string_at(post, &source.title_field)?;
        let href = string_at(post, &source.link_field)?;
        let link = resolve_url(&self.base, &href)?;

        let mut item = FeedItem::new(title, link);
        item.description = string_at(post, &source.description_field);
        item.published = lookup(post, &source.date_field).and_then(date_value);
        item.author = lookup(post, &source.author_field).and_then(|v| match v {
            Value::Object(_) => string_at(v, "name"),
            other => scalar_string(other),
        });
        Some(item)
    }
}

#[async_trait]
impl Job for JsonApiJob {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobResult> {
        let mut items = Vec::new();
        let mut failed = 0;

        for endpoint in &self.endpoints {
            match self.collect(endpoint).await {
                Ok(found) => {
                    log::info!("{}: {} items from {}", self.name(), found.len(), endpoint.api_url);
                    items.extend(found);
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("{}: skipping source {}: {e}", self.name(), endpoint.api_url);
                }
            }
        }

        if items.is_empty() {
            return Err(AppError::job(
                self.name(),
                format!(
                    "no items from {} sources ({failed} failed)",
                    self.endpoints.len()
                ),
            ));
        }

        let assembler = FeedAssembler::new(CollectionOrder::ByDateDesc).with_max_items(self.max_items);
        self.target.publish(ctx, &assembler, items).await
    }
}

/// Follow a dot path such as `data.posts`.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
            _ => None,
        })
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_at(value: &Value, path: &str) -> Option<String> {
    lookup(value, path).and_then(scalar_string)
}

/// Date strings are parsed permissively; numbers are Unix seconds.
fn date_value(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.fixed_offset()),
        _ => None,
    }
}

/// Tag lists may hold strings or objects with a `name` or `slug`.
fn tag_names(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(tags)) = value else {
        return match value.and_then(scalar_string) {
            Some(single) => vec![single],
            None => Vec::new(),
        };
    };
    tags.iter()
        .filter_map(|tag| match tag {
            Value::Object(_) => string_at(tag, "name").or_else(|| string_at(tag, "slug")),
            other => scalar_string(other),
        })
        .collect()
}

mod defaults {
    pub const TIMEOUT: u64 = 15;
    pub const ACCEPT: &str = "application/json";

    pub fn items_path() -> String {
        "posts".to_string()
    }
    pub fn tags_field() -> String {
        "tags".to_string()
    }
    pub fn title_field() -> String {
        "title".to_string()
    }
    pub fn link_field() -> String {
        "url".to_string()
    }
    pub fn description_field() -> String {
        "summary".to_string()
    }
    pub fn date_field() -> String {
        "date".to_string()
    }
    pub fn author_field() -> String {
        "author".to_string()
    }
    pub fn max_items() -> usize {
        50
    }
}

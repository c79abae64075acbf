// src/jobs/registry.rs

//! Job type table.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::jobs::{Job, json_api, rss_filter, selector_scrape, site_crawl};
use crate::models::JobConfig;

/// Builds a job from its configuration, validating every setting.
pub type JobFactory = fn(&JobConfig) -> Result<Box<dyn Job>>;

/// Maps a config `type` to the factory for that job.
#[derive(Clone, Default)]
pub struct JobRegistry {
    factories: HashMap<String, JobFactory>,
}

impl JobRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in job type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(site_crawl::JOB_TYPE, site_crawl::create);
        registry.register(selector_scrape::JOB_TYPE, selector_scrape::create);
        registry.register(rss_filter::JOB_TYPE, rss_filter::create);
        registry.register(json_api::JOB_TYPE, json_api::create);
        registry
    }

    /// Add or replace a job type.
    pub fn register(&mut self, job_type: impl Into<String>, factory: JobFactory) {
        self.factories.insert(job_type.into(), factory);
    }

    /// Registered type names, sorted.
    pub fn job_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Construct the job a config entry names.
    pub fn create(&self, config: &JobConfig) -> Result<Box<dyn Job>> {
        let job_type = config
            .job_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::config("job is missing its type"))?;

        let factory = self.factories.get(job_type).ok_or_else(|| {
            let available = self.job_types();
            let available = if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            };
            AppError::config(format!(
                "unknown job type '{job_type}' (available: {available})"
            ))
        })?;

        factory(config)
    }
}

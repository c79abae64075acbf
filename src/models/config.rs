//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduled re-run settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// Feed jobs, executed in file order
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Only file-level values are checked here; job-specific settings are
    /// validated when the job is constructed so one bad job cannot sink the
    /// whole batch.
    pub fn validate(&self) -> Result<()> {
        if self.update.interval_secs == 0 {
            return Err(AppError::validation("update.interval_secs must be > 0"));
        }
        Ok(())
    }

    /// Jobs whose `enabled` flag is set.
    pub fn enabled_jobs(&self) -> impl Iterator<Item = &JobConfig> {
        self.jobs.iter().filter(|job| job.enabled)
    }
}

/// Scheduled re-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Run on a schedule even when `--schedule` is not passed
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between batch runs
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: defaults::interval(),
        }
    }
}

/// One configured feed job.
///
/// `type` and `name` stay optional so that a malformed job surfaces as a
/// failed result for that job instead of a file-level parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Selects the job implementation
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Output file name, relative to the feeds directory
    #[serde(default)]
    pub output: Option<String>,

    /// Channel title override
    #[serde(default)]
    pub title: Option<String>,

    /// Channel link override
    #[serde(default)]
    pub link: Option<String>,

    /// Channel description override
    #[serde(default)]
    pub description: Option<String>,

    /// Channel language code
    #[serde(default)]
    pub language: Option<String>,

    /// Job-specific tuning knobs
    #[serde(default)]
    pub options: toml::Table,

    /// Job-specific source keys (`site_url`, `selectors`, ...)
    #[serde(flatten)]
    pub settings: toml::Table,
}

impl JobConfig {
    /// Best available name: `name`, then `type`, then a placeholder.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .or(self.job_type.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unnamed")
            .to_string()
    }

    /// Output file name, or the given default.
    pub fn output_or(&self, default: &str) -> String {
        self.output
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Decode the top-level job-specific keys into a typed struct.
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T> {
        toml::Value::Table(self.settings.clone())
            .try_into()
            .map_err(|e| AppError::config(format!("{}: invalid settings: {e}", self.display_name())))
    }

    /// Decode the `[options]` table into a typed struct.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|e| AppError::config(format!("{}: invalid options: {e}", self.display_name())))
    }
}

/// HTTP behavior shared by every job type.
///
/// Flattened into each job's options table, so the keys are `timeout`,
/// `retries`, `backoff_factor` and `user_agent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Request timeout in seconds (job types pick their own default)
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Extra attempts for retryable failures
    #[serde(default = "defaults::retries")]
    pub retries: u32,

    /// Base delay in seconds, doubled on every retry
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,

    /// User-Agent header for HTTP requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Accept header for HTTP requests
    #[serde(default)]
    pub accept: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            retries: defaults::retries(),
            backoff_factor: defaults::backoff_factor(),
            user_agent: None,
            accept: None,
        }
    }
}

impl HttpOptions {
    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        self.timeout.get_or_insert(secs);
        self
    }

    pub fn with_default_accept(mut self, accept: &str) -> Self {
        self.accept.get_or_insert_with(|| accept.to_string());
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.unwrap_or_else(defaults::timeout)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(defaults::USER_AGENT)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout == Some(0) {
            return Err(AppError::config("options.timeout must be > 0"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(AppError::config("options.backoff_factor must be >= 0"));
        }
        Ok(())
    }
}

mod defaults {
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

    pub fn interval() -> u64 {
        3600
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn retries() -> u32 {
        2
    }
    pub fn backoff_factor() -> f64 {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[update]
interval_secs = 600

[[jobs]]
type = "site_crawl"
name = "MiniMax News"
output = "minimax_blog.xml"
site_url = "https://www.minimax.io"

[jobs.options]
max_items = 10
retries = 4

[[jobs]]
type = "selector_scrape"
enabled = false
url = "https://example.com"
"#;

    #[test]
    fn test_parse_jobs() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.update.interval_secs, 600);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.enabled_jobs().count(), 1);

        let job = &config.jobs[0];
        assert_eq!(job.job_type.as_deref(), Some("site_crawl"));
        assert_eq!(
            job.settings.get("site_url").and_then(|v| v.as_str()),
            Some("https://www.minimax.io")
        );
        assert!(!job.settings.contains_key("options"));
        assert!(!job.settings.contains_key("name"));
    }

    #[test]
    fn test_missing_type_still_parses() {
        let config = Config::parse("[[jobs]]\nname = \"orphan\"\n").unwrap();
        assert!(config.jobs[0].job_type.is_none());
        assert_eq!(config.jobs[0].display_name(), "orphan");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut job = JobConfig::default();
        assert_eq!(job.display_name(), "unnamed");
        job.job_type = Some("rss_filter".to_string());
        assert_eq!(job.display_name(), "rss_filter");
        job.name = Some("OpenAI Research".to_string());
        assert_eq!(job.display_name(), "OpenAI Research");
    }

    #[test]
    fn test_http_options_flattened_defaults() {
        let config = Config::parse(SAMPLE).unwrap();
        let http: HttpOptions = config.jobs[0].options().unwrap();
        assert_eq!(http.retries, 4);
        assert_eq!(http.backoff_factor, 0.5);
        assert_eq!(http.clone().with_default_timeout(15).timeout_secs(), 15);
        assert_eq!(http.timeout_secs(), 20);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        assert!(Config::parse("[update]\ninterval_secs = 0\n").is_err());
    }

    #[test]
    fn test_http_options_validate() {
        let mut http = HttpOptions::default();
        assert!(http.validate().is_ok());
        http.timeout = Some(0);
        assert!(http.validate().is_err());
        http.timeout = Some(5);
        http.backoff_factor = -1.0;
        assert!(http.validate().is_err());
    }
}

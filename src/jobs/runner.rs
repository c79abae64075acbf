// src/jobs/runner.rs

//! Sequential job execution with per-job failure isolation.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::FutureExt;

use crate::jobs::JobRegistry;
use crate::models::{JobConfig, JobContext, JobResult};

/// Results of one batch, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<JobResult>,
}

impl RunReport {
    /// Job name to success flag.
    pub fn outcomes(&self) -> HashMap<String, bool> {
        self.results
            .iter()
            .map(|r| (r.name.clone(), r.success))
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True only when at least one job ran and none failed.
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.success)
    }
}

/// Runs configured jobs one at a time.
pub struct JobRunner {
    registry: JobRegistry,
    feeds_dir: PathBuf,
}

impl JobRunner {
    pub fn new(registry: JobRegistry, feeds_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            feeds_dir: feeds_dir.into(),
        }
    }

    /// Run every enabled job. A failing or panicking job is recorded and the
    /// batch moves on.
    pub async fn run(&self, configs: &[JobConfig]) -> RunReport {
        if let Err(e) = tokio::fs::create_dir_all(&self.feeds_dir).await {
            log::error!(
                "Failed to create output directory {}: {e}",
                self.feeds_dir.display()
            );
        }

        let ctx = JobContext::new(&self.feeds_dir);
        let mut report = RunReport::default();

        for config in configs {
            let name = config.display_name();
            if !config.enabled {
                log::info!("Skipping disabled job: {name}");
                continue;
            }

            let job = match self.registry.create(config) {
                Ok(job) => job,
                Err(e) => {
                    log::error!("{name}: invalid configuration: {e}");
                    report.results.push(JobResult::failure(name, e.to_string()));
                    continue;
                }
            };

            log::info!("Running job: {}", job.name());
            let result = match AssertUnwindSafe(job.run(&ctx)).catch_unwind().await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => JobResult::failure(job.name(), e.to_string()),
                Err(panic) => JobResult::failure(
                    job.name(),
                    format!("job panicked: {}", panic_message(&panic)),
                ),
            };

            if result.success {
                log::info!("{}: {}", result.name, result.details);
            } else {
                log::error!("{}: {}", result.name, result.details);
            }
            report.results.push(result);
        }

        if !report.results.is_empty() {
            log::info!(
                "jobs finished: {}/{} succeeded",
                report.success_count(),
                report.total()
            );
        }
        report
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

//! rss-creator CLI
//!
//! Runs every configured feed job once, or on a fixed interval with
//! `--schedule`.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rss_creator::{
    jobs::{JobRegistry, JobRunner, RunReport},
    models::{Config, JobConfig},
};

/// Builds RSS feeds from web pages, JSON APIs and existing feeds
#[derive(Parser, Debug)]
#[command(name = "rss-creator", version, about)]
struct Cli {
    /// Path to the TOML job configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory feed files are written to
    #[arg(short, long, default_value = "feeds")]
    output: PathBuf,

    /// Keep running and rebuild feeds every `update.interval_secs`
    #[arg(short, long)]
    schedule: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run only the job with this name
    #[arg(long, value_name = "NAME")]
    only: Option<String>,

    /// Print the registered job types and exit
    #[arg(long)]
    list_types: bool,
}

const EXIT_JOB_FAILURE: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Jobs selected by `--only`, or all of them.
fn select_jobs(config: &Config, only: Option<&str>) -> Vec<JobConfig> {
    match only {
        Some(name) => config
            .jobs
            .iter()
            .filter(|job| job.display_name() == name)
            .cloned()
            .collect(),
        None => config.jobs.clone(),
    }
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_JOB_FAILURE)
    }
}

/// Run the batch every `interval_secs` until `shutdown` resolves. The
/// shutdown future is polled both while waiting and while a batch runs.
async fn run_scheduled(
    runner: &JobRunner,
    jobs: &[JobConfig],
    interval_secs: u64,
    shutdown: impl Future<Output = ()>,
) -> ExitCode {
    log::info!("Scheduled mode: every {interval_secs}s, Ctrl-C to stop");
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }

        tokio::select! {
            report = runner.run(jobs) => {
                if !report.all_succeeded() {
                    log::warn!(
                        "Batch finished with failures ({}/{} succeeded)",
                        report.success_count(),
                        report.total()
                    );
                }
            }
            _ = &mut shutdown => {
                log::warn!("Interrupted while a batch was running");
                break;
            }
        }
    }

    log::info!("Interrupted, shutting down");
    ExitCode::SUCCESS
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = JobRegistry::builtin();
    if cli.list_types {
        for job_type in registry.job_types() {
            println!("{job_type}");
        }
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {e}", cli.config.display());
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    log::info!(
        "Loaded {} jobs ({} enabled) from {}",
        config.jobs.len(),
        config.enabled_jobs().count(),
        cli.config.display()
    );

    let jobs = select_jobs(&config, cli.only.as_deref());
    if jobs.is_empty() {
        match &cli.only {
            Some(name) => log::error!("No job named '{name}'"),
            None => log::error!("No jobs configured"),
        }
        return ExitCode::from(EXIT_JOB_FAILURE);
    }

    let runner = JobRunner::new(registry, &cli.output);

    if cli.schedule || config.update.enabled {
        return run_scheduled(&runner, &jobs, config.update.interval_secs, ctrl_c()).await;
    }

    let report = runner.run(&jobs).await;
    exit_code(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rss_creator::error::Result;
    use rss_creator::jobs::Job;
    use rss_creator::models::{JobContext, JobResult};
    use tempfile::TempDir;

    struct SlowJob;

    #[async_trait]
    impl Job for SlowJob {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self, _ctx: &JobContext) -> Result<JobResult> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(JobResult::success("slow", "done"))
        }
    }

    fn slow_job(_config: &JobConfig) -> Result<Box<dyn Job>> {
        Ok(Box::new(SlowJob))
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_batch() {
        let mut registry = JobRegistry::default();
        registry.register("slow", slow_job);
        let dir = TempDir::new().unwrap();
        let runner = JobRunner::new(registry, dir.path());
        let config = Config::parse("[[jobs]]\ntype = \"slow\"\n").unwrap();

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            run_scheduled(&runner, &config.jobs, 3600, shutdown),
        )
        .await;
        assert!(stopped.is_ok(), "scheduler kept running after shutdown");
    }

    #[test]
    fn test_select_jobs_by_name() {
        let config = Config::parse(
            "[[jobs]]\ntype = \"a\"\nname = \"One\"\n[[jobs]]\ntype = \"b\"\nname = \"Two\"\n",
        )
        .unwrap();
        assert_eq!(select_jobs(&config, Some("Two")).len(), 1);
        assert!(select_jobs(&config, Some("Three")).is_empty());
        assert_eq!(select_jobs(&config, None).len(), 2);
    }
}

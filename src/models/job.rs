//! Job execution records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything a job may touch outside its own configuration.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Directory all feed files are written beneath
    pub feeds_dir: PathBuf,
}

impl JobContext {
    pub fn new(feeds_dir: impl Into<PathBuf>) -> Self {
        Self {
            feeds_dir: feeds_dir.into(),
        }
    }
}

/// Outcome of one job execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobResult {
    pub name: String,
    pub success: bool,
    /// Output location on success, failure reason otherwise
    pub details: String,
}

impl JobResult {
    pub fn success(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            details: details.into(),
        }
    }

    pub fn failure(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            details: details.into(),
        }
    }
}

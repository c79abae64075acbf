// src/models/mod.rs

//! Domain models for the feed builder.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod discovery;
mod feed;
mod job;
mod selectors;

// Re-export all public types
pub use config::{Config, HttpOptions, JobConfig, UpdateConfig};
pub use discovery::{CandidateUrl, DiscoveryReport};
pub use feed::{ChannelMeta, FeedItem};
pub use job::{JobContext, JobResult};
pub use selectors::ItemSelectors;

// src/lib.rs

//! RSS Creator Library
//!
//! Config-driven jobs that turn web pages, JSON APIs and existing feeds into
//! normalized RSS 2.0 files.

pub mod error;
pub mod jobs;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

//! Feed production pipeline.
//!
//! - `crawl`: discovery plus extraction for whole-site jobs
//! - `assemble`: validation, dedup, capping and ordering of items
//! - `render`: RSS 2.0 serialization

pub mod assemble;
pub mod crawl;
pub mod render;

pub use assemble::{CollectionOrder, FeedAssembler, MissingDatePolicy, RenderEntry};
pub use crawl::{CrawlOutcome, CrawlPipeline};
pub use render::{EmissionOrder, FeedRenderer, RssRenderer};

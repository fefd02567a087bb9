//! Multi-platform feed aggregation with a time-boxed persistent cache.
//!
//! Platform adapters normalize external posts into the unified `Post` model;
//! the aggregator fans out to all configured adapters concurrently, tolerates
//! individual platform failure, and serves from the persistent snapshot store
//! whenever it is still fresh.

pub mod adapter;
pub mod aggregator;
pub mod error;
pub mod facebook;
pub mod instagram;
pub mod policy;

pub use adapter::PlatformAdapter;
pub use aggregator::FeedAggregator;
pub use error::PlatformError;
pub use policy::{CacheStats, CacheStatus};

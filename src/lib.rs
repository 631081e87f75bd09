// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod query;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::error::AggregateError;
pub use crate::geo::{cluster_by_location, geo_stats, GeoStats, GeoTagger};
pub use crate::ingest::types::{Coordinates, DetectedLocation, FeedSource, NewsItem, RawFeedItem};
pub use crate::ingest::{Aggregator, UndatedPolicy};
pub use crate::query::{search, sort_items, SortOrder};

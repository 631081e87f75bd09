//! Errors surfaced to consumers of an aggregation pass.

use thiserror::Error;

/// Aggregation-level exhaustion. Single-feed failures never show up here;
/// they are logged and collapse to "no items" for that feed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// Nothing to aggregate: the active source set is empty.
    #[error("no news sources configured")]
    NoSources,

    /// Every active source came back empty.
    #[error("no content available from {sources} source(s) ({} failed)", .failed.len())]
    NoContent {
        /// Number of active sources in the pass.
        sources: usize,
        /// Source ids with at least one failed feed URL.
        failed: Vec<String>,
    },
}

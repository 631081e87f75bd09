// src/ingest/mod.rs
pub mod fetcher;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod transport;
pub mod types;
pub mod xml;

use indexmap::IndexMap;
use metrics::{counter, gauge};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::AggregateError;
use crate::geo::GeoTagger;
use crate::ingest::fetcher::FeedFetcher;
use crate::ingest::types::{FeedSource, NewsItem, RawFeedItem};
use crate::telemetry::ensure_metrics_described;

/// Length of the normalized-title prefix used for duplicate detection.
pub const DEDUP_KEY_LEN: usize = 50;

/// Sanitize feed text: strip tags, decode entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip HTML tags
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
    let out = RE_TAGS.replace_all(s, "");

    // 2) HTML entity decode
    let out = html_escape::decode_html_entities(&out);

    // 3) Collapse whitespace (\s is Unicode-aware, covers NBSP)
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Title identity for dedup: lowercase, alphanumerics only, first 50 chars.
pub fn dedup_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(DEDUP_KEY_LEN)
        .collect()
}

/// Placement of items whose date was stamped at parse time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPolicy {
    /// After every dated item, keeping arrival order among themselves.
    #[default]
    Last,
    /// Use the stamped parse time, i.e. sort as the newest items.
    Now,
}

/// Stable newest-first sort; equal keys keep arrival order.
pub fn sort_newest_first(items: &mut [NewsItem], undated: UndatedPolicy) {
    match undated {
        UndatedPolicy::Now => items.sort_by_key(|n| Reverse(n.item.pub_date)),
        UndatedPolicy::Last => {
            items.sort_by_key(|n| (n.item.date_inferred, Reverse(n.item.pub_date)))
        }
    }
}

/// Drop later items whose dedup key or content id was already seen.
/// Titles without alphanumerics all share the empty key. Returns the number
/// removed.
pub fn dedup_in_place(items: &mut Vec<NewsItem>) -> usize {
    let before = items.len();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    items.retain(|n| {
        let fresh_id = seen_ids.insert(n.item.id.clone());
        let fresh_key = seen_keys.insert(dedup_key(&n.item.title));
        fresh_id && fresh_key
    });
    before - items.len()
}

/// Merge per-feed batches (in arrival order), sort, dedup. Pure; no geo tagging.
pub fn merge_sort_dedup(
    batches: Vec<(FeedSource, Vec<RawFeedItem>)>,
    undated: UndatedPolicy,
) -> (Vec<NewsItem>, usize) {
    let mut merged: Vec<NewsItem> = batches
        .into_iter()
        .flat_map(|(src, items)| {
            items
                .into_iter()
                .map(move |it| NewsItem::from_raw(it, &src))
        })
        .collect();
    sort_newest_first(&mut merged, undated);
    let removed = dedup_in_place(&mut merged);
    (merged, removed)
}

/// Fan-out fetch + parse over every (source, url) pair, then merge, sort,
/// dedup and geo-tag.
pub struct Aggregator {
    fetcher: Arc<FeedFetcher>,
    tagger: GeoTagger,
    undated: UndatedPolicy,
}

impl Aggregator {
    pub fn new(fetcher: Arc<FeedFetcher>, undated: UndatedPolicy) -> Self {
        Self {
            fetcher,
            tagger: GeoTagger::new(),
            undated,
        }
    }

    pub fn fetcher(&self) -> &Arc<FeedFetcher> {
        &self.fetcher
    }

    /// One aggregation pass. Each feed runs as its own task; a failed or
    /// panicking feed only removes its own items. Returns
    /// [`AggregateError`] only when the pass as a whole has nothing to show.
    pub async fn aggregate(
        &self,
        sources: &IndexMap<String, FeedSource>,
    ) -> Result<Vec<NewsItem>, AggregateError> {
        ensure_metrics_described();

        if sources.is_empty() {
            counter!("ingest_empty_runs_total").increment(1);
            tracing::warn!(target: "ingest", "aggregate called with no sources");
            return Err(AggregateError::NoSources);
        }

        let mut tasks = Vec::new();
        for source in sources.values() {
            for url in &source.urls {
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                let direct = source.direct;
                let handle = tokio::spawn(async move { fetcher.try_fetch(&url, direct).await });
                tasks.push((source.clone(), handle));
            }
        }

        let (sources_meta, handles): (Vec<FeedSource>, Vec<_>) = tasks.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut failed: Vec<String> = Vec::new();
        let mut batches = Vec::with_capacity(results.len());
        for (source, joined) in sources_meta.into_iter().zip(results) {
            let items = match joined {
                Ok(Ok(items)) => items,
                Ok(Err(e)) => {
                    tracing::warn!(target: "ingest", source = %source.id, error = %e, "source feed failed");
                    counter!("ingest_source_failures_total").increment(1);
                    if !failed.contains(&source.id) {
                        failed.push(source.id.clone());
                    }
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", source = %source.id, error = %e, "fetch task aborted");
                    counter!("ingest_source_failures_total").increment(1);
                    if !failed.contains(&source.id) {
                        failed.push(source.id.clone());
                    }
                    Vec::new()
                }
            };
            batches.push((source, items));
        }

        if !failed.is_empty() {
            tracing::warn!(target: "ingest", failed = ?failed, "some sources failed this pass");
        }

        let (mut items, removed) = merge_sort_dedup(batches, self.undated);
        counter!("ingest_dedup_total").increment(removed as u64);
        gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        if items.is_empty() {
            counter!("ingest_empty_runs_total").increment(1);
            tracing::warn!(target: "ingest", sources = sources.len(), failed = failed.len(), "aggregation produced no content");
            return Err(AggregateError::NoContent {
                sources: sources.len(),
                failed,
            });
        }

        self.tagger.tag(&mut items);
        tracing::info!(target: "ingest", items = items.len(), dedup = removed, sources = sources.len(), "aggregation pass done");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn normalize_text_strips_decodes_and_collapses() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>\n\t ";
        assert_eq!(normalize_text(s), "Hello, world!");
        assert_eq!(normalize_text("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn dedup_key_lowercases_strips_and_truncates() {
        assert_eq!(dedup_key("Breaking: U.S. Talks!"), "breakingustalks");
        assert_eq!(dedup_key(&"ab-".repeat(40)).chars().count(), DEDUP_KEY_LEN);
        assert_eq!(dedup_key("?!"), "");
    }

    #[test]
    fn dedup_key_keeps_accented_letters() {
        assert_eq!(dedup_key("Grève générale"), "grèvegénérale");
        assert_ne!(dedup_key("Grève"), dedup_key("Greve"));
        assert_eq!(dedup_key("Москва: саммит"), "москвасаммит");
    }

    fn raw(id: &str, title: &str) -> RawFeedItem {
        RawFeedItem {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            link: String::new(),
            pub_date: Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap(),
            date_inferred: false,
            image: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn punctuation_only_titles_share_one_key() {
        let src = FeedSource::new("a", "A", &["https://a.test/rss"], "#000000");
        let batch = vec![raw("1", "!!!"), raw("2", "???"), raw("3", "Real news")];
        let (items, removed) = merge_sort_dedup(vec![(src, batch)], UndatedPolicy::Last);
        let titles: Vec<&str> = items.iter().map(|n| n.item.title.as_str()).collect();
        assert_eq!(titles, vec!["!!!", "Real news"]);
        assert_eq!(removed, 1);
    }

    #[test]
    fn accented_and_plain_titles_stay_distinct() {
        let src = FeedSource::new("a", "A", &["https://a.test/rss"], "#000000");
        let batch = vec![raw("1", "Grève à Paris"), raw("2", "Greve a Paris")];
        let (items, removed) = merge_sort_dedup(vec![(src, batch)], UndatedPolicy::Last);
        assert_eq!(items.len(), 2);
        assert_eq!(removed, 0);
    }
}

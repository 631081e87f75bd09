// src/query.rs
//! Consumer-side views over an aggregated item list.

use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ingest::types::NewsItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    /// By source display name, case-insensitive.
    Source,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date-desc" | "newest" => Ok(Self::DateDesc),
            "date-asc" | "oldest" => Ok(Self::DateAsc),
            "source" => Ok(Self::Source),
            other => bail!("unknown sort order `{other}` (expected date-desc, date-asc or source)"),
        }
    }
}

/// Stable sort; ties keep their current order.
pub fn sort_items(items: &mut [NewsItem], order: SortOrder) {
    match order {
        SortOrder::DateDesc => items.sort_by(|a, b| b.item.pub_date.cmp(&a.item.pub_date)),
        SortOrder::DateAsc => items.sort_by_key(|n| n.item.pub_date),
        SortOrder::Source => items.sort_by_cached_key(|n| n.source_name.to_lowercase()),
    }
}

/// Items whose title or description contains `query`, ignoring case.
/// A blank query matches everything.
pub fn search<'a>(items: &'a [NewsItem], query: &str) -> Vec<&'a NewsItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|n| {
            n.item.title.to_lowercase().contains(&needle)
                || n.item.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Items from the listed source ids only.
pub fn filter_by_sources<'a>(items: &'a [NewsItem], ids: &[String]) -> Vec<&'a NewsItem> {
    items
        .iter()
        .filter(|n| ids.iter().any(|id| *id == n.source))
        .collect()
}

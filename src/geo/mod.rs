// src/geo/mod.rs
//! Text-based geo tagging: gazetteer place counts, first-match region, stats.
//!
//! Everything here is pure and deterministic given the static tables in
//! [`gazetteer`]; safe to call from any thread.

pub mod cluster;
pub mod gazetteer;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::geo::gazetteer::{Place, PLACES, REGIONS};
use crate::ingest::types::{DetectedLocation, NewsItem};

pub use cluster::{cluster_by_location, haversine_km, Cluster, Locatable};

struct CompiledPlace {
    place: &'static Place,
    re: Regex,
}

/// One whole-word, case-insensitive matcher per gazetteer entry.
static PLACE_MATCHERS: Lazy<Vec<CompiledPlace>> = Lazy::new(|| {
    PLACES
        .iter()
        .filter_map(|p| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(p.name));
            match Regex::new(&pattern) {
                Ok(re) => Some(CompiledPlace { place: p, re }),
                Err(e) => {
                    tracing::warn!(target: "geo", place = p.name, error = %e, "place pattern rejected");
                    None
                }
            }
        })
        .collect()
});

/// Gazetteer places mentioned in `text`, most frequent first, gazetteer
/// order on ties.
pub fn detect_locations(text: &str) -> Vec<DetectedLocation> {
    let mut found: Vec<DetectedLocation> = PLACE_MATCHERS
        .iter()
        .filter_map(|cp| {
            let count = cp.re.find_iter(text).count();
            (count > 0).then(|| DetectedLocation {
                name: cp.place.name.to_string(),
                coords: cp.place.coords,
                count,
            })
        })
        .collect();

    // stable: ties keep gazetteer order
    found.sort_by(|a, b| b.count.cmp(&a.count));

    let mut seen = HashSet::new();
    found.retain(|l| seen.insert(l.name.clone()));
    found
}

/// First region (declaration order) with a keyword contained in `text`.
pub fn detect_region(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    REGIONS
        .iter()
        .find(|r| r.keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
        .map(|r| r.id)
}

/// Most mentioned place of an item, if any.
pub fn main_location(item: &NewsItem) -> Option<DetectedLocation> {
    detect_locations(&item.geo_text()).into_iter().next()
}

#[derive(Debug, Clone, Default)]
pub struct GeoTagger;

impl GeoTagger {
    pub fn new() -> Self {
        Self
    }

    /// Fill `locations`, `primary_location` and `region` on every item.
    pub fn tag(&self, items: &mut [NewsItem]) {
        for item in items.iter_mut() {
            self.tag_one(item);
        }
    }

    pub fn tag_one(&self, item: &mut NewsItem) {
        let text = item.geo_text();
        item.locations = detect_locations(&text);
        item.primary_location = item.locations.first().cloned();
        item.region = detect_region(&text).map(str::to_string);
    }
}

/// Items of one region; `None` means all regions.
pub fn filter_by_region<'a>(items: &'a [NewsItem], region: Option<&str>) -> Vec<&'a NewsItem> {
    match region {
        None | Some("all") => items.iter().collect(),
        Some(id) => items
            .iter()
            .filter(|n| n.region.as_deref() == Some(id))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoStats {
    pub total: usize,
    pub with_location: usize,
    /// Every region id, in declaration order, zero-filled.
    pub by_region: IndexMap<String, usize>,
    /// Primary-location name → count, first-seen order.
    pub by_location: IndexMap<String, usize>,
}

pub fn geo_stats(items: &[NewsItem]) -> GeoStats {
    let mut by_region: IndexMap<String, usize> =
        REGIONS.iter().map(|r| (r.id.to_string(), 0)).collect();
    let mut by_location: IndexMap<String, usize> = IndexMap::new();
    let mut with_location = 0;

    for item in items {
        if let Some(region) = &item.region {
            *by_region.entry(region.clone()).or_insert(0) += 1;
        }
        if let Some(loc) = &item.primary_location {
            with_location += 1;
            *by_location.entry(loc.name.clone()).or_insert(0) += 1;
        }
    }

    GeoStats {
        total: items.len(),
        with_location,
        by_region,
        by_location,
    }
}

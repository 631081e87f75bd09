// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured news source. A source may expose several feed URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub id: String,
    pub name: String,
    pub urls: Vec<String>,
    pub color: String, // e.g. "#FF6B00"
    /// Try a proxy-less request before walking the proxy list.
    #[serde(default)]
    pub direct: bool,
}

impl FeedSource {
    pub fn new(id: &str, name: &str, urls: &[&str], color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
            color: color.to_string(),
            direct: false,
        }
    }

    pub fn with_direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }
}

/// Normalized entry produced by the feed parser, dialect-independent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawFeedItem {
    /// Content-derived id, see [`content_id`].
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    /// True when the feed had no usable date and `pub_date` was stamped at parse time.
    #[serde(default)]
    pub date_inferred: bool,
    pub image: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A gazetteer place found in an item's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedLocation {
    pub name: String,
    pub coords: Coordinates,
    pub count: usize,
}

/// Aggregated item: parsed fields + source stamp + geo enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    #[serde(flatten)]
    pub item: RawFeedItem,
    pub source: String,
    pub source_name: String,
    pub source_color: String,
    /// Ordered by occurrence count (desc), first-seen on ties.
    #[serde(default)]
    pub locations: Vec<DetectedLocation>,
    /// Always `locations.first()`; set together with `locations` by the geo tagger.
    pub primary_location: Option<DetectedLocation>,
    pub region: Option<String>,
}

impl NewsItem {
    /// Stamp a parsed item with its source. Geo fields start empty.
    pub fn from_raw(item: RawFeedItem, source: &FeedSource) -> Self {
        Self {
            item,
            source: source.id.clone(),
            source_name: source.name.clone(),
            source_color: source.color.clone(),
            locations: Vec::new(),
            primary_location: None,
            region: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }

    pub fn description(&self) -> &str {
        &self.item.description
    }

    pub fn pub_date(&self) -> DateTime<Utc> {
        self.item.pub_date
    }

    /// Text scanned for places and regions.
    pub fn geo_text(&self) -> String {
        format!("{} {}", self.item.title, self.item.description)
    }
}

/// Deterministic id from (link, title): first 6 bytes of SHA-256, hex.
pub fn content_id(link: &str, title: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

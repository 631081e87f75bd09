// src/ingest/registry.rs
//! Source set for aggregation passes: built-in sources from config plus
//! user-added feeds, which can be persisted to a JSON file.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ingest::types::FeedSource;

/// Persisted shape of a user-added feed (one URL per feed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomFeed {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_custom_color")]
    pub color: String,
}

fn default_custom_color() -> String {
    "#6C757D".to_string()
}

impl From<&CustomFeed> for FeedSource {
    fn from(c: &CustomFeed) -> Self {
        FeedSource {
            id: c.id.clone(),
            name: c.name.clone(),
            urls: vec![c.url.clone()],
            color: c.color.clone(),
            direct: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    builtin: IndexMap<String, FeedSource>,
    custom: IndexMap<String, CustomFeed>,
}

impl SourceRegistry {
    pub fn new(builtin: IndexMap<String, FeedSource>) -> Self {
        Self {
            builtin,
            custom: IndexMap::new(),
        }
    }

    /// Add (or replace) a user feed. Built-in ids cannot be shadowed.
    pub fn add_custom(&mut self, id: &str, name: &str, url: &str, color: &str) -> Result<()> {
        let id = id.trim();
        let url = url.trim();
        if id.is_empty() {
            bail!("custom feed id must not be empty");
        }
        if url.is_empty() {
            bail!("custom feed `{id}` has no url");
        }
        if self.builtin.contains_key(id) {
            bail!("custom feed id `{id}` collides with a built-in source");
        }
        let name = match name.trim() {
            "" => id,
            n => n,
        };
        let color = match color.trim() {
            "" => default_custom_color(),
            c => c.to_string(),
        };
        self.custom.insert(
            id.to_string(),
            CustomFeed {
                id: id.to_string(),
                name: name.to_string(),
                url: url.to_string(),
                color,
            },
        );
        tracing::info!(target: "ingest", %id, %url, "custom feed added");
        Ok(())
    }

    /// Remove a user feed. Built-in sources are never removed; returns whether
    /// anything changed.
    pub fn remove_custom(&mut self, id: &str) -> bool {
        let removed = self.custom.shift_remove(id).is_some();
        if removed {
            tracing::info!(target: "ingest", %id, "custom feed removed");
        }
        removed
    }

    pub fn custom_feeds(&self) -> impl Iterator<Item = &CustomFeed> {
        self.custom.values()
    }

    pub fn builtin(&self) -> &IndexMap<String, FeedSource> {
        &self.builtin
    }

    /// Built-ins then user feeds, in declaration/insertion order.
    pub fn active_sources(&self) -> IndexMap<String, FeedSource> {
        let mut out = self.builtin.clone();
        for c in self.custom.values() {
            out.insert(c.id.clone(), FeedSource::from(c));
        }
        out
    }

    /// Only the listed ids (unknown ids ignored), still in registry order.
    pub fn select(&self, ids: &[String]) -> IndexMap<String, FeedSource> {
        self.active_sources()
            .into_iter()
            .filter(|(id, _)| ids.iter().any(|want| want == id))
            .collect()
    }

    /// Merge user feeds from a JSON array file. Missing file is not an error.
    /// Returns the number of feeds accepted.
    pub fn load_custom_from(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading custom feeds from {}", path.display()))?;
        let feeds: Vec<CustomFeed> = serde_json::from_str(&content)
            .with_context(|| format!("parsing custom feeds in {}", path.display()))?;

        let mut accepted = 0usize;
        for f in feeds {
            match self.add_custom(&f.id, &f.name, &f.url, &f.color) {
                Ok(()) => accepted += 1,
                Err(e) => tracing::warn!(target: "ingest", error = %e, "skipping custom feed"),
            }
        }
        Ok(accepted)
    }

    pub fn save_custom_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let feeds: Vec<&CustomFeed> = self.custom.values().collect();
        let json = serde_json::to_string_pretty(&feeds)?;
        fs::write(path, json).with_context(|| format!("writing custom feeds to {}", path.display()))
    }
}

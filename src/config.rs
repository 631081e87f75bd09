// src/config.rs
//! Application config: sources, proxies, cache/timeout knobs.
//!
//! Resolution order:
//! 1) explicit path passed to [`AppConfig::load_from`]
//! 2) `$NEWSMAP_CONFIG_PATH`
//! 3) `config/newsmap.toml`, then `config/newsmap.json`
//! 4) built-in [`AppConfig::default_seed`]
//!
//! Values are sanitized after loading: blank URLs and proxies are dropped,
//! zero durations fall back to defaults, the start proxy index wraps.

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::fetcher::{FeedFetcher, FetchContext};
use crate::ingest::registry::SourceRegistry;
use crate::ingest::transport::{FeedTransport, HttpTransport};
use crate::ingest::types::FeedSource;
use crate::ingest::{Aggregator, UndatedPolicy};

pub const ENV_CONFIG_PATH: &str = "NEWSMAP_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/newsmap.toml";
pub const DEFAULT_JSON_PATH: &str = "config/newsmap.json";

fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_user_agent() -> String {
    concat!("newsmap/", env!("CARGO_PKG_VERSION")).to_string()
}

/// One source as written in config (the id is the map key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCfg {
    pub name: String,
    pub urls: Vec<String>,
    pub color: String,
    #[serde(default)]
    pub direct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sources: IndexMap<String, SourceCfg>,
    /// URL prefixes; the percent-encoded feed URL is appended.
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub start_proxy_index: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub undated: UndatedPolicy,
    /// JSON file with user-added feeds; none means in-memory only.
    #[serde(default)]
    pub custom_feeds_path: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl AppConfig {
    /// Load from an explicit path (`.toml` or `.json`, sniffed if no extension).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = Self::parse(&content, &ext)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Env var, then the default file locations, then the built-in seed.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default_seed())
    }

    fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        match hint_ext {
            "toml" => Ok(toml::from_str(s)?),
            "json" => Ok(serde_json::from_str(s)?),
            _ => {
                if let Ok(v) = serde_json::from_str(s) {
                    return Ok(v);
                }
                toml::from_str(s).map_err(|e| anyhow!("unsupported config format: {e}"))
            }
        }
    }

    fn sanitized(mut self) -> Self {
        for src in self.sources.values_mut() {
            src.urls = src
                .urls
                .iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
        }
        self.sources.retain(|id, src| {
            let keep = !id.trim().is_empty() && !src.urls.is_empty();
            if !keep {
                tracing::warn!(source = %id, "dropping source without urls");
            }
            keep
        });

        self.proxies = self
            .proxies
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self.start_proxy_index = match self.proxies.len() {
            0 => 0,
            n => self.start_proxy_index % n,
        };

        if self.cache_ttl_secs == 0 {
            self.cache_ttl_secs = default_cache_ttl_secs();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = default_refresh_interval_secs();
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Config sources keyed by id, in declaration order.
    pub fn feed_sources(&self) -> IndexMap<String, FeedSource> {
        self.sources
            .iter()
            .map(|(id, s)| {
                (
                    id.clone(),
                    FeedSource {
                        id: id.clone(),
                        name: s.name.clone(),
                        urls: s.urls.clone(),
                        color: s.color.clone(),
                        direct: s.direct,
                    },
                )
            })
            .collect()
    }

    /// Wire the HTTP transport, shared fetch context and aggregator.
    pub fn build_aggregator(&self) -> Aggregator {
        let transport: Arc<dyn FeedTransport> =
            Arc::new(HttpTransport::new(self.fetch_timeout(), &self.user_agent));
        let ctx = Arc::new(FetchContext::new(self.cache_ttl(), self.start_proxy_index));
        let fetcher = FeedFetcher::new(transport, self.proxies.clone(), ctx);
        Aggregator::new(Arc::new(fetcher), self.undated)
    }

    /// Built-in sources plus the persisted custom feeds, if configured.
    pub fn build_registry(&self) -> Result<SourceRegistry> {
        let mut registry = SourceRegistry::new(self.feed_sources());
        if let Some(path) = &self.custom_feeds_path {
            let n = registry.load_custom_from(path)?;
            tracing::info!(count = n, path = %path.display(), "custom feeds loaded");
        }
        Ok(registry)
    }

    /// Built-in international wire/newspaper feeds and two public relays.
    pub fn default_seed() -> Self {
        let mut sources = IndexMap::new();
        for (id, name, urls, color) in [
            (
                "reuters",
                "Reuters",
                &["https://www.reutersagency.com/feed/", "https://www.reuters.com/rssfeed/worldNews"][..],
                "#FF6B00",
            ),
            ("afp", "AFP", &["https://www.afp.com/en/news/feed"][..], "#E63946"),
            ("tass", "TASS", &["https://tass.com/rss/v2.xml"][..], "#457B9D"),
            (
                "politico",
                "Politico",
                &[
                    "https://www.politico.com/rss/politicopicks.xml",
                    "https://www.politico.com/rss/congress.xml",
                ][..],
                "#DC143C",
            ),
            (
                "lemonde",
                "Le Monde",
                &[
                    "https://www.lemonde.fr/rss/une.xml",
                    "https://www.lemonde.fr/international/rss_full.xml",
                ][..],
                "#003D5C",
            ),
            (
                "guardian",
                "The Guardian",
                &[
                    "https://www.theguardian.com/world/rss",
                    "https://www.theguardian.com/international/rss",
                ][..],
                "#052962",
            ),
            ("telegraph", "The Telegraph", &["https://www.telegraph.co.uk/rss.xml"][..], "#004A77"),
            ("aljazeera", "Al Jazeera", &["https://www.aljazeera.com/xml/rss/all.xml"][..], "#F39200"),
        ] {
            sources.insert(
                id.to_string(),
                SourceCfg {
                    name: name.to_string(),
                    urls: urls.iter().map(|u| u.to_string()).collect(),
                    color: color.to_string(),
                    direct: false,
                },
            );
        }

        Self {
            sources,
            proxies: vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://corsproxy.io/?url=".to_string(),
            ],
            start_proxy_index: 0,
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            undated: UndatedPolicy::default(),
            custom_feeds_path: None,
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_eight_sources_in_order() {
        let cfg = AppConfig::default_seed();
        let ids: Vec<&str> = cfg.sources.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec!["reuters", "afp", "tass", "politico", "lemonde", "guardian", "telegraph", "aljazeera"]
        );
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn sanitize_trims_and_wraps() {
        let toml = r##"
proxies = [" https://p1.test/?u= ", "", "https://p2.test/?u="]
start_proxy_index = 5
cache_ttl_secs = 0

[sources.a]
name = "A"
urls = [" https://a.test/rss ", ""]
color = "#111111"

[sources.empty]
name = "Nothing"
urls = ["  "]
color = "#222222"
"##;
        let cfg = AppConfig::parse(toml, "toml").unwrap().sanitized();
        assert_eq!(cfg.proxies, vec!["https://p1.test/?u=", "https://p2.test/?u="]);
        assert_eq!(cfg.start_proxy_index, 1);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources["a"].urls, vec!["https://a.test/rss"]);
        assert_eq!(cfg.undated, UndatedPolicy::Last);
    }
}

// src/ingest/fetcher.rs
//! Feed retrieval: TTL cache → optional direct request → proxy rotation.
//!
//! The cache map and the "last good proxy" pointer live in a [`FetchContext`]
//! shared by every fetch task of every pass. Both sit behind their own mutex;
//! locks are never held across an `.await`. Concurrent passes race benignly:
//! the last completed fetch of a URL wins the cache slot, and the proxy
//! pointer is only a starting hint (soft affinity).

use anyhow::{anyhow, Result};
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::ingest::parser;
use crate::ingest::transport::FeedTransport;
use crate::ingest::types::RawFeedItem;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    items: Vec<RawFeedItem>,
    fetched_at: Instant,
}

/// Shared mutable state of the fetch layer.
#[derive(Debug)]
pub struct FetchContext {
    cache: Mutex<HashMap<String, CacheEntry>>,
    proxy_index: Mutex<usize>,
    ttl: Duration,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poison) => poison.into_inner(),
    }
}

impl FetchContext {
    pub fn new(ttl: Duration, start_proxy_index: usize) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            proxy_index: Mutex::new(start_proxy_index),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached items for `url` if younger than the TTL.
    pub fn cached(&self, url: &str) -> Option<Vec<RawFeedItem>> {
        let cache = lock(&self.cache);
        cache
            .get(url)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.items.clone())
    }

    pub fn store(&self, url: &str, items: Vec<RawFeedItem>) {
        lock(&self.cache).insert(
            url.to_string(),
            CacheEntry {
                items,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    pub fn cached_urls(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn current_proxy_index(&self) -> usize {
        *lock(&self.proxy_index)
    }

    fn set_proxy_index(&self, idx: usize) {
        *lock(&self.proxy_index) = idx;
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, 0)
    }
}

/// `proxy + percent-encoded target`, e.g. `https://relay.test/raw?url=https%3A%2F%2F...`.
pub fn proxied_url(proxy: &str, target: &str) -> String {
    format!("{}{}", proxy, urlencoding::encode(target))
}

pub struct FeedFetcher {
    transport: Arc<dyn FeedTransport>,
    proxies: Vec<String>,
    ctx: Arc<FetchContext>,
}

impl FeedFetcher {
    pub fn new(transport: Arc<dyn FeedTransport>, proxies: Vec<String>, ctx: Arc<FetchContext>) -> Self {
        Self {
            transport,
            proxies,
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<FetchContext> {
        &self.ctx
    }

    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    /// Never fails: every error path degrades to an empty list plus a log event.
    pub async fn fetch(&self, url: &str, direct_allowed: bool) -> Vec<RawFeedItem> {
        match self.try_fetch(url, direct_allowed).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(target: "ingest", %url, error = %e, "feed unavailable");
                Vec::new()
            }
        }
    }

    /// Same policy as [`fetch`](Self::fetch) but reports exhaustion as `Err`.
    pub async fn try_fetch(&self, url: &str, direct_allowed: bool) -> Result<Vec<RawFeedItem>> {
        if let Some(items) = self.ctx.cached(url) {
            counter!("ingest_cache_hits_total").increment(1);
            tracing::debug!(target: "ingest", %url, items = items.len(), "cache hit");
            return Ok(items);
        }

        if direct_allowed {
            counter!("ingest_fetch_attempts_total").increment(1);
            match self.get_and_parse(url).await {
                Ok(items) => {
                    tracing::debug!(target: "ingest", %url, items = items.len(), "direct fetch ok");
                    self.ctx.store(url, items.clone());
                    return Ok(items);
                }
                Err(e) => {
                    tracing::debug!(target: "ingest", %url, error = %e, "direct fetch failed; trying proxies");
                }
            }
        }

        let n = self.proxies.len();
        if n == 0 {
            return Err(anyhow!("no proxies configured and direct access failed or disabled"));
        }

        let start = self.ctx.current_proxy_index() % n;
        for step in 0..n {
            let idx = (start + step) % n;
            let target = proxied_url(&self.proxies[idx], url);
            counter!("ingest_fetch_attempts_total").increment(1);
            match self.get_and_parse(&target).await {
                Ok(items) => {
                    tracing::debug!(target: "ingest", %url, proxy_index = idx, items = items.len(), "proxy fetch ok");
                    self.ctx.store(url, items.clone());
                    self.ctx.set_proxy_index(idx);
                    return Ok(items);
                }
                Err(e) => {
                    counter!("ingest_proxy_failures_total").increment(1);
                    tracing::warn!(target: "ingest", %url, proxy_index = idx, error = %e, "proxy attempt failed");
                }
            }
        }

        Err(anyhow!("all {n} proxies failed"))
    }

    /// A response that is not a well-formed feed counts as a failed attempt,
    /// so relay error pages move on to the next proxy.
    async fn get_and_parse(&self, url: &str) -> Result<Vec<RawFeedItem>> {
        let body = self.transport.get_text(url).await?;
        parser::try_parse(&body)
    }
}

// tests/ingest_fetch.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newsmap::ingest::fetcher::{proxied_url, FeedFetcher, FetchContext};
use newsmap::ingest::transport::FeedTransport;

const RSS: &str = include_str!("fixtures/rss_basic.xml");
const FEED: &str = "https://wire.test/rss";
const OTHER: &str = "https://other.test/rss";

/// Answers only the URLs it was scripted with; everything else is a
/// transport error. Records every request.
#[derive(Default)]
struct ScriptedTransport {
    ok: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.ok.insert(url.to_string(), body.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.ok
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {url}"))
    }
}

fn proxies() -> Vec<String> {
    vec![
        "https://p0.test/raw?url=".to_string(),
        "https://p1.test/?u=".to_string(),
        "https://p2.test/get?src=".to_string(),
    ]
}

fn fetcher(t: &Arc<ScriptedTransport>, start: usize) -> FeedFetcher {
    let ctx = Arc::new(FetchContext::new(Duration::from_secs(300), start));
    FeedFetcher::new(t.clone(), proxies(), ctx)
}

#[tokio::test]
async fn second_proxy_succeeds_and_becomes_the_start_point() {
    let p = proxies();
    let t = Arc::new(
        ScriptedTransport::default()
            .with(&proxied_url(&p[1], FEED), RSS)
            .with(&proxied_url(&p[1], OTHER), RSS),
    );
    let f = fetcher(&t, 0);

    let items = f.fetch(FEED, false).await;
    assert_eq!(items.len(), 3);
    assert_eq!(f.context().current_proxy_index(), 1);
    assert_eq!(
        t.calls(),
        vec![proxied_url(&p[0], FEED), proxied_url(&p[1], FEED)]
    );

    // next uncached URL starts at the remembered proxy
    let items = f.fetch(OTHER, false).await;
    assert_eq!(items.len(), 3);
    assert_eq!(t.calls().last().unwrap(), &proxied_url(&p[1], OTHER));
    assert_eq!(t.calls().len(), 3);
}

#[tokio::test]
async fn rotation_wraps_around_from_the_start_index() {
    let p = proxies();
    let t = Arc::new(ScriptedTransport::default().with(&proxied_url(&p[0], FEED), RSS));
    let f = fetcher(&t, 2);

    assert_eq!(f.fetch(FEED, false).await.len(), 3);
    assert_eq!(
        t.calls(),
        vec![proxied_url(&p[2], FEED), proxied_url(&p[0], FEED)]
    );
    assert_eq!(f.context().current_proxy_index(), 0);
}

#[tokio::test]
async fn fresh_cache_entry_skips_the_network() {
    let p = proxies();
    let t = Arc::new(ScriptedTransport::default().with(&proxied_url(&p[0], FEED), RSS));
    let f = fetcher(&t, 0);

    let first = f.fetch(FEED, false).await;
    let second = f.fetch(FEED, false).await;
    assert_eq!(first, second);
    assert_eq!(t.calls().len(), 1);

    f.context().clear_cache();
    f.fetch(FEED, false).await;
    assert_eq!(t.calls().len(), 2);
}

#[tokio::test]
async fn direct_access_is_tried_before_proxies() {
    let t = Arc::new(ScriptedTransport::default().with(FEED, RSS));
    let f = fetcher(&t, 0);

    assert_eq!(f.fetch(FEED, true).await.len(), 3);
    assert_eq!(t.calls(), vec![FEED.to_string()]);
}

#[tokio::test]
async fn failed_direct_access_falls_back_to_proxies() {
    let p = proxies();
    let t = Arc::new(ScriptedTransport::default().with(&proxied_url(&p[0], FEED), RSS));
    let f = fetcher(&t, 0);

    assert_eq!(f.fetch(FEED, true).await.len(), 3);
    assert_eq!(t.calls(), vec![FEED.to_string(), proxied_url(&p[0], FEED)]);
}

#[tokio::test]
async fn malformed_relay_response_counts_as_a_failed_attempt() {
    let p = proxies();
    let t = Arc::new(
        ScriptedTransport::default()
            .with(&proxied_url(&p[0], FEED), "<html><body>rate limited")
            .with(&proxied_url(&p[1], FEED), RSS),
    );
    let f = fetcher(&t, 0);

    assert_eq!(f.fetch(FEED, false).await.len(), 3);
    assert_eq!(f.context().current_proxy_index(), 1);
}

#[tokio::test]
async fn exhausted_proxies_yield_empty_and_keep_the_index() {
    let t = Arc::new(ScriptedTransport::default());
    let f = fetcher(&t, 2);

    assert!(f.fetch(FEED, true).await.is_empty());
    assert!(f.try_fetch(FEED, false).await.is_err());
    assert_eq!(f.context().current_proxy_index(), 2);
    // direct + 3 proxies, then 3 proxies; failures are not cached
    assert_eq!(t.calls().len(), 7);
    assert_eq!(f.context().cached_urls(), 0);
}

#[tokio::test]
async fn no_proxies_and_no_direct_access_is_empty() {
    let t = Arc::new(ScriptedTransport::default().with(FEED, RSS));
    let f = FeedFetcher::new(t.clone(), Vec::new(), Arc::new(FetchContext::default()));
    assert!(f.fetch(FEED, false).await.is_empty());
    assert!(t.calls().is_empty());
}

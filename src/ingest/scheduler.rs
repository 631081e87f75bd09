// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::AggregateError;
use crate::ingest::registry::SourceRegistry;
use crate::ingest::types::NewsItem;
use crate::ingest::Aggregator;

#[derive(Clone, Copy, Debug)]
pub struct RefreshCfg {
    pub interval_secs: u64,
}

/// Spawn the auto-refresh loop. The first pass runs immediately; each pass
/// snapshots the registry, so sources added or removed in between are picked
/// up on the next tick. A pass still in flight is never cancelled by a later
/// one.
pub fn spawn_refresh<F>(
    cfg: RefreshCfg,
    aggregator: Arc<Aggregator>,
    registry: Arc<RwLock<SourceRegistry>>,
    on_pass: F,
) -> JoinHandle<()>
where
    F: Fn(Result<Vec<NewsItem>, AggregateError>) + Send + Sync + 'static,
{
    let on_pass = Arc::new(on_pass);
    tokio::spawn(async move {
        let period = Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;

            let sources = match registry.read() {
                Ok(r) => r.active_sources(),
                Err(poison) => poison.into_inner().active_sources(),
            };

            let aggregator = Arc::clone(&aggregator);
            let on_pass = Arc::clone(&on_pass);
            tokio::spawn(async move {
                let result = aggregator.aggregate(&sources).await;
                counter!("ingest_runs_total").increment(1);
                tracing::info!(
                    target: "ingest",
                    ok = result.is_ok(),
                    items = result.as_ref().map(|v| v.len()).unwrap_or(0),
                    "refresh tick"
                );
                on_pass(result);
            });
        }
    })
}

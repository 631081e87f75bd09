// src/telemetry.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "newsmap=info,ingest=info,geo=info,warn";

/// One-time metrics registration so series carry descriptions in whatever
/// recorder the host installs.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_fetch_attempts_total",
            "Direct and proxied HTTP attempts."
        );
        describe_counter!(
            "ingest_proxy_failures_total",
            "Proxy attempts that failed (transport or malformed feed)."
        );
        describe_counter!("ingest_cache_hits_total", "Feed fetches served from cache.");
        describe_counter!(
            "ingest_source_failures_total",
            "Feed URLs that exhausted every fetch path in a pass."
        );
        describe_counter!("ingest_items_total", "Items produced by the feed parser.");
        describe_counter!("ingest_dedup_total", "Items removed as duplicates.");
        describe_counter!(
            "ingest_empty_runs_total",
            "Aggregation passes that produced no content."
        );
        describe_counter!("ingest_runs_total", "Auto-refresh passes.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when an aggregation pass last completed."
        );
    });
}

/// Compact human logs, or JSON lines when `json` is set. `RUST_LOG` overrides
/// the default filter. Safe to call twice (second call is a no-op).
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
}

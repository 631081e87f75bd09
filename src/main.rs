//! newsmap: aggregate international RSS/Atom feeds, tag them with places and
//! regions, print the result once or keep refreshing.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use newsmap::config::AppConfig;
use newsmap::geo::{cluster_by_location, filter_by_region, geo_stats, GeoStats};
use newsmap::ingest::registry::SourceRegistry;
use newsmap::ingest::scheduler::{spawn_refresh, RefreshCfg};
use newsmap::query::{search, sort_items, SortOrder};
use newsmap::telemetry;
use newsmap::{Coordinates, NewsItem};

#[derive(Parser, Debug)]
#[command(name = "newsmap")]
#[command(about = "International news aggregator with place and region tagging", long_about = None)]
struct Cli {
    /// Config file (TOML or JSON); defaults to $NEWSMAP_CONFIG_PATH or ./config/
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single aggregation pass (default)
    #[arg(long, conflicts_with = "watch")]
    once: bool,

    /// Keep refreshing every `refresh_interval_secs` until Ctrl-C
    #[arg(long)]
    watch: bool,

    /// Only items of this region id (europe, americas, asia, africa, middle-east, oceania)
    #[arg(short, long)]
    region: Option<String>,

    /// Case-insensitive text filter over title and description
    #[arg(short, long)]
    search: Option<String>,

    /// Comma-separated source ids to aggregate (default: all)
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,

    #[arg(long, default_value = "date-desc")]
    sort: SortOrder,

    /// Print at most N items
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Group located items within KM of each other
    #[arg(long, value_name = "KM", num_args = 0..=1, default_missing_value = "500")]
    clusters: Option<f64>,

    /// Machine-readable output
    #[arg(long)]
    json: bool,

    /// Add a custom feed before the pass, as ID=URL
    #[arg(long, value_name = "ID=URL")]
    add_feed: Vec<String>,

    /// Remove a custom feed before the pass
    #[arg(long, value_name = "ID")]
    remove_feed: Vec<String>,

    /// Log as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

/// Everything that shapes how a finished pass is printed.
#[derive(Debug, Clone)]
struct View {
    region: Option<String>,
    search: Option<String>,
    sort: SortOrder,
    limit: Option<usize>,
    clusters: Option<f64>,
    json: bool,
}

impl From<&Cli> for View {
    fn from(cli: &Cli) -> Self {
        Self {
            region: cli.region.clone(),
            search: cli.search.clone(),
            sort: cli.sort,
            limit: cli.limit,
            clusters: cli.clusters,
            json: cli.json,
        }
    }
}

#[derive(Serialize)]
struct ClusterOut {
    center: Coordinates,
    location: Option<String>,
    count: usize,
    ids: Vec<String>,
}

#[derive(Serialize)]
struct PassOut<'a> {
    stats: GeoStats,
    shown: usize,
    items: Vec<&'a NewsItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusters: Option<Vec<ClusterOut>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json);
    telemetry::ensure_metrics_described();

    let cfg = match &cli.config {
        Some(p) => AppConfig::load_from(p)?,
        None => AppConfig::load_default()?,
    };
    tracing::info!(
        sources = cfg.sources.len(),
        proxies = cfg.proxies.len(),
        ttl_secs = cfg.cache_ttl_secs,
        "config loaded"
    );

    let mut registry = cfg.build_registry()?;
    apply_feed_edits(&cli, &cfg, &mut registry)?;
    if !cli.sources.is_empty() {
        registry = SourceRegistry::new(registry.select(&cli.sources));
    }

    let aggregator = Arc::new(cfg.build_aggregator());
    let view = View::from(&cli);

    if cli.watch && !cli.once {
        let registry = Arc::new(RwLock::new(registry));
        let refresh = RefreshCfg {
            interval_secs: cfg.refresh_interval_secs,
        };
        let handle = spawn_refresh(refresh, aggregator, registry, move |res| match res {
            Ok(mut items) => {
                if let Err(e) = render(&mut items, &view) {
                    tracing::warn!(error = %e, "render failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "refresh pass produced nothing"),
        });
        tracing::info!(interval_secs = refresh.interval_secs, "watching; Ctrl-C to stop");
        tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        handle.abort();
        tracing::info!("shutting down");
        return Ok(());
    }

    let sources = registry.active_sources();
    let mut items = aggregator.aggregate(&sources).await?;
    render(&mut items, &view)
}

fn apply_feed_edits(cli: &Cli, cfg: &AppConfig, registry: &mut SourceRegistry) -> Result<()> {
    if cli.add_feed.is_empty() && cli.remove_feed.is_empty() {
        return Ok(());
    }
    for arg in &cli.add_feed {
        let (id, url) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("--add-feed expects ID=URL, got `{arg}`"))?;
        registry.add_custom(id, id, url, "")?;
    }
    for id in &cli.remove_feed {
        if !registry.remove_custom(id) {
            tracing::warn!(%id, "no custom feed with this id");
        }
    }
    match &cfg.custom_feeds_path {
        Some(path) => registry.save_custom_to(path)?,
        None => tracing::warn!("custom_feeds_path not configured; feed edits last for this run only"),
    }
    Ok(())
}

fn render(items: &mut [NewsItem], view: &View) -> Result<()> {
    sort_items(items, view.sort);
    let stats = geo_stats(items);

    let by_region: Vec<NewsItem> = filter_by_region(items, view.region.as_deref())
        .into_iter()
        .cloned()
        .collect();
    let mut shown = search(&by_region, view.search.as_deref().unwrap_or(""));
    if let Some(n) = view.limit {
        shown.truncate(n);
    }

    let clusters = view.clusters.map(|km| {
        cluster_by_location(&shown, km)
            .into_iter()
            .map(|c| ClusterOut {
                center: c.center,
                location: c.location,
                count: c.members.len(),
                ids: c.members.iter().map(|n| n.item.id.clone()).collect(),
            })
            .collect::<Vec<_>>()
    });

    if view.json {
        let out = PassOut {
            stats,
            shown: shown.len(),
            items: shown,
            clusters,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for n in &shown {
        let place = n
            .primary_location
            .as_ref()
            .map(|l| format!("  @{}", l.name))
            .unwrap_or_default();
        let region = n
            .region
            .as_deref()
            .map(|r| format!(" [{r}]"))
            .unwrap_or_default();
        println!(
            "{}  {:<14} {}{}{}",
            n.item.pub_date.format("%Y-%m-%d %H:%M"),
            n.source_name,
            n.item.title,
            place,
            region
        );
    }

    if let Some(clusters) = clusters {
        println!();
        for c in &clusters {
            println!(
                "cluster {:<16} ({:.2}, {:.2})  {} item(s)",
                c.location.as_deref().unwrap_or("?"),
                c.center.lat,
                c.center.lon,
                c.count
            );
        }
    }

    println!();
    println!(
        "{} shown / {} total, {} located",
        shown.len(),
        stats.total,
        stats.with_location
    );
    let regions: Vec<String> = stats
        .by_region
        .iter()
        .map(|(id, n)| format!("{id}={n}"))
        .collect();
    println!("regions: {}", regions.join(" "));
    Ok(())
}

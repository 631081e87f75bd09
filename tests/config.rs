// tests/config.rs
use newsmap::config::{AppConfig, ENV_CONFIG_PATH};
use newsmap::ingest::registry::SourceRegistry;
use newsmap::UndatedPolicy;
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("newsmap.toml");
    fs::write(
        &p_toml,
        r##"
proxies = ["https://relay.test/raw?url="]
undated = "now"
refresh_interval_secs = 60

[sources.bbc]
name = "BBC"
urls = ["https://bbc.test/world/rss.xml"]
color = "#BB1919"
direct = true
"##,
    )
    .unwrap();
    let cfg = AppConfig::load_from(&p_toml).unwrap();
    assert_eq!(cfg.undated, UndatedPolicy::Now);
    assert_eq!(cfg.refresh_interval_secs, 60);
    assert_eq!(cfg.fetch_timeout_secs, 15);
    let sources = cfg.feed_sources();
    assert_eq!(sources["bbc"].name, "BBC");
    assert!(sources["bbc"].direct);

    let p_json = dir.path().join("newsmap.json");
    fs::write(
        &p_json,
        r##"{"sources": {"x": {"name": "X", "urls": [" https://x.test/rss "], "color": "#000"}},
            "proxies": ["", "https://relay.test/?u="], "start_proxy_index": 3}"##,
    )
    .unwrap();
    let cfg = AppConfig::load_from(&p_json).unwrap();
    assert_eq!(cfg.proxies, vec!["https://relay.test/?u="]);
    assert_eq!(cfg.start_proxy_index, 0);
    assert_eq!(cfg.sources["x"].urls, vec!["https://x.test/rss"]);
    assert_eq!(cfg.undated, UndatedPolicy::Last);
}

#[test]
fn broken_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("newsmap.toml");
    fs::write(&p, "sources = [[[").unwrap();
    assert!(AppConfig::load_from(&p).is_err());
    assert!(AppConfig::load_from(&dir.path().join("missing.toml")).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // keep the repo's own config/ out of the picture
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing on disk: built-in seed
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.sources.len(), 8);

    // 2) ./config/newsmap.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("newsmap.toml"),
        r##"[sources.only]
name = "Only"
urls = ["https://only.test/rss"]
color = "#111"
"##,
    )
    .unwrap();
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.sources.keys().collect::<Vec<_>>(), vec!["only"]);

    // 3) env var wins
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{"cache_ttl_secs": 42}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AppConfig::load_default().unwrap();
    assert!(cfg.sources.is_empty());
    assert_eq!(cfg.cache_ttl_secs, 42);

    // 4) env var pointing nowhere is reported
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(AppConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[test]
fn custom_feeds_round_trip_through_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("custom_feeds.json");

    let mut cfg = AppConfig::default_seed();
    cfg.custom_feeds_path = Some(path.clone());

    let mut registry = cfg.build_registry().unwrap();
    registry
        .add_custom("local", "Local Paper", "https://local.test/rss", "#ABCDEF")
        .unwrap();
    assert!(registry.add_custom("reuters", "Fake", "https://fake.test", "").is_err());
    registry.save_custom_to(&path).unwrap();

    let reloaded = cfg.build_registry().unwrap();
    let ids: Vec<String> = reloaded.active_sources().keys().cloned().collect();
    assert_eq!(ids.len(), 9);
    assert_eq!(ids.last().map(String::as_str), Some("local"));
    assert_eq!(reloaded.active_sources()["local"].urls, vec!["https://local.test/rss"]);

    let mut fresh = SourceRegistry::new(cfg.feed_sources());
    assert_eq!(fresh.load_custom_from(&dir.path().join("absent.json")).unwrap(), 0);
    assert!(!fresh.remove_custom("reuters"));
    assert_eq!(fresh.active_sources().len(), 8);
}

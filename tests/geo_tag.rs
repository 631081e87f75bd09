// tests/geo_tag.rs
use chrono::{TimeZone, Utc};
use newsmap::geo::gazetteer::REGIONS;
use newsmap::geo::{detect_locations, detect_region, filter_by_region, geo_stats, main_location, GeoTagger};
use newsmap::ingest::types::content_id;
use newsmap::{FeedSource, NewsItem, RawFeedItem};

fn item(source: &str, title: &str, description: &str) -> NewsItem {
    let link = format!("https://{source}.test/{}", title.len());
    let raw = RawFeedItem {
        id: content_id(&link, title),
        title: title.to_string(),
        description: description.to_string(),
        link,
        pub_date: Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap(),
        date_inferred: false,
        image: None,
        categories: Vec::new(),
    };
    NewsItem::from_raw(raw, &FeedSource::new(source, source, &["https://feed.test"], "#000000"))
}

fn tagged() -> Vec<NewsItem> {
    let mut items = vec![
        item("a", "Berlin summit", "Berlin and Paris leaders met in Berlin."),
        item("b", "Quake hits Tokyo", ""),
        item("c", "Harvest festival", "Crowds gather for the fair."),
    ];
    GeoTagger::new().tag(&mut items);
    items
}

#[test]
fn first_declared_region_wins_for_ambiguous_text() {
    // "canada" (americas) is declared before "japan" (asia)
    assert_eq!(detect_region("Delegates from Japan and Canada"), Some("americas"));
    assert_eq!(detect_region("Delegates from Japan"), Some("asia"));
    assert_eq!(detect_region("Quiet day"), None);
    let order: Vec<&str> = REGIONS.iter().map(|r| r.id).collect();
    assert_eq!(
        order,
        vec!["europe", "americas", "asia", "africa", "middle-east", "oceania"]
    );
}

#[test]
fn locations_sort_by_count_then_gazetteer_order() {
    let names = |text: &str| -> Vec<String> {
        detect_locations(text).into_iter().map(|l| l.name).collect()
    };
    assert_eq!(names("Berlin, then Paris"), vec!["Paris", "Berlin"]);
    assert_eq!(names("Paris, Berlin and Berlin again"), vec!["Berlin", "Paris"]);
    assert!(names("Nothing to see").is_empty());
}

#[test]
fn tagging_sets_locations_primary_and_region() {
    let items = tagged();

    let berlin = &items[0];
    let counts: Vec<(&str, usize)> = berlin
        .locations
        .iter()
        .map(|l| (l.name.as_str(), l.count))
        .collect();
    assert_eq!(counts, vec![("Berlin", 3), ("Paris", 1)]);
    assert_eq!(berlin.primary_location.as_ref(), berlin.locations.first());
    assert_eq!(berlin.region.as_deref(), Some("europe"));
    assert_eq!(main_location(berlin).map(|l| l.name), Some("Berlin".to_string()));

    assert_eq!(items[1].region.as_deref(), Some("asia"));

    let plain = &items[2];
    assert!(plain.locations.is_empty());
    assert!(plain.primary_location.is_none());
    assert!(plain.region.is_none());
}

#[test]
fn region_filter_treats_none_and_all_as_everything() {
    let items = tagged();
    assert_eq!(filter_by_region(&items, None).len(), 3);
    assert_eq!(filter_by_region(&items, Some("all")).len(), 3);

    let asia = filter_by_region(&items, Some("asia"));
    assert_eq!(asia.len(), 1);
    assert_eq!(asia[0].item.title, "Quake hits Tokyo");
    assert!(filter_by_region(&items, Some("oceania")).is_empty());
}

#[test]
fn stats_cover_every_region() {
    let stats = geo_stats(&tagged());
    assert_eq!(stats.total, 3);
    assert_eq!(stats.with_location, 2);
    assert_eq!(stats.by_region.len(), REGIONS.len());
    assert_eq!(stats.by_region["europe"], 1);
    assert_eq!(stats.by_region["asia"], 1);
    assert_eq!(stats.by_region["oceania"], 0);
    let locs: Vec<(&str, usize)> = stats
        .by_location
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    assert_eq!(locs, vec![("Berlin", 1), ("Tokyo", 1)]);
}

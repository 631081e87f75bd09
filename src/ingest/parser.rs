// src/ingest/parser.rs
//! RSS 2.0 / Atom → [`RawFeedItem`].
//!
//! The dialect is detected once per document: any `<item>` element means RSS,
//! otherwise `<entry>` elements mean Atom. Each logical field is resolved
//! through an ordered table of tag aliases or accessor functions; the first
//! non-empty result wins. Parsing never fails hard: malformed XML yields an
//! empty list (see [`parse`]); [`try_parse`] exposes the error for callers that
//! need to tell "bad document" from "no entries".

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::normalize_text;
use crate::ingest::types::{content_id, RawFeedItem};
use crate::ingest::xml::{parse_document, Element};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedDialect {
    Rss,
    Atom,
}

impl FeedDialect {
    fn container(self) -> &'static str {
        match self {
            FeedDialect::Rss => "item",
            FeedDialect::Atom => "entry",
        }
    }

    fn fields(self) -> &'static FieldTable {
        match self {
            FeedDialect::Rss => &RSS_FIELDS,
            FeedDialect::Atom => &ATOM_FIELDS,
        }
    }

    /// RSS wins whenever the document has at least one `<item>`.
    pub fn detect(root: &Element) -> Option<Self> {
        if root.find("item").is_some() {
            Some(FeedDialect::Rss)
        } else if root.find("entry").is_some() {
            Some(FeedDialect::Atom)
        } else {
            None
        }
    }
}

type Accessor = fn(&Element) -> Option<String>;

struct FieldTable {
    title: &'static [&'static str],
    description: &'static [&'static str],
    date: &'static [&'static str],
    link: &'static [Accessor],
    image: &'static [Accessor],
}

static RSS_FIELDS: FieldTable = FieldTable {
    title: &["title"],
    description: &["description", "summary", "content", "content:encoded"],
    date: &["pubDate", "published", "updated", "dc:date"],
    link: &[link_text, link_href, alternate_href],
    image: &[media_thumbnail, media_content, image_enclosure, image_in_html],
};

static ATOM_FIELDS: FieldTable = FieldTable {
    title: &["title"],
    description: &["summary", "content", "description", "content:encoded"],
    date: &["published", "updated", "dc:date", "pubDate"],
    link: &[link_text, link_href, alternate_href],
    image: &[
        media_thumbnail,
        media_content,
        image_enclosure,
        image_link_enclosure,
        image_in_html,
    ],
};

/// Raw (unsanitized) text of the first alias present on the entry.
/// Presence decides, not content: an empty `<description/>` stops the search.
fn first_text(entry: &Element, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|tag| entry.find(tag))
        .map(|e| e.text_content())
}

fn first_of(entry: &Element, accessors: &[Accessor]) -> Option<String> {
    accessors.iter().find_map(|f| f(entry))
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ---- link accessors ----

fn link_text(entry: &Element) -> Option<String> {
    entry.find("link").and_then(|l| non_empty(&l.text_content()))
}

fn link_href(entry: &Element) -> Option<String> {
    entry
        .find("link")
        .and_then(|l| l.attr("href"))
        .and_then(non_empty)
}

fn alternate_href(entry: &Element) -> Option<String> {
    entry
        .find_where(&|e| e.is("link") && e.attr("rel") == Some("alternate"))
        .and_then(|l| l.attr("href"))
        .and_then(non_empty)
}

// ---- image accessors ----

fn media_thumbnail(entry: &Element) -> Option<String> {
    entry
        .find("media:thumbnail")
        .and_then(|e| e.attr("url"))
        .and_then(non_empty)
}

fn media_content(entry: &Element) -> Option<String> {
    entry
        .find("media:content")
        .and_then(|e| e.attr("url"))
        .and_then(non_empty)
}

fn is_image_type(e: &Element) -> bool {
    e.attr("type")
        .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image"))
}

fn image_enclosure(entry: &Element) -> Option<String> {
    entry
        .find_where(&|e| e.is("enclosure") && is_image_type(e))
        .and_then(|e| e.attr("url"))
        .and_then(non_empty)
}

fn image_link_enclosure(entry: &Element) -> Option<String> {
    entry
        .find_where(&|e| e.is("link") && e.attr("rel") == Some("enclosure") && is_image_type(e))
        .and_then(|e| e.attr("href"))
        .and_then(non_empty)
}

static RE_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"'>]+)["']"#).expect("img regex"));

fn image_in_html(entry: &Element) -> Option<String> {
    ["description", "content", "content:encoded", "summary"]
        .iter()
        .filter_map(|tag| entry.find(tag))
        .find_map(|e| {
            let html = e.text_content();
            RE_IMG
                .captures(&html)
                .and_then(|c| c.get(1))
                .and_then(|m| non_empty(m.as_str()))
        })
}

// ---- categories ----

fn categories(entry: &Element) -> Vec<String> {
    entry
        .find_all("category")
        .into_iter()
        .filter_map(|c| {
            let text = normalize_text(&c.text_content());
            if !text.is_empty() {
                return Some(text);
            }
            c.attr("term").map(normalize_text).filter(|t| !t.is_empty())
        })
        .collect()
}

// ---- dates ----

/// Parse the date formats seen in feeds: RFC 2822, RFC 3339 and a few
/// zone-less ISO variants (read as UTC).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

// ---- entry + document ----

fn parse_entry(entry: &Element, dialect: FeedDialect, now: DateTime<Utc>) -> Option<RawFeedItem> {
    let fields = dialect.fields();

    let title = normalize_text(&first_text(entry, fields.title)?);
    if title.is_empty() {
        return None;
    }

    let description = first_text(entry, fields.description)
        .map(|d| normalize_text(&d))
        .unwrap_or_default();
    let link = first_of(entry, fields.link).unwrap_or_default();

    let parsed_date = first_text(entry, fields.date).and_then(|d| parse_feed_date(&d));
    let (pub_date, date_inferred) = match parsed_date {
        Some(d) => (d, false),
        None => (now, true),
    };

    Some(RawFeedItem {
        id: content_id(&link, &title),
        title,
        description,
        link,
        pub_date,
        date_inferred,
        image: first_of(entry, fields.image),
        categories: categories(entry),
    })
}

/// Parse with an explicit "now" used for undated entries. Errors only on
/// malformed XML; a well-formed document without entries is `Ok(vec![])`.
pub fn try_parse_at(xml: &str, now: DateTime<Utc>) -> Result<Vec<RawFeedItem>> {
    let t0 = std::time::Instant::now();
    let root = parse_document(xml)?;

    let Some(dialect) = FeedDialect::detect(&root) else {
        return Ok(Vec::new());
    };

    let out: Vec<RawFeedItem> = root
        .find_all(dialect.container())
        .into_iter()
        .filter_map(|entry| parse_entry(entry, dialect, now))
        .collect();

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_items_total").increment(out.len() as u64);
    Ok(out)
}

pub fn try_parse(xml: &str) -> Result<Vec<RawFeedItem>> {
    try_parse_at(xml, Utc::now())
}

/// Fail-soft variant: malformed XML is logged and yields no items.
pub fn parse_at(xml: &str, now: DateTime<Utc>) -> Vec<RawFeedItem> {
    match try_parse_at(xml, now) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, "feed xml rejected");
            Vec::new()
        }
    }
}

pub fn parse(xml: &str) -> Vec<RawFeedItem> {
    parse_at(xml, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_in_common_formats() {
        let want = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(parse_feed_date("Tue, 04 Mar 2025 10:00:00 GMT"), Some(want));
        assert_eq!(parse_feed_date("Tue, 04 Mar 2025 11:00:00 +0100"), Some(want));
        assert_eq!(parse_feed_date("2025-03-04T10:00:00Z"), Some(want));
        assert_eq!(parse_feed_date("2025-03-04T12:00:00+02:00"), Some(want));
        assert_eq!(parse_feed_date(" 2025-03-04T10:00:00 "), Some(want));
        assert_eq!(
            parse_feed_date("2025-03-04"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_feed_date("yesterday-ish"), None);
        assert_eq!(parse_feed_date(""), None);
    }

    #[test]
    fn dialect_prefers_rss_items() {
        let both = parse_document("<x><entry/><item/></x>").unwrap();
        assert_eq!(FeedDialect::detect(&both), Some(FeedDialect::Rss));
        let atom = parse_document("<feed><entry/></feed>").unwrap();
        assert_eq!(FeedDialect::detect(&atom), Some(FeedDialect::Atom));
        let none = parse_document("<feed/>").unwrap();
        assert_eq!(FeedDialect::detect(&none), None);
    }

    #[test]
    fn empty_description_alias_stops_lookup() {
        let xml = r#"<rss><channel><item><title>T</title><description></description><summary>S</summary></item></channel></rss>"#;
        let items = parse(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "");
    }
}

// src/ingest/mod.rs
pub mod feeds;
pub mod providers;
pub mod types;

use futures::stream::{self, StreamExt};
use metrics::counter;

use crate::ingest::types::{
    CandidateItem, FeedDescriptor, FeedDocument, FeedEntry, FeedItem, FeedSource,
};

pub const UNTITLED: &str = "No Title";

/// Clean a feed title: decode entities, strip tags, ASCII quotes, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

fn entry_to_candidate(entry: FeedEntry, source_name: &str) -> Option<CandidateItem> {
    let title = entry
        .title
        .as_ref()
        .and_then(|t| t.text_value())
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    // alternate link first, then any href, then bare link text, then the entry id
    let url = entry
        .link
        .iter()
        .filter(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .find_map(|l| l.href_value())
        .or_else(|| entry.link.iter().find_map(|l| l.href_value()))
        .or_else(|| entry.link.iter().find_map(|l| l.text_value()))
        .or_else(|| entry.id.as_ref().and_then(|i| i.text_value()))?
        .to_string();

    let published_at = entry
        .published
        .or(entry.updated)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Some(CandidateItem {
        title,
        url,
        source_name: source_name.to_string(),
        published_at,
    })
}

fn item_to_candidate(item: FeedItem, source_name: &str) -> Option<CandidateItem> {
    let title = item
        .title
        .as_ref()
        .and_then(|t| t.text_value())
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let url = item
        .link
        .as_ref()
        .and_then(|l| l.text_value().or_else(|| l.href_value()))
        .or_else(|| item.guid.as_ref().and_then(|g| g.text_value()))?
        .to_string();

    let published_at = item
        .pub_date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Some(CandidateItem {
        title,
        url,
        source_name: source_name.to_string(),
        published_at,
    })
}

/// Flatten either document shape into candidates. Entries with no resolvable url are dropped.
pub fn normalize_document(doc: FeedDocument, source_name: &str) -> Vec<CandidateItem> {
    let (total, out): (usize, Vec<CandidateItem>) = match doc {
        FeedDocument::Entries(entries) => (
            entries.len(),
            entries
                .into_iter()
                .filter_map(|e| entry_to_candidate(e, source_name))
                .collect(),
        ),
        FeedDocument::Items(items) => (
            items.len(),
            items
                .into_iter()
                .filter_map(|i| item_to_candidate(i, source_name))
                .collect(),
        ),
    };
    if out.len() < total {
        tracing::debug!(
            feed = source_name,
            dropped = total - out.len(),
            "entries without url dropped"
        );
    }
    out
}

#[derive(Debug, Default)]
pub struct AggregateReport {
    pub items: Vec<CandidateItem>,
    pub failed_feeds: Vec<String>,
}

/// Fetch every feed through `source`, at most `concurrency` at a time.
/// A failing feed is logged and skipped; duplicates across feeds are kept.
pub async fn aggregate(
    source: &dyn FeedSource,
    feeds: &[FeedDescriptor],
    concurrency: usize,
) -> AggregateReport {
    crate::telemetry::describe_metrics();

    let results: Vec<_> = stream::iter(feeds.iter())
        .map(|feed| async move { (feed, source.fetch(feed).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = AggregateReport::default();
    for (feed, res) in results {
        match res {
            Ok(doc) => {
                let mut items = normalize_document(doc, &feed.name);
                tracing::debug!(feed = %feed.name, items = items.len(), "feed fetched");
                counter!("ingest_items_total").increment(items.len() as u64);
                report.items.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(error = ?e, feed = %feed.name, "feed fetch failed, skipping");
                counter!("ingest_feed_errors_total").increment(1);
                report.failed_feeds.push(feed.name.clone());
            }
        }
    }

    tracing::info!(
        feeds = feeds.len(),
        failed = report.failed_feeds.len(),
        items = report.items.len(),
        "aggregation finished"
    );
    report
}

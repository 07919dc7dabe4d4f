mod common;

use common::{rss_item, StaticFeeds};
use news_reel_publisher::ingest::aggregate;
use news_reel_publisher::ingest::types::{FeedDescriptor, FeedDocument, FeedEntry, NodeValue};

#[tokio::test]
async fn malformed_feed_is_skipped_and_valid_entries_survive() {
    let source = StaticFeeds::default().with(
        "https://feeds.test/good",
        FeedDocument::Items(vec![
            rss_item("One", "https://a.test/1", None),
            rss_item("Two", "https://a.test/2", Some("Fri, 16 Oct 2026 10:00:00 +0000")),
            rss_item("Three", "https://a.test/3", None),
        ]),
    );
    let feeds = vec![
        FeedDescriptor::new("Broken", "https://feeds.test/broken"),
        FeedDescriptor::new("Good", "https://feeds.test/good"),
    ];

    let report = aggregate(&source, &feeds, 4).await;
    assert_eq!(report.items.len(), 3);
    assert_eq!(report.failed_feeds, vec!["Broken".to_string()]);
    let mut titles: Vec<_> = report.items.iter().map(|c| c.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["One", "Three", "Two"]);
    assert!(report.items.iter().all(|c| c.source_name == "Good"));
}

#[tokio::test]
async fn both_shapes_are_accepted_and_cross_feed_duplicates_kept() {
    let entry = FeedEntry {
        title: Some(NodeValue::text("Same story")),
        link: vec![NodeValue::href("https://a.test/same")],
        published: Some("2026-10-16T10:00:00Z".into()),
        ..Default::default()
    };
    let source = StaticFeeds::default()
        .with("https://feeds.test/atom", FeedDocument::Entries(vec![entry]))
        .with(
            "https://feeds.test/rss",
            FeedDocument::Items(vec![rss_item("Same story", "https://a.test/same", None)]),
        );
    let feeds = vec![
        FeedDescriptor::new("Atom", "https://feeds.test/atom"),
        FeedDescriptor::new("Rss", "https://feeds.test/rss"),
    ];

    let report = aggregate(&source, &feeds, 1).await;
    assert!(report.failed_feeds.is_empty());
    assert_eq!(report.items.len(), 2);
    assert!(report.items.iter().all(|c| c.url == "https://a.test/same"));
    let atom = report.items.iter().find(|c| c.source_name == "Atom").unwrap();
    assert_eq!(atom.published_at.as_deref(), Some("2026-10-16T10:00:00Z"));
}

#[tokio::test]
async fn every_feed_failing_yields_empty_report() {
    let source = StaticFeeds::default();
    let feeds = vec![
        FeedDescriptor::new("A", "https://feeds.test/a"),
        FeedDescriptor::new("B", "https://feeds.test/b"),
    ];
    let report = aggregate(&source, &feeds, 0).await;
    assert!(report.items.is_empty());
    assert_eq!(report.failed_feeds.len(), 2);
    assert_eq!(source.calls.lock().len(), 2);
}

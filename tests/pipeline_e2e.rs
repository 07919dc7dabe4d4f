mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use common::{rss_item, Fakes, StaticFeeds};
use news_reel_publisher::collab::{ExtractedArticle, RenderJob};
use news_reel_publisher::history::{AssetKind, HistoryStore, TrackedAsset};
use news_reel_publisher::image::find_player;
use news_reel_publisher::ingest::types::{FeedDescriptor, FeedDocument};
use news_reel_publisher::{
    HistoryRecord, MemoryStore, Pipeline, PipelineConfig, PipelineError, RunOutcome, Stage,
    Variant,
};

const STORY_URL: &str = "https://news.test/mbappe-comeback";
const SCRIPT: &str = r#"{
    "persona": "CELEBRATION",
    "category": "soccer",
    "headline": "Mbappe magic",
    "subHeadline": "Madrid turn it around late",
    "facebookDescription": "Madrid came from two down.\n\nDiscover the story 👇 #TheVitalSport",
    "slides": ["Two down at the break.", "Then Mbappé took over.", "Three goals in twenty minutes."]
}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn feeds() -> Vec<FeedDescriptor> {
    vec![
        FeedDescriptor::new("Soccer", "https://feeds.test/soccer"),
        FeedDescriptor::new("Broken", "https://feeds.test/broken"),
    ]
}

fn soccer_feed() -> StaticFeeds {
    StaticFeeds::default().with(
        "https://feeds.test/soccer",
        FeedDocument::Items(vec![rss_item(
            "Mbappé inspires Madrid comeback",
            STORY_URL,
            Some("Fri, 16 Oct 2026 10:00:00 +0000"),
        )]),
    )
}

/// Article whose only image is junk, so the cascade must fall through to the library.
fn article() -> ExtractedArticle {
    ExtractedArticle {
        title: "Mbappé inspires Madrid comeback".into(),
        images: vec!["https://cdn.test/site/logo-header.png".into()],
        content: "Real Madrid were two goals down at the break before Kylian Mbappé scored a second-half hat-trick.".into(),
    }
}

fn seeded_history() -> HistoryRecord {
    HistoryRecord {
        posted_urls: vec!["https://news.test/older".into()],
        tracked_assets: vec![
            TrackedAsset {
                asset_id: "reels/expired".into(),
                kind: AssetKind::Video,
                uploaded_at: now() - Duration::hours(30),
            },
            TrackedAsset {
                asset_id: "reels/recent".into(),
                kind: AssetKind::Video,
                uploaded_at: now() - Duration::hours(1),
            },
        ],
        ..Default::default()
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        seed: Some(11),
        upload_folder: "reels".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn player_library_fallthrough_publishes_and_records() {
    let store = Arc::new(MemoryStore::with_record(&seeded_history()).unwrap());
    let fakes = Fakes::new(soccer_feed(), article(), SCRIPT);
    let mut p = Pipeline::new(config(), feeds(), store.clone(), fakes.collaborators());

    let out = p.run(now()).await.unwrap();
    let RunOutcome::Published { url, asset_id, media_url, .. } = out else {
        panic!("expected a publish");
    };
    assert_eq!(url, STORY_URL);

    // history: new url at the front, exactly one new tracked asset, expired one swept
    let (rec, _) = store.load();
    assert_eq!(rec.posted_urls[0], STORY_URL);
    assert_eq!(rec.posted_urls[1], "https://news.test/older");
    let ids: Vec<_> = rec.tracked_assets.iter().map(|a| a.asset_id.as_str()).collect();
    assert_eq!(ids, vec!["reels/recent", asset_id.as_str()]);
    assert_eq!(rec.tracked_assets[1].uploaded_at, now());
    assert_eq!(rec.tracked_assets[1].kind, AssetKind::Video);
    assert!(rec.recent_keywords.contains(&"Madrid".to_string()));
    assert!(rec.recent_keywords.contains(&"Mbappé".to_string()));
    assert_eq!(rec.posted_titles[0], "Mbappé inspires Madrid comeback");
    assert_eq!(*fakes.deleter.deleted.lock(), vec!["reels/expired".to_string()]);
    assert_eq!(store.save_count(), 2);

    // render got the library photo and the decoded script
    let jobs = fakes.renderer.jobs.lock();
    let RenderJob::Reel(props) = &jobs[0] else {
        panic!("expected a reel job");
    };
    let player = find_player("mbappé").unwrap();
    assert_eq!(props.background_images, vec![player.image_url.to_string()]);
    assert_eq!(props.title, "MBAPPE MAGIC");
    assert_eq!(props.persona, "CELEBRATION");
    assert_eq!(props.duration_in_frames, (7 + 2 * 5) * 30 + 75);

    // delivery used the long caption
    let payloads = fakes.deliverer.payloads.lock();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].media_url, media_url);
    assert_eq!(payloads[0].category, "SOCCER");
    assert!(payloads[0].sub_headline.starts_with("Madrid came from two down."));
}

#[tokio::test]
async fn delivery_failure_leaves_only_the_sweep_checkpoint() {
    let store = Arc::new(MemoryStore::with_record(&seeded_history()).unwrap());
    let mut fakes = Fakes::new(soccer_feed(), article(), SCRIPT);
    fakes.deliverer = Arc::new(common::FakeDeliverer {
        fail: true,
        ..Default::default()
    });
    let mut p = Pipeline::new(config(), feeds(), store.clone(), fakes.collaborators());

    let err = p.run(now()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ExternalServiceFailure {
            stage: Stage::Deliver,
            ..
        }
    ));

    let (rec, _) = store.load();
    assert_eq!(rec.posted_urls, vec!["https://news.test/older".to_string()]);
    assert!(rec.recent_keywords.is_empty());
    let ids: Vec<_> = rec.tracked_assets.iter().map(|a| a.asset_id.as_str()).collect();
    assert_eq!(ids, vec!["reels/recent"]);
    assert_eq!(store.save_count(), 1);
    assert_eq!(p.last_sweep().unwrap().swept, vec!["reels/expired".to_string()]);
}

#[tokio::test]
async fn no_qualifying_image_aborts_before_render() {
    let store = Arc::new(MemoryStore::new());
    let feeds_src = StaticFeeds::default().with(
        "https://feeds.test/soccer",
        FeedDocument::Items(vec![rss_item(
            "Arsenal late winner at the Emirates",
            "https://news.test/arsenal",
            Some("Fri, 16 Oct 2026 11:00:00 +0000"),
        )]),
    );
    let art = ExtractedArticle {
        title: "Arsenal late winner".into(),
        images: vec!["https://cdn.test/img/placeholder.jpg".into()],
        content: "x".repeat(80),
    };
    let fakes = Fakes::new(feeds_src, art, SCRIPT);
    let mut p = Pipeline::new(config(), feeds(), store.clone(), fakes.collaborators());

    let err = p.run(now()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoQualifyingImage));
    assert!(fakes.renderer.jobs.lock().is_empty());
    assert!(store.load().0.posted_urls.is_empty());
}

#[tokio::test]
async fn test_mode_renders_but_never_publishes() {
    let store = Arc::new(MemoryStore::with_record(&seeded_history()).unwrap());
    let fakes = Fakes::new(soccer_feed(), article(), SCRIPT);
    let cfg = PipelineConfig {
        test_mode: true,
        ..config()
    };
    let mut p = Pipeline::new(cfg, feeds(), store.clone(), fakes.collaborators());

    let out = p.run(now()).await.unwrap();
    assert!(matches!(out, RunOutcome::DryRun { .. }));
    assert_eq!(fakes.renderer.jobs.lock().len(), 1);
    assert!(fakes.uploader.uploads.lock().is_empty());
    assert!(fakes.deliverer.payloads.lock().is_empty());
    assert_eq!(store.save_count(), 1);
    assert_eq!(
        store.load().0.posted_urls,
        vec!["https://news.test/older".to_string()]
    );
}

#[tokio::test]
async fn manual_url_skips_feeds_but_still_dedups() {
    let store = Arc::new(MemoryStore::with_record(&seeded_history()).unwrap());
    let fakes = Fakes::new(soccer_feed(), article(), SCRIPT);
    let cfg = PipelineConfig {
        manual_url: Some("https://news.test/older".into()),
        ..config()
    };
    let mut p = Pipeline::new(cfg, feeds(), store.clone(), fakes.collaborators());

    let err = p.run(now()).await.unwrap_err();
    assert!(matches!(err, PipelineError::AllDuplicates));
    assert!(fakes.feeds.calls.lock().is_empty());
    assert!(fakes.extractor.calls.lock().is_empty());
}

#[tokio::test]
async fn manual_url_with_manual_image_publishes() {
    let store = Arc::new(MemoryStore::new());
    let art = ExtractedArticle {
        title: "Ohtani hits 55th homer".into(),
        images: vec![],
        content: "short".into(),
    };
    let fakes = Fakes::new(StaticFeeds::default(), art, "not json at all");
    let cfg = PipelineConfig {
        manual_url: Some("https://news.test/manual".into()),
        manual_image_url: Some("https://cdn.test/photos/ohtani.jpg".into()),
        ..config()
    };
    let mut p = Pipeline::new(cfg, feeds(), store.clone(), fakes.collaborators());

    let out = p.run(now()).await.unwrap();
    assert!(
        matches!(out, RunOutcome::Published { ref url, .. } if url == "https://news.test/manual")
    );
    assert!(fakes.feeds.calls.lock().is_empty());

    // unusable generation output falls back to the default document
    let payloads = fakes.deliverer.payloads.lock();
    assert_eq!(payloads[0].headline, "BREAKING NEWS ALERT");
    let jobs = fakes.renderer.jobs.lock();
    let RenderJob::Reel(props) = &jobs[0] else {
        panic!("expected a reel job");
    };
    assert_eq!(props.background_images, vec!["https://cdn.test/photos/ohtani.jpg".to_string()]);
    // short body: the extracted title became the generation context
    assert!(fakes.generator.prompts.lock().iter().any(|p| p.contains("Ohtani hits 55th homer")));

    let rec = store.load().0;
    assert_eq!(rec.posted_urls, vec!["https://news.test/manual".to_string()]);
    assert_eq!(rec.recent_keywords, vec!["Ohtani".to_string()]);
}

#[tokio::test]
async fn card_variant_tracks_an_image_asset() {
    let store = Arc::new(MemoryStore::new());
    let card = r#"{"type":"quote","category":"soccer","title":"Mbappe speaks","subHeadline":"We never stopped","quoteAuthor":"Kylian Mbappé"}"#;
    let fakes = Fakes::new(soccer_feed(), article(), card);
    let cfg = PipelineConfig {
        variant: Variant::Card,
        ..config()
    };
    let mut p = Pipeline::new(cfg, feeds(), store.clone(), fakes.collaborators());

    p.run(now()).await.unwrap();
    let jobs = fakes.renderer.jobs.lock();
    let RenderJob::Card(props) = &jobs[0] else {
        panic!("expected a card job");
    };
    assert_eq!(props.card_type, "QUOTE");
    assert_eq!(props.quote_author.as_deref(), Some("Kylian Mbappé"));
    assert_eq!(fakes.uploader.uploads.lock()[0].1, AssetKind::Image);
    assert_eq!(store.load().0.tracked_assets[0].kind, AssetKind::Image);
    assert_eq!(fakes.deliverer.payloads.lock()[0].sub_headline, "We never stopped");
}

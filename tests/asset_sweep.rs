mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use common::{FakeDeleter, Fakes, StaticFeeds};
use news_reel_publisher::assets::sweep;
use news_reel_publisher::collab::ExtractedArticle;
use news_reel_publisher::history::{AssetKind, HistoryStore, TrackedAsset};
use news_reel_publisher::{HistoryRecord, MemoryStore, Pipeline, PipelineConfig, PipelineError};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn tracked(id: &str, age: Duration) -> TrackedAsset {
    TrackedAsset {
        asset_id: id.into(),
        kind: AssetKind::Image,
        uploaded_at: now() - age,
    }
}

fn record() -> HistoryRecord {
    HistoryRecord {
        tracked_assets: vec![
            tracked("a", Duration::hours(48)),
            tracked("b", Duration::hours(24) + Duration::seconds(1)),
            tracked("c", Duration::hours(24)),
            tracked("d", Duration::minutes(5)),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn survivors_are_within_retention() {
    let mut rec = record();
    let deleter = FakeDeleter::default();
    let out = sweep(
        &mut rec,
        now(),
        Duration::hours(24),
        &deleter,
        std::time::Duration::from_secs(1),
    )
    .await;

    assert_eq!(out.swept, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(out.kept, 2);
    for a in &rec.tracked_assets {
        assert!(now() - a.uploaded_at <= Duration::hours(24), "{}", a.asset_id);
    }
}

#[tokio::test]
async fn delete_failure_is_logged_and_asset_still_dropped() {
    let mut rec = record();
    let deleter = FakeDeleter {
        fail_ids: vec!["a".into()],
        ..Default::default()
    };
    let out = sweep(
        &mut rec,
        now(),
        Duration::hours(24),
        &deleter,
        std::time::Duration::from_secs(1),
    )
    .await;

    assert_eq!(out.delete_failures, vec!["a".to_string()]);
    assert_eq!(*deleter.deleted.lock(), vec!["a".to_string(), "b".to_string()]);
    assert!(rec.tracked_assets.iter().all(|a| a.asset_id != "a"));
}

#[tokio::test]
async fn sweep_is_persisted_even_when_the_run_aborts() {
    let store = Arc::new(MemoryStore::with_record(&record()).unwrap());
    // no feeds resolve: aggregation is empty, so the run aborts right after the sweep
    let fakes = Fakes::new(StaticFeeds::default(), ExtractedArticle::default(), "{}");
    let mut p = Pipeline::new(
        PipelineConfig::default(),
        Vec::new(),
        store.clone(),
        fakes.collaborators(),
    );

    let err = p.run(now()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoCandidates));
    assert_eq!(store.save_count(), 1);

    let ids: Vec<_> = store
        .load()
        .0
        .tracked_assets
        .into_iter()
        .map(|a| a.asset_id)
        .collect();
    assert_eq!(ids, vec!["c".to_string(), "d".to_string()]);
}

//! Asset lifecycle: reclaim expired remote media at startup, track newly published media.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::time::Duration;

use crate::history::{AssetKind, HistoryRecord, TrackedAsset};

#[async_trait]
pub trait AssetDeleter: Send + Sync {
    async fn delete(&self, asset_id: &str, kind: AssetKind) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub kept: usize,
    /// Expired assets removed from tracking, whether or not the remote delete succeeded.
    pub swept: Vec<String>,
    pub delete_failures: Vec<String>,
}

/// Drop every asset older than `retention`, attempting a remote delete for each.
///
/// Deletes are best-effort. A failed or timed-out delete is logged and the asset is still
/// dropped, so one broken asset cannot cause a retry on every run.
pub async fn sweep(
    record: &mut HistoryRecord,
    now: DateTime<Utc>,
    retention: chrono::Duration,
    deleter: &dyn AssetDeleter,
    delete_timeout: Duration,
) -> SweepOutcome {
    crate::telemetry::describe_metrics();
    let mut out = SweepOutcome::default();
    let mut survivors = Vec::with_capacity(record.tracked_assets.len());

    for asset in record.tracked_assets.drain(..) {
        if now - asset.uploaded_at <= retention {
            survivors.push(asset);
            continue;
        }
        let res = tokio::time::timeout(
            delete_timeout,
            deleter.delete(&asset.asset_id, asset.kind),
        )
        .await
        .unwrap_or_else(|_| Err(anyhow::anyhow!("delete timed out after {delete_timeout:?}")));
        match res {
            Ok(()) => {
                tracing::info!(
                    asset_id = %asset.asset_id,
                    kind = asset.kind.as_str(),
                    "expired asset deleted"
                );
            }
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    error = %e,
                    "asset delete failed, dropping from tracking anyway"
                );
                counter!("assets_delete_errors_total").increment(1);
                out.delete_failures.push(asset.asset_id.clone());
            }
        }
        counter!("assets_swept_total").increment(1);
        out.swept.push(asset.asset_id);
    }

    out.kept = survivors.len();
    record.tracked_assets = survivors;
    out
}

/// Fold a successful publish into the record. The caller persists it.
pub fn record_publish(
    record: &mut HistoryRecord,
    url: &str,
    title: Option<&str>,
    trigger_keywords: &[String],
    asset_id: &str,
    kind: AssetKind,
    now: DateTime<Utc>,
) {
    record.track_asset(TrackedAsset::new(asset_id, kind, now));
    record.add_posted(url, title);
    record.merge_keywords(trigger_keywords);
}

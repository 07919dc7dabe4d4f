//! Publisher binary: one run per invocation (schedule it externally, never concurrently).
//!
//! Exits 0 when the run published, dry-ran or ended in a documented abort.

use std::process::ExitCode;
use std::sync::Arc;

use news_reel_publisher::config::{self, Credentials};
use news_reel_publisher::ingest::feeds::load_feeds_or_default;
use news_reel_publisher::{telemetry, Collaborators, JsonFileStore, Pipeline, RunOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = match config::load_default() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "invalid pipeline config");
            return ExitCode::FAILURE;
        }
    };

    let metrics = match cfg.metrics_textfile.as_ref() {
        Some(path) => match telemetry::install_recorder() {
            Ok(h) => Some((h, path.clone())),
            Err(e) => {
                tracing::warn!(error = ?e, "metrics disabled");
                None
            }
        },
        None => None,
    };

    let creds = Credentials::from_env(cfg.variant);
    let missing = creds.missing(cfg.variant);
    if !missing.is_empty() {
        tracing::warn!(?missing, "credentials missing, dependent stages will fail");
    }

    let collab = match Collaborators::production(&cfg, &creds) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "could not build collaborators");
            return ExitCode::FAILURE;
        }
    };

    let feeds = load_feeds_or_default(cfg.feeds_path.as_deref());
    let store = Arc::new(JsonFileStore::new(cfg.history_path.clone()));
    tracing::info!(
        variant = cfg.variant.as_str(),
        feeds = feeds.len(),
        history = %cfg.history_path.display(),
        test_mode = cfg.test_mode,
        "starting run"
    );

    let mut pipeline = Pipeline::new(cfg, feeds, store, collab);
    match pipeline.run(chrono::Utc::now()).await {
        Ok(RunOutcome::Published { url, media_url, .. }) => {
            tracing::info!(%url, %media_url, "done");
        }
        Ok(RunOutcome::DryRun { url, media_path }) => {
            tracing::info!(%url, media = %media_path.display(), "done (test mode)");
        }
        Err(e) => {
            tracing::info!(reason = e.reason(), "run ended without publishing");
        }
    }

    if let Some((handle, path)) = metrics {
        if let Err(e) = telemetry::write_textfile(&handle, &path) {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }
    ExitCode::SUCCESS
}

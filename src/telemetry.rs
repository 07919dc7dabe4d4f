// src/telemetry.rs
// Logging setup, metric descriptions and the end-of-run Prometheus textfile.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "news_reel_publisher=info,warn";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series carry help text in the exposition).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Pipeline runs started.");
        describe_counter!(
            "pipeline_aborts_total",
            "Runs that ended in a documented abort, by reason."
        );
        describe_counter!("pipeline_published_total", "Runs that published media.");
        describe_counter!("ingest_items_total", "Candidate items parsed from feeds.");
        describe_counter!("ingest_feed_errors_total", "Feeds that failed to fetch or parse.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("assets_swept_total", "Expired assets dropped from tracking.");
        describe_counter!(
            "assets_delete_errors_total",
            "Remote deletes that failed during the sweep."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Install a Prometheus recorder whose output is written once at exit.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")
}

/// Render the exposition to `path` via temp file + rename.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating metrics dir {}", dir.display()))?;
    }
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())
        .with_context(|| format!("writing metrics to {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

//! Run configuration.
//!
//! Tunables come from a TOML or JSON file (every field defaulted); credentials, the manual
//! overrides and test mode come from the environment.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collab::render::DEFAULT_RENDER_COMMAND;
use crate::collab::CloudinaryCredentials;
use crate::filter::DedupChecks;
use crate::history::AssetKind;

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Slide video.
    #[default]
    Reel,
    /// Still image card.
    Card,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Reel => "reel",
            Variant::Card => "card",
        }
    }

    pub fn asset_kind(&self) -> AssetKind {
        match self {
            Variant::Reel => AssetKind::Video,
            Variant::Card => AssetKind::Image,
        }
    }

    pub fn webhook_env(&self) -> &'static str {
        match self {
            Variant::Reel => "MAKE_WEBHOOK_URL",
            Variant::Card => "MAKE_CARD_WEBHOOK_URL",
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("history.json")
}
fn default_fetch_concurrency() -> usize {
    4
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_extract_timeout() -> u64 {
    45
}
fn default_service_timeout() -> u64 {
    60
}
fn default_render_timeout() -> u64 {
    600
}
fn default_window_hours() -> i64 {
    24
}
fn default_true() -> bool {
    true
}
fn default_upload_folder() -> String {
    "news_reels".into()
}
fn default_render_command() -> String {
    DEFAULT_RENDER_COMMAND.into()
}
fn default_render_out_dir() -> PathBuf {
    PathBuf::from("out")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub variant: Variant,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// Optional feed table; the built-in table is used when unset or unreadable.
    #[serde(default)]
    pub feeds_path: Option<PathBuf>,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
    /// Generation, upload, delivery and remote deletes.
    #[serde(default = "default_service_timeout")]
    pub service_timeout_secs: u64,
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
    #[serde(default = "default_window_hours")]
    pub freshness_window_hours: i64,
    #[serde(default = "default_window_hours")]
    pub retention_hours: i64,
    #[serde(default = "default_true")]
    pub dedup_urls: bool,
    #[serde(default = "default_true")]
    pub dedup_titles: bool,
    #[serde(default)]
    pub strict_images: bool,
    /// Pick the newest candidate instead of aborting when every bucket is cooled down.
    #[serde(default)]
    pub cooldown_fallback: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,
    #[serde(default = "default_render_command")]
    pub render_command: String,
    #[serde(default = "default_render_out_dir")]
    pub render_out_dir: PathBuf,
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,

    // environment only
    #[serde(skip)]
    pub manual_url: Option<String>,
    #[serde(skip)]
    pub manual_image_url: Option<String>,
    #[serde(skip)]
    pub test_mode: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            history_path: default_history_path(),
            feeds_path: None,
            fetch_concurrency: default_fetch_concurrency(),
            fetch_timeout_secs: default_fetch_timeout(),
            extract_timeout_secs: default_extract_timeout(),
            service_timeout_secs: default_service_timeout(),
            render_timeout_secs: default_render_timeout(),
            freshness_window_hours: default_window_hours(),
            retention_hours: default_window_hours(),
            dedup_urls: true,
            dedup_titles: true,
            strict_images: false,
            cooldown_fallback: false,
            seed: None,
            upload_folder: default_upload_folder(),
            render_command: default_render_command(),
            render_out_dir: default_render_out_dir(),
            metrics_textfile: None,
            manual_url: None,
            manual_image_url: None,
            test_mode: false,
        }
    }
}

impl PipelineConfig {
    pub fn dedup_checks(&self) -> DedupChecks {
        DedupChecks {
            urls: self.dedup_urls,
            titles: self.dedup_titles,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs.max(1))
    }
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs.max(1))
    }
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs.max(1))
    }
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.freshness_window_hours.max(1))
    }
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours.max(0))
    }

    /// Apply env-only settings through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        self.manual_url = non_empty("MANUAL_URL");
        self.manual_image_url = non_empty("MANUAL_IMAGE_URL");
        self.test_mode = non_empty("TEST_MODE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
    }
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, &ext)
}

/// Load using env var + fallbacks, then apply env-only settings:
/// 1) $PIPELINE_CONFIG_PATH
/// 2) config/pipeline.toml
/// 3) config/pipeline.json
/// 4) defaults
pub fn load_default() -> Result<PipelineConfig> {
    let mut cfg = load_file_default()?;
    cfg.apply_env(|k| std::env::var(k).ok());
    Ok(cfg)
}

fn load_file_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/pipeline.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/pipeline.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(PipelineConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<PipelineConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing pipeline config json");
    }
    match toml::from_str::<PipelineConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported pipeline config format: {toml_err}")),
    }
}

/// Credentials and endpoints for the production collaborators.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub groq_api_key: String,
    pub cloudinary: CloudinaryCredentials,
    pub webhook_url: String,
}

impl Credentials {
    pub fn from_lookup<F>(variant: Variant, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            groq_api_key: get("GROQ_API_KEY"),
            cloudinary: CloudinaryCredentials {
                cloud_name: get("CLOUDINARY_CLOUD_NAME"),
                api_key: get("CLOUDINARY_API_KEY"),
                api_secret: get("CLOUDINARY_API_SECRET"),
            },
            webhook_url: get(variant.webhook_env()),
        }
    }

    pub fn from_env(variant: Variant) -> Self {
        Self::from_lookup(variant, |k| std::env::var(k).ok())
    }

    /// Names of missing values a publishing run needs.
    pub fn missing(&self, variant: Variant) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.groq_api_key.is_empty() {
            out.push("GROQ_API_KEY");
        }
        if self.cloudinary.cloud_name.is_empty() {
            out.push("CLOUDINARY_CLOUD_NAME");
        }
        if self.cloudinary.api_key.is_empty() {
            out.push("CLOUDINARY_API_KEY");
        }
        if self.cloudinary.api_secret.is_empty() {
            out.push("CLOUDINARY_API_SECRET");
        }
        if self.webhook_url.is_empty() {
            out.push(variant.webhook_env());
        }
        out
    }
}

// src/ingest/feeds.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use super::types::FeedDescriptor;

/// Built-in feed table, used when no feed file is configured.
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("ESPN News", "https://www.espn.com/espn/rss/news"),
    ("ESPN Soccer", "https://www.espn.com/espn/rss/soccer/news"),
    ("BBC Sport", "https://feeds.bbci.co.uk/sport/rss.xml"),
    ("Sky Sports", "https://www.skysports.com/rss/12040"),
    ("Marca", "https://e00-marca.uecdn.es/rss/futbol/primera-division.xml"),
    ("AS (Spain)", "https://as.com/rss/futbol/primera.xml"),
    ("Sport (Barcelona)", "https://www.sport.es/es/rss/barca/rss.xml"),
    ("The Athletic", "https://theathletic.com/feeds/rss/"),
    ("ESPN FC", "https://www.espn.com/espn/rss/soccer/news"),
    ("ESPN NBA", "https://www.espn.com/espn/rss/nba/news"),
    ("ESPN NFL", "https://www.espn.com/espn/rss/nfl/news"),
    (
        "F1 News",
        "https://www.formula1.com/content/fom-website/en/latest/all.xml",
    ),
    (
        "NFL.com",
        "https://www.nfl.com/rss/rsslanding?searchString=home",
    ),
    ("MLB News", "https://www.mlb.com/feeds/news/rss.xml"),
];

pub fn default_feeds() -> Vec<FeedDescriptor> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, endpoint)| FeedDescriptor::new(name, endpoint))
        .collect()
}

/// Load a feed table from TOML (`[[feeds]] name = .. endpoint = ..`) or a JSON array.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed table from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
}

/// Configured table if given and readable, else the built-in one.
pub fn load_feeds_or_default(path: Option<&Path>) -> Vec<FeedDescriptor> {
    let Some(path) = path else {
        return default_feeds();
    };
    match load_feeds_from(path) {
        Ok(v) if !v.is_empty() => v,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "feed table is empty, using built-in feeds");
            default_feeds()
        }
        Err(e) => {
            tracing::warn!(error = ?e, "feed table unreadable, using built-in feeds");
            default_feeds()
        }
    }
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedDescriptor>> {
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed table format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedDescriptor>> {
    #[derive(serde::Deserialize)]
    struct TomlFeeds {
        feeds: Vec<FeedDescriptor>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedDescriptor>> {
    let v: Vec<FeedDescriptor> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop blanks, drop repeated endpoints (first name wins).
fn clean_list(items: Vec<FeedDescriptor>) -> Vec<FeedDescriptor> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let endpoint = it.endpoint.trim();
        if name.is_empty() || endpoint.is_empty() || !seen.insert(endpoint.to_string()) {
            continue;
        }
        out.push(FeedDescriptor::new(name, endpoint));
    }
    out
}

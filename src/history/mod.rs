//! The persisted ledger of what was posted and which remote assets are outstanding.
//!
//! The record itself is plain data. Every mutation goes through the helpers below so the
//! caps and uniqueness rules hold at all times, and `store` re-applies them on save.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use store::{HistoryStore, JsonFileStore, LoadReport, MemoryStore};

pub const MAX_URLS: usize = 200;
pub const MAX_TITLES: usize = 200;
pub const MAX_KEYWORDS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }
}

/// A remote asset that must be reclaimed once it ages past the retention window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAsset {
    #[serde(rename = "publicId")]
    pub asset_id: String,
    #[serde(rename = "resourceType")]
    pub kind: AssetKind,
    /// Stored as unix milliseconds.
    #[serde(rename = "uploadedAt", with = "chrono::serde::ts_milliseconds")]
    pub uploaded_at: DateTime<Utc>,
}

impl TrackedAsset {
    /// `uploaded_at` is cut to whole milliseconds, the precision it is persisted at.
    pub fn new(asset_id: impl Into<String>, kind: AssetKind, uploaded_at: DateTime<Utc>) -> Self {
        let uploaded_at =
            DateTime::from_timestamp_millis(uploaded_at.timestamp_millis()).unwrap_or(uploaded_at);
        Self {
            asset_id: asset_id.into(),
            kind,
            uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Most-recent-first cooldown keywords.
    #[serde(default)]
    pub recent_keywords: Vec<String>,
    /// Most-recent-first, unique.
    #[serde(default)]
    pub posted_urls: Vec<String>,
    #[serde(default)]
    pub posted_titles: Vec<String>,
    #[serde(default, rename = "cloudinaryAssets")]
    pub tracked_assets: Vec<TrackedAsset>,
}

impl HistoryRecord {
    /// Decode field by field so one bad field does not throw away the rest.
    /// Tracked assets are decoded one entry at a time: a bad entry is skipped, the others kept.
    /// Returns the record plus what had to be dropped (`field` or `cloudinaryAssets[i]`).
    pub fn from_value_lenient(value: Value) -> (Self, Vec<String>) {
        let mut bad = Vec::new();
        let Value::Object(mut map) = value else {
            return (Self::default(), vec!["<root>".to_string()]);
        };

        fn field<T: serde::de::DeserializeOwned + Default>(
            map: &mut serde_json::Map<String, Value>,
            key: &str,
            bad: &mut Vec<String>,
        ) -> T {
            match map.remove(key) {
                None => T::default(),
                Some(v) => serde_json::from_value(v).unwrap_or_else(|_| {
                    bad.push(key.to_string());
                    T::default()
                }),
            }
        }

        let tracked_assets = match map.remove("cloudinaryAssets") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => {
                let mut kept = Vec::with_capacity(entries.len());
                for (i, entry) in entries.into_iter().enumerate() {
                    match serde_json::from_value::<TrackedAsset>(entry) {
                        Ok(asset) => kept.push(asset),
                        Err(_) => bad.push(format!("cloudinaryAssets[{i}]")),
                    }
                }
                kept
            }
            Some(_) => {
                bad.push("cloudinaryAssets".to_string());
                Vec::new()
            }
        };

        let record = Self {
            recent_keywords: field(&mut map, "recentKeywords", &mut bad),
            posted_urls: field(&mut map, "postedUrls", &mut bad),
            posted_titles: field(&mut map, "postedTitles", &mut bad),
            tracked_assets,
        };
        (record, bad)
    }

    /// Enforce uniqueness and length caps on every ordered list.
    pub fn apply_caps(&mut self) {
        dedup_keep_first(&mut self.posted_urls, |s| s.clone());
        self.posted_urls.truncate(MAX_URLS);
        dedup_keep_first(&mut self.posted_titles, |s| s.clone());
        self.posted_titles.truncate(MAX_TITLES);
        dedup_keep_first(&mut self.recent_keywords, |s| s.to_lowercase());
        self.recent_keywords.truncate(MAX_KEYWORDS);
    }

    pub fn capped(&self) -> Self {
        let mut out = self.clone();
        out.apply_caps();
        out
    }

    pub fn is_url_posted(&self, url: &str) -> bool {
        self.posted_urls.iter().any(|u| u == url)
    }

    /// Normalized equality or containment in either direction against any posted title.
    pub fn is_title_duplicate(&self, title: &str) -> bool {
        let candidate = normalize_title(title);
        self.posted_titles
            .iter()
            .any(|t| titles_overlap(&candidate, &normalize_title(t)))
    }

    /// Front-insert a published url (and title), moving an existing entry to the front.
    pub fn add_posted(&mut self, url: &str, title: Option<&str>) {
        self.posted_urls.retain(|u| u != url);
        self.posted_urls.insert(0, url.to_string());
        self.posted_urls.truncate(MAX_URLS);

        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.posted_titles.retain(|t| t != title);
            self.posted_titles.insert(0, title.to_string());
            self.posted_titles.truncate(MAX_TITLES);
        }
    }

    /// Union `keywords` into the front of the cooldown list, then cap.
    pub fn merge_keywords(&mut self, keywords: &[String]) {
        if keywords.is_empty() {
            return;
        }
        let mut merged: Vec<String> = keywords.to_vec();
        merged.append(&mut self.recent_keywords);
        dedup_keep_first(&mut merged, |s| s.to_lowercase());
        merged.truncate(MAX_KEYWORDS);
        self.recent_keywords = merged;
    }

    pub fn track_asset(&mut self, asset: TrackedAsset) {
        self.tracked_assets.push(asset);
    }

    /// Whether a lowercased title hits any keyword currently in cooldown.
    pub fn is_cooled_down(&self, title_lower: &str) -> bool {
        self.recent_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && title_lower.contains(&k))
    }
}

fn dedup_keep_first<F: Fn(&String) -> String>(items: &mut Vec<String>, key: F) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|it| seen.insert(key(it)));
}

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Equal, or one contains the other. An empty side never matches.
///
/// Short titles that are substrings of unrelated longer ones also match.
pub fn titles_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a)
}

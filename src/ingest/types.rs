// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One unprocessed news entry. Lives for a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub url: String,
    pub source_name: String,
    /// Raw feed date string; parsed lazily by the freshness filter.
    pub published_at: Option<String>,
}

impl CandidateItem {
    pub fn new(title: &str, url: &str, source_name: &str, published_at: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            source_name: source_name.to_string(),
            published_at: published_at.map(str::to_string),
        }
    }

    pub fn title_lower(&self) -> String {
        self.title.to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedDescriptor {
    pub name: String,
    pub endpoint: String,
}

impl FeedDescriptor {
    pub fn new(name: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

/// A field that may arrive as bare text (`<link>https://..</link>`) or as a node with
/// attributes (`<link href=".." rel="alternate"/>`).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NodeValue {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
    #[serde(rename = "@rel", default)]
    pub rel: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: Option<String>,
}

impl NodeValue {
    pub fn text(s: &str) -> Self {
        Self {
            text: Some(s.to_string()),
            ..Default::default()
        }
    }

    pub fn href(s: &str) -> Self {
        Self {
            href: Some(s.to_string()),
            ..Default::default()
        }
    }

    pub fn text_value(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn href_value(&self) -> Option<&str> {
        self.href.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Atom-style `<entry>`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    #[serde(default)]
    pub title: Option<NodeValue>,
    #[serde(default)]
    pub link: Vec<NodeValue>,
    #[serde(default)]
    pub id: Option<NodeValue>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// RSS-style `<item>`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    #[serde(default)]
    pub title: Option<NodeValue>,
    #[serde(default)]
    pub link: Option<NodeValue>,
    #[serde(default)]
    pub guid: Option<NodeValue>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Option<String>,
}

/// The two shapes a fetch+parse collaborator may hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedDocument {
    Entries(Vec<FeedEntry>),
    Items(Vec<FeedItem>),
}

/// Fetch + parse collaborator: endpoint in, normalized document out.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed: &FeedDescriptor) -> Result<FeedDocument>;
}

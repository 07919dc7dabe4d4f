// src/collab/extract.rs
// Article extraction: page url in, title + images + body text out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::image::is_junk_image;
use crate::ingest::clean_text;

pub const FALLBACK_TITLE: &str = "News Update";
const MAX_IMAGES: usize = 10;
const MAX_CONTENT_CHARS: usize = 3000;
/// Lazy-loading attributes win over `src`, which is often a placeholder.
const IMG_ATTRS: [&str; 3] = ["data-src", "data-original", "src"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    /// Primary (meta) image first, then body images.
    pub images: Vec<String>,
    pub content: String,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle>;
}

static SEL_META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[content]").unwrap());
static SEL_H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static SEL_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static SEL_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// `content` of the first `<meta property|name=key>`, entities already decoded.
fn meta_content(doc: &Html, key: &str) -> Option<String> {
    doc.select(&SEL_META).find_map(|el| {
        let attrs = el.value();
        let k = attrs.attr("property").or_else(|| attrs.attr("name"))?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let v = clean_text(attrs.attr("content")?);
        (!v.is_empty()).then_some(v)
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Pull title, images and body text out of raw html.
pub fn extract_from_html(html: &str) -> ExtractedArticle {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, "og:title")
        .or_else(|| meta_content(&doc, "twitter:title"))
        .or_else(|| {
            doc.select(&SEL_H1)
                .map(element_text)
                .find(|t| !t.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let mut images: Vec<String> = Vec::new();
    let primary = meta_content(&doc, "og:image").or_else(|| meta_content(&doc, "twitter:image"));
    images.extend(primary);
    for img in doc.select(&SEL_IMG) {
        if images.len() >= MAX_IMAGES {
            break;
        }
        let src = IMG_ATTRS
            .iter()
            .filter_map(|a| img.value().attr(a))
            .map(str::trim)
            .find(|v| v.starts_with("http://") || v.starts_with("https://"));
        if let Some(src) = src {
            if !is_junk_image(src) && !images.iter().any(|i| i == src) {
                images.push(src.to_string());
            }
        }
    }

    let mut content = doc
        .select(&SEL_P)
        .map(element_text)
        .filter(|t| t.chars().count() > 20)
        .collect::<Vec<_>>()
        .join(" ");
    if content.chars().count() < 100 {
        content = meta_content(&doc, "og:description")
            .or_else(|| meta_content(&doc, "description"))
            .unwrap_or(content);
    }
    let content: String = content.trim().chars().take(MAX_CONTENT_CHARS).collect();

    ExtractedArticle {
        title,
        images,
        content,
    }
}

/// Fetches the page over HTTP and runs `extract_from_html`. No script execution.
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building extractor http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .context("article get()")?
            .error_for_status()
            .context("article non-2xx")?
            .text()
            .await
            .context("article .text()")?;
        Ok(extract_from_html(&html))
    }
}

// Hand-written collaborator fakes shared by the integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use news_reel_publisher::assets::AssetDeleter;
use news_reel_publisher::collab::{
    Deliverer, DeliveryPayload, ExtractedArticle, Extractor, Generator, RenderJob, Renderer,
    UploadedMedia, Uploader,
};
use news_reel_publisher::history::AssetKind;
use news_reel_publisher::ingest::types::{
    FeedDescriptor, FeedDocument, FeedItem, FeedSource, NodeValue,
};
use news_reel_publisher::Collaborators;

pub fn rss_item(title: &str, link: &str, pub_date: Option<&str>) -> FeedItem {
    FeedItem {
        title: Some(NodeValue::text(title)),
        link: Some(NodeValue::text(link)),
        guid: None,
        pub_date: pub_date.map(str::to_string),
    }
}

/// Endpoint → canned document; unknown endpoints fail.
#[derive(Default)]
pub struct StaticFeeds {
    pub docs: HashMap<String, FeedDocument>,
    pub calls: Mutex<Vec<String>>,
}

impl StaticFeeds {
    pub fn with(mut self, endpoint: &str, doc: FeedDocument) -> Self {
        self.docs.insert(endpoint.to_string(), doc);
        self
    }
}

#[async_trait]
impl FeedSource for StaticFeeds {
    async fn fetch(&self, feed: &FeedDescriptor) -> Result<FeedDocument> {
        self.calls.lock().push(feed.endpoint.clone());
        self.docs
            .get(&feed.endpoint)
            .cloned()
            .ok_or_else(|| anyhow!("malformed feed at {}", feed.endpoint))
    }
}

pub struct FakeExtractor {
    pub article: ExtractedArticle,
    pub calls: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn new(article: ExtractedArticle) -> Self {
        Self {
            article,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        self.calls.lock().push(url.to_string());
        Ok(self.article.clone())
    }
}

/// Answers image prompts with `focus` and text prompts with `script`.
pub struct FakeGenerator {
    pub script: String,
    pub focus: String,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            focus: r#"{"x":"left","y":"center"}"#.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn complete_json(&self, prompt: &str, image_url: Option<&str>) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(match image_url {
            Some(_) => self.focus.clone(),
            None => self.script.clone(),
        })
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub jobs: Mutex<Vec<RenderJob>>,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        self.jobs.lock().push(job.clone());
        Ok(PathBuf::from(format!("out/{}.bin", job.composition())))
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub uploads: Mutex<Vec<(PathBuf, AssetKind, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, file: &Path, kind: AssetKind, folder: &str) -> Result<UploadedMedia> {
        if self.fail {
            return Err(anyhow!("upload rejected: 413"));
        }
        let mut uploads = self.uploads.lock();
        uploads.push((file.to_path_buf(), kind, folder.to_string()));
        let n = uploads.len();
        Ok(UploadedMedia {
            public_url: format!("https://media.test/{folder}/asset{n}"),
            asset_id: format!("{folder}/asset{n}"),
        })
    }
}

#[derive(Default)]
pub struct FakeDeliverer {
    pub payloads: Mutex<Vec<DeliveryPayload>>,
    pub fail: bool,
}

#[async_trait]
impl Deliverer for FakeDeliverer {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()> {
        if self.fail {
            return Err(anyhow!("webhook HTTP error: 500"));
        }
        self.payloads.lock().push(payload.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDeleter {
    pub deleted: Mutex<Vec<String>>,
    pub fail_ids: Vec<String>,
}

#[async_trait]
impl AssetDeleter for FakeDeleter {
    async fn delete(&self, asset_id: &str, _kind: AssetKind) -> Result<()> {
        self.deleted.lock().push(asset_id.to_string());
        if self.fail_ids.iter().any(|f| f == asset_id) {
            return Err(anyhow!("cloudinary destroy returned \"error\""));
        }
        Ok(())
    }
}

/// All fakes, kept typed so tests can inspect them after the run.
pub struct Fakes {
    pub feeds: Arc<StaticFeeds>,
    pub extractor: Arc<FakeExtractor>,
    pub generator: Arc<FakeGenerator>,
    pub renderer: Arc<FakeRenderer>,
    pub uploader: Arc<FakeUploader>,
    pub deliverer: Arc<FakeDeliverer>,
    pub deleter: Arc<FakeDeleter>,
}

impl Fakes {
    pub fn new(feeds: StaticFeeds, article: ExtractedArticle, script: &str) -> Self {
        Self {
            feeds: Arc::new(feeds),
            extractor: Arc::new(FakeExtractor::new(article)),
            generator: Arc::new(FakeGenerator::new(script)),
            renderer: Arc::new(FakeRenderer::default()),
            uploader: Arc::new(FakeUploader::default()),
            deliverer: Arc::new(FakeDeliverer::default()),
            deleter: Arc::new(FakeDeleter::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            feeds: self.feeds.clone(),
            extractor: self.extractor.clone(),
            generator: self.generator.clone(),
            renderer: self.renderer.clone(),
            uploader: self.uploader.clone(),
            deliverer: self.deliverer.clone(),
            deleter: self.deleter.clone(),
        }
    }
}

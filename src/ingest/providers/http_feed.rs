use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{FeedDescriptor, FeedDocument, FeedEntry, FeedItem, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entry: Vec<FeedEntry>,
}

/// Plain HTTP GET + quick-xml decode. Accepts RSS 2.0 (`item`) and Atom (`entry`) documents.
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("news-reel-publisher/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, feed: &FeedDescriptor) -> Result<FeedDocument> {
        let body = self
            .client
            .get(&feed.endpoint)
            .send()
            .await
            .with_context(|| format!("{} http get()", feed.name))?
            .error_for_status()
            .with_context(|| format!("{} non-2xx", feed.name))?
            .text()
            .await
            .with_context(|| format!("{} http .text()", feed.name))?;
        parse_feed_document(&body).with_context(|| format!("parsing {} feed", feed.name))
    }
}

/// Decode an RSS or Atom document into the matching shape.
pub fn parse_feed_document(xml: &str) -> Result<FeedDocument> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let doc = match root_element(&xml_clean).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            FeedDocument::Items(rss.channel.item)
        }
        Some("feed") => {
            let atom: Atom = from_str(&xml_clean).context("parsing atom xml")?;
            FeedDocument::Entries(atom.entry)
        }
        Some(other) => return Err(anyhow!("unsupported feed root <{other}>")),
        None => return Err(anyhow!("no xml root element")),
    };

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(doc)
}

/// Local name of the first element in the document, if any.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// XML has no named entities beyond the basic five; feeds still ship HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

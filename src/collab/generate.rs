//! Generation collaborator: prompt (+ optional image) in, JSON text out.
//!
//! Whatever comes back is decoded against a strict schema with field-level defaults. A
//! response that is not a usable object is replaced with the documented default document,
//! never passed on raw.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Return the model's raw JSON text for `prompt`, optionally grounded on an image.
    async fn complete_json(&self, prompt: &str, image_url: Option<&str>) -> Result<String>;
}

pub const PERSONAS: &[&str] = &["NEWS", "CELEBRATION", "EMERGENCY", "SCOUTING"];
pub const CARD_TYPES: &[&str] = &["BREAKING", "QUOTE", "STAT", "SKY"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelScript {
    pub persona: String,
    pub category: String,
    pub headline: String,
    pub sub_headline: String,
    pub facebook_description: String,
    pub slides: Vec<String>,
}

impl Default for ReelScript {
    fn default() -> Self {
        Self {
            persona: "EMERGENCY".into(),
            category: "NATIONAL".into(),
            headline: "BREAKING NEWS ALERT".into(),
            sub_headline: "Major developing story in the United States this hour.".into(),
            facebook_description: "Major news is breaking right now across the country. Authorities are working around the clock to manage the situation.\n\nStay tuned for more updates as this story develops. Follow for the latest viral news.".into(),
            slides: vec![
                "Major news is breaking right now across the country.".into(),
                "Officials have just released a critical statement on the matter.".into(),
                "The impact is expected to be felt by millions of citizens.".into(),
                "Authorities are working around the clock to manage the crisis.".into(),
                "Legal experts are already debating the long-term consequences.".into(),
                "We will continue to bring you the very latest as it happens.".into(),
            ],
        }
    }
}

impl ReelScript {
    /// Injury and surgery stories always get the emergency treatment.
    pub fn apply_persona_override(&mut self) {
        let hit = |s: &str| {
            let l = s.to_lowercase();
            l.contains("injury") || l.contains("surgery")
        };
        if hit(&self.headline) || self.slides.iter().any(|s| hit(s)) {
            self.persona = "EMERGENCY".into();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardContent {
    #[serde(rename = "type")]
    pub card_type: String,
    pub category: String,
    pub title: String,
    pub sub_headline: String,
    pub facebook_description: String,
    pub quote_author: Option<String>,
    pub stat_value: Option<String>,
    pub stat_label: Option<String>,
}

impl Default for CardContent {
    fn default() -> Self {
        Self {
            card_type: "BREAKING".into(),
            category: "SPORTS".into(),
            title: "BREAKING SPORTS UPDATE".into(),
            sub_headline: "A major story is developing right now.".into(),
            facebook_description: "A major story is developing right now.\n\nDiscover the story 👇 #TheVitalSport".into(),
            quote_author: None,
            stat_value: None,
            stat_label: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Top,
    Center,
    Bottom,
}

/// Where the subject's face sits in the background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: Horizontal,
    pub y: Vertical,
}

impl Default for FocusPoint {
    fn default() -> Self {
        Self {
            x: Horizontal::Center,
            y: Vertical::Top,
        }
    }
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(m)) => Some(m),
        _ => None,
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn one_of(value: Option<String>, allowed: &[&str], default: &str) -> String {
    value
        .map(|v| v.to_uppercase())
        .filter(|v| allowed.contains(&v.as_str()))
        .unwrap_or_else(|| default.to_string())
}

/// Decode a reel script. No object, or neither headline nor slides, means the default.
pub fn decode_reel_script(raw: &str) -> (ReelScript, bool) {
    let Some(obj) = parse_object(raw) else {
        return (ReelScript::default(), false);
    };
    let headline = str_field(&obj, "headline");
    let slides: Vec<String> = obj
        .get("slides")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if headline.is_none() && slides.is_empty() {
        return (ReelScript::default(), false);
    }

    let sub_headline = str_field(&obj, "subHeadline").unwrap_or_default();
    let slides = if slides.is_empty() {
        vec![if sub_headline.is_empty() {
            "Developing situation...".to_string()
        } else {
            sub_headline.clone()
        }]
    } else {
        slides
    };

    let script = ReelScript {
        persona: one_of(str_field(&obj, "persona"), PERSONAS, "NEWS"),
        category: str_field(&obj, "category")
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "NATIONAL".into()),
        headline: headline
            .map(|h| h.to_uppercase())
            .unwrap_or_else(|| "BREAKING UPDATE".into()),
        facebook_description: str_field(&obj, "facebookDescription")
            .unwrap_or_else(|| sub_headline.clone()),
        sub_headline,
        slides,
    };
    (script, true)
}

/// Decode card content. A missing title means the default card.
pub fn decode_card_content(raw: &str) -> (CardContent, bool) {
    let Some(obj) = parse_object(raw) else {
        return (CardContent::default(), false);
    };
    let Some(title) = str_field(&obj, "title").or_else(|| str_field(&obj, "headline")) else {
        return (CardContent::default(), false);
    };
    let defaults = CardContent::default();
    let sub_headline = str_field(&obj, "subHeadline").unwrap_or_default();
    let card = CardContent {
        card_type: one_of(str_field(&obj, "type"), CARD_TYPES, "BREAKING"),
        category: str_field(&obj, "category")
            .map(|c| c.to_uppercase())
            .unwrap_or(defaults.category),
        title: title.to_uppercase(),
        facebook_description: str_field(&obj, "facebookDescription")
            .unwrap_or_else(|| sub_headline.clone()),
        sub_headline,
        quote_author: str_field(&obj, "quoteAuthor"),
        stat_value: str_field(&obj, "statValue"),
        stat_label: str_field(&obj, "statLabel"),
    };
    (card, true)
}

/// Decode a focus answer; anything unusable falls back to center/top per axis.
pub fn decode_focus(raw: &str) -> FocusPoint {
    let Some(obj) = parse_object(raw) else {
        return FocusPoint::default();
    };
    let d = FocusPoint::default();
    let x = match str_field(&obj, "x").map(|s| s.to_lowercase()).as_deref() {
        Some("left") => Horizontal::Left,
        Some("right") => Horizontal::Right,
        Some("center") => Horizontal::Center,
        _ => d.x,
    };
    let y = match str_field(&obj, "y").map(|s| s.to_lowercase()).as_deref() {
        Some("center") => Vertical::Center,
        Some("bottom") => Vertical::Bottom,
        Some("top") => Vertical::Top,
        _ => d.y,
    };
    FocusPoint { x, y }
}

pub fn reel_prompt(content: &str) -> String {
    format!(
        r#"You are a PROFESSIONAL SPORTS JOURNALIST creating a 30-40 second video story.
The content may be BREAKING NEWS, a HISTORICAL RECORD, or an INTERESTING FACT.

Rules:
1. Never repeat a phrase, word or idea across slides. Each slide adds new information.
2. No generic templates; use specific details.
3. Five slides, 20-25 words each: hook, build-up, core fact, significance, legacy.
4. Do not start every slide with the player's name. No slide numbers.
5. Perfect English even if the source is Spanish.

"headline": 3-5 words, must include a team or player keyword.
"subHeadline": teaser of 10-12 words.
"facebookDescription": two paragraphs; the second is "Discover the story 👇" followed by hashtags such as #TheVitalSport and sport-specific ones.

News Content:
{content}

Return ONLY valid JSON:
{{"persona": "NEWS|CELEBRATION|EMERGENCY|SCOUTING", "category": "ONE WORD SPORT", "headline": "...", "subHeadline": "...", "facebookDescription": "...", "slides": ["...", "...", "...", "...", "..."]}}"#
    )
}

pub fn card_prompt(content: &str, title: &str) -> String {
    format!(
        r#"You are a sports social editor designing ONE static news card.
Pick the card type that fits best: BREAKING (a headline), QUOTE (a striking quote, set quoteAuthor), STAT (one headline number, set statValue and statLabel) or SKY (photo-led).

"title": 3-7 words, must include a team or player keyword.
"subHeadline": one sentence teaser.
"facebookDescription": two paragraphs; the second is "Discover the story 👇" followed by hashtags such as #TheVitalSport.

Article title: {title}
Article content:
{content}

Return ONLY valid JSON:
{{"type": "BREAKING|QUOTE|STAT|SKY", "category": "ONE WORD SPORT", "title": "...", "subHeadline": "...", "facebookDescription": "...", "quoteAuthor": null, "statValue": null, "statLabel": null}}"#
    )
}

pub const FOCUS_PROMPT: &str = r#"Analyze this image. Where is the MAIN SUBJECT'S FACE located?
Return a JSON object with two fields:
"x": "left", "center", or "right"
"y": "top", "center", or "bottom"
Example: {"x": "center", "y": "top"}"#;

/// Groq's OpenAI-compatible chat completions endpoint, JSON response mode.
pub struct GroqGenerator {
    http: reqwest::Client,
    api_key: String,
    text_model: String,
    vision_model: String,
    endpoint: String,
}

impl GroqGenerator {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("news-reel-publisher/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building generator http client")?;
        Ok(Self {
            http,
            api_key,
            text_model: "llama-3.3-70b-versatile".into(),
            vision_model: "meta-llama/llama-4-scout-17b-16e-instruct".into(),
            endpoint: "https://api.groq.com/openai/v1/chat/completions".into(),
        })
    }

    pub fn with_models(mut self, text: &str, vision: &str) -> Self {
        self.text_model = text.to_string();
        self.vision_model = vision.to_string();
        self
    }
}

#[async_trait]
impl Generator for GroqGenerator {
    async fn complete_json(&self, prompt: &str, image_url: Option<&str>) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("GROQ_API_KEY is not set"));
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let (model, content) = match image_url {
            Some(url) => (
                self.vision_model.as_str(),
                serde_json::json!([
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": url}}
                ]),
            ),
            None => (self.text_model.as_str(), Value::String(prompt.to_string())),
        };
        let req = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": content}],
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("groq request")?
            .error_for_status()
            .context("groq non-2xx")?;
        let body: Resp = resp.json().await.context("groq response body")?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

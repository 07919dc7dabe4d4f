//! Render collaborator: a structured job in, a local media file out.
//!
//! The production renderer shells out to an external command (a Remotion CLI by default),
//! handing it a props JSON file. The command line is a template with `{mode}`,
//! `{composition}`, `{output}` and `{props}` placeholders.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::generate::{CardContent, FocusPoint, ReelScript};

pub const FPS: u32 = 30;
pub const DEFAULT_RENDER_COMMAND: &str =
    "npx remotion {mode} remotion/index.ts {composition} {output} --props={props}";

/// Frames for a reel: first slide 7 s, every further slide 5 s, then a 2.5 s outro.
pub fn reel_duration_frames(slides: usize) -> u32 {
    let extra = slides.saturating_sub(1) as u32;
    (7 + extra * 5) * FPS + FPS * 5 / 2
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelProps {
    pub title: String,
    pub sub_headline: String,
    pub slides: Vec<String>,
    pub category: String,
    pub background_images: Vec<String>,
    pub focus_point: FocusPoint,
    pub duration_in_frames: u32,
    pub persona: String,
}

impl ReelProps {
    pub fn new(script: &ReelScript, image_url: &str, focus: FocusPoint) -> Self {
        Self {
            title: script.headline.clone(),
            sub_headline: script.sub_headline.clone(),
            slides: script.slides.clone(),
            category: script.category.clone(),
            background_images: vec![image_url.to_string()],
            focus_point: focus,
            duration_in_frames: reel_duration_frames(script.slides.len()),
            persona: script.persona.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProps {
    pub title: String,
    pub sub_headline: String,
    pub image: String,
    pub category: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub quote_author: Option<String>,
    pub stat_value: Option<String>,
    pub stat_label: Option<String>,
    pub focus_point: FocusPoint,
}

impl CardProps {
    pub fn new(card: &CardContent, image_url: &str, focus: FocusPoint) -> Self {
        Self {
            title: card.title.clone(),
            sub_headline: card.sub_headline.clone(),
            image: image_url.to_string(),
            category: card.category.clone(),
            card_type: card.card_type.clone(),
            quote_author: card.quote_author.clone(),
            stat_value: card.stat_value.clone(),
            stat_label: card.stat_label.clone(),
            focus_point: focus,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderJob {
    Reel(ReelProps),
    Card(CardProps),
}

impl RenderJob {
    pub fn composition(&self) -> &'static str {
        match self {
            RenderJob::Reel(_) => "NewsVideo",
            RenderJob::Card(_) => "NewsCard",
        }
    }

    fn mode(&self) -> &'static str {
        match self {
            RenderJob::Reel(_) => "render",
            RenderJob::Card(_) => "still",
        }
    }

    fn output_name(&self) -> &'static str {
        match self {
            RenderJob::Reel(_) => "video.mp4",
            RenderJob::Card(_) => "card.png",
        }
    }

    pub fn props_json(&self) -> Result<String> {
        let s = match self {
            RenderJob::Reel(p) => serde_json::to_string_pretty(p),
            RenderJob::Card(p) => serde_json::to_string_pretty(p),
        };
        s.context("serializing render props")
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf>;
}

pub struct CommandRenderer {
    template: String,
    out_dir: PathBuf,
}

impl CommandRenderer {
    pub fn new(template: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Expand the template into program + args.
    pub fn command_line(
        &self,
        job: &RenderJob,
        output: &Path,
        props: &Path,
    ) -> Result<Vec<String>> {
        let argv: Vec<String> = self
            .template
            .split_whitespace()
            .map(|tok| {
                tok.replace("{mode}", job.mode())
                    .replace("{composition}", job.composition())
                    .replace("{output}", &output.to_string_lossy())
                    .replace("{props}", &props.to_string_lossy())
            })
            .collect();
        if argv.is_empty() {
            return Err(anyhow!("render command is empty"));
        }
        Ok(argv)
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("creating {}", self.out_dir.display()))?;

        let props = self
            .out_dir
            .join(format!("{}.props.json", job.composition()));
        tokio::fs::write(&props, job.props_json()?)
            .await
            .with_context(|| format!("writing {}", props.display()))?;

        let output = self.out_dir.join(job.output_name());
        let argv = self.command_line(job, &output, &props)?;
        tracing::info!(command = %argv.join(" "), "starting render");

        let status = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("spawning {}", argv[0]))?;
        if !status.success() {
            return Err(anyhow!("render command exited with {status}"));
        }

        let meta = tokio::fs::metadata(&output)
            .await
            .with_context(|| format!("render produced no file at {}", output.display()))?;
        if meta.len() == 0 {
            return Err(anyhow!("render produced an empty file at {}", output.display()));
        }
        Ok(output)
    }
}

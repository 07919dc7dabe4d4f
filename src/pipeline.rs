//! Pipeline orchestrator.
//!
//! Stage order is fixed: sweep + persist, aggregate, freshness, dedup, select, extract,
//! image, focus, generate, render, upload, deliver, record + persist. The first failing stage
//! ends the run. Only the sweep checkpoint and the final record ever touch the store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assets::{self, AssetDeleter, SweepOutcome};
use crate::collab::generate::{
    card_prompt, decode_card_content, decode_focus, decode_reel_script, reel_prompt, FOCUS_PROMPT,
};
use crate::collab::render::{CardProps, ReelProps};
use crate::collab::{
    CloudinaryClient, CommandRenderer, Deliverer, DeliveryPayload, ExtractedArticle, Extractor,
    FocusPoint, Generator, GroqGenerator, HttpExtractor, RenderJob, Renderer, Uploader,
    WebhookDeliverer,
};
use crate::config::{Credentials, PipelineConfig, Variant};
use crate::error::{PipelineError, Stage};
use crate::filter::{dedup_filter, freshness_filter};
use crate::history::{HistoryRecord, HistoryStore, LoadReport};
use crate::image::{resolve_image, ImageRequest, ResolvedImage};
use crate::ingest::providers::http_feed::HttpFeedSource;
use crate::ingest::types::{CandidateItem, FeedDescriptor, FeedSource};
use crate::ingest::aggregate;
use crate::select::{select_candidate, trigger_keywords_in, SelectOptions};

pub const MANUAL_TITLE: &str = "Manual Request Story";
pub const MANUAL_SOURCE: &str = "Manual";
/// Extracted bodies shorter than this are replaced by the story title as context.
const MIN_CONTEXT_CHARS: usize = 50;

/// Every external dependency of a run.
#[derive(Clone)]
pub struct Collaborators {
    pub feeds: Arc<dyn FeedSource>,
    pub extractor: Arc<dyn Extractor>,
    pub generator: Arc<dyn Generator>,
    pub renderer: Arc<dyn Renderer>,
    pub uploader: Arc<dyn Uploader>,
    pub deliverer: Arc<dyn Deliverer>,
    pub deleter: Arc<dyn AssetDeleter>,
}

impl Collaborators {
    /// HTTP / process-backed collaborators for a real run.
    pub fn production(cfg: &PipelineConfig, creds: &Credentials) -> Result<Self> {
        let cloudinary = Arc::new(CloudinaryClient::new(
            creds.cloudinary.clone(),
            cfg.service_timeout(),
        )?);
        Ok(Self {
            feeds: Arc::new(HttpFeedSource::new(cfg.fetch_timeout())?),
            extractor: Arc::new(HttpExtractor::new(cfg.extract_timeout())?),
            generator: Arc::new(GroqGenerator::new(
                creds.groq_api_key.clone(),
                cfg.service_timeout(),
            )?),
            renderer: Arc::new(CommandRenderer::new(
                cfg.render_command.clone(),
                cfg.render_out_dir.clone(),
            )),
            uploader: cloudinary.clone(),
            deliverer: Arc::new(
                WebhookDeliverer::new(creds.webhook_url.clone())
                    .with_timeout(cfg.service_timeout()),
            ),
            deleter: cloudinary,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        url: String,
        title: String,
        media_url: String,
        asset_id: String,
    },
    /// Test mode: rendered locally, nothing uploaded, delivered or recorded.
    DryRun { url: String, media_path: PathBuf },
}

/// Run `fut` under `limit`, mapping failure and timeout to a stage-tagged abort.
async fn call_stage<T, F>(stage: Stage, limit: Duration, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T>>,
{
    let t0 = Instant::now();
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => {
            tracing::debug!(stage = %stage, ms = t0.elapsed().as_millis() as u64, "stage ok");
            Ok(v)
        }
        Ok(Err(e)) => {
            tracing::warn!(stage = %stage, error = ?e, "stage failed");
            Err(PipelineError::external(stage, e))
        }
        Err(_) => {
            tracing::warn!(stage = %stage, after_secs = limit.as_secs(), "stage timed out");
            Err(PipelineError::StageTimeout { stage, after: limit })
        }
    }
}

/// The generated copy every variant needs downstream of render.
struct GeneratedCopy {
    job: RenderJob,
    headline: String,
    caption: String,
    sub_headline: String,
    category: String,
}

pub struct Pipeline {
    cfg: PipelineConfig,
    feeds: Vec<FeedDescriptor>,
    store: Arc<dyn HistoryStore>,
    collab: Collaborators,
    rng: StdRng,
    last_sweep: Option<SweepOutcome>,
}

impl Pipeline {
    pub fn new(
        cfg: PipelineConfig,
        feeds: Vec<FeedDescriptor>,
        store: Arc<dyn HistoryStore>,
        collab: Collaborators,
    ) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            cfg,
            feeds,
            store,
            collab,
            rng,
            last_sweep: None,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Outcome of the most recent sweep, if a run got that far.
    pub fn last_sweep(&self) -> Option<&SweepOutcome> {
        self.last_sweep.as_ref()
    }

    /// One full run. Aborts are returned, never panicked.
    pub async fn run(&mut self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        crate::telemetry::describe_metrics();
        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);

        let res = self.run_stages(now).await;
        match &res {
            Ok(RunOutcome::Published { url, media_url, .. }) => {
                counter!("pipeline_published_total").increment(1);
                tracing::info!(%url, %media_url, "run published");
            }
            Ok(RunOutcome::DryRun { media_path, .. }) => {
                tracing::info!(
                    media = %media_path.display(),
                    "test mode run finished, nothing published"
                );
            }
            Err(e) => {
                counter!("pipeline_aborts_total", "reason" => e.reason()).increment(1);
                tracing::warn!(
                    reason = e.reason(),
                    stage = ?e.stage().map(|s| s.as_str()),
                    error = %e,
                    "run aborted"
                );
            }
        }
        res
    }

    async fn run_stages(&mut self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let mut record = self.load_history();

        // sweep checkpoint
        let sweep = assets::sweep(
            &mut record,
            now,
            self.cfg.retention(),
            self.collab.deleter.as_ref(),
            self.cfg.service_timeout(),
        )
        .await;
        tracing::info!(
            stage = %Stage::Sweep,
            swept = sweep.swept.len(),
            kept = sweep.kept,
            delete_failures = sweep.delete_failures.len(),
            "sweep finished"
        );
        self.last_sweep = Some(sweep);
        self.store.save(&record).map_err(PipelineError::HistoryWrite)?;

        let manual = self.cfg.manual_url.is_some();
        let (candidate, mut triggers) = self.pick_candidate(&record, now).await?;

        let article = call_stage(
            Stage::Extract,
            self.cfg.extract_timeout(),
            self.collab.extractor.extract(&candidate.url),
        )
        .await?;
        tracing::info!(
            stage = %Stage::Extract,
            title = %article.title,
            images = article.images.len(),
            chars = article.content.chars().count(),
            "article extracted"
        );

        let story_title = if manual {
            article.title.clone()
        } else {
            candidate.title.clone()
        };
        if manual {
            triggers = trigger_keywords_in(&story_title);
        }

        let image = self.resolve_image(&candidate, &article)?;
        let focus = self.focus_point(&image.url).await;
        let context = generation_context(&article, &story_title);
        let copy = self.generate(&context, &story_title, &image, focus).await?;

        let media_path = call_stage(
            Stage::Render,
            self.cfg.render_timeout(),
            self.collab.renderer.render(&copy.job),
        )
        .await?;
        tracing::info!(stage = %Stage::Render, media = %media_path.display(), "media rendered");

        if self.cfg.test_mode {
            return Ok(RunOutcome::DryRun {
                url: candidate.url,
                media_path,
            });
        }

        let kind = self.cfg.variant.asset_kind();
        let uploaded = call_stage(
            Stage::Upload,
            self.cfg.service_timeout(),
            self.collab
                .uploader
                .upload(&media_path, kind, &self.cfg.upload_folder),
        )
        .await?;

        let payload = DeliveryPayload::new(
            &uploaded.public_url,
            &copy.headline,
            &copy.caption,
            &copy.sub_headline,
            &copy.category,
            now,
        );
        call_stage(
            Stage::Deliver,
            self.cfg.service_timeout(),
            self.collab.deliverer.deliver(&payload),
        )
        .await?;

        let recorded_title = self.cfg.dedup_titles.then_some(story_title.as_str());
        assets::record_publish(
            &mut record,
            &candidate.url,
            recorded_title,
            &triggers,
            &uploaded.asset_id,
            kind,
            now,
        );
        self.store.save(&record).map_err(PipelineError::HistoryWrite)?;
        tracing::info!(
            stage = %Stage::Record,
            asset_id = %uploaded.asset_id,
            keywords = ?triggers,
            "history recorded"
        );

        Ok(RunOutcome::Published {
            url: candidate.url,
            title: story_title,
            media_url: uploaded.public_url,
            asset_id: uploaded.asset_id,
        })
    }

    fn load_history(&self) -> HistoryRecord {
        let (record, report) = self.store.load();
        match &report {
            LoadReport::Missing => tracing::info!("no history yet, starting empty"),
            LoadReport::Loaded => tracing::debug!(
                urls = record.posted_urls.len(),
                assets = record.tracked_assets.len(),
                "history loaded"
            ),
            LoadReport::Recovered { reason } => {
                tracing::warn!(%reason, "history malformed, continuing with recovered record")
            }
        }
        record
    }

    /// Manual url, or aggregate → freshness → dedup → select.
    async fn pick_candidate(
        &mut self,
        record: &HistoryRecord,
        now: DateTime<Utc>,
    ) -> Result<(CandidateItem, Vec<String>), PipelineError> {
        let checks = self.cfg.dedup_checks();

        if let Some(url) = self.cfg.manual_url.clone() {
            tracing::info!(%url, "manual url set, skipping feed selection");
            let manual = CandidateItem::new(MANUAL_TITLE, &url, MANUAL_SOURCE, None);
            let mut kept = dedup_filter(vec![manual], record, checks)?.kept;
            return Ok((kept.remove(0), Vec::new()));
        }

        let report = aggregate(
            self.collab.feeds.as_ref(),
            &self.feeds,
            self.cfg.fetch_concurrency,
        )
        .await;

        let fresh = freshness_filter(report.items, now, self.cfg.freshness_window())?;
        tracing::info!(
            stage = %Stage::Freshness,
            pool = fresh.pool.len(),
            fresh = fresh.fresh,
            undated = fresh.undated,
            used_undated = fresh.used_undated,
            boosted = fresh.boosted,
            "freshness filter applied"
        );

        let deduped = dedup_filter(fresh.pool, record, checks)?;
        tracing::info!(
            stage = %Stage::Dedup,
            kept = deduped.kept.len(),
            url_hits = deduped.url_hits,
            title_hits = deduped.title_hits,
            "dedup filter applied"
        );

        let opts = SelectOptions {
            most_recent_fallback: self.cfg.cooldown_fallback,
        };
        let selection = select_candidate(&deduped.kept, record, &mut self.rng, opts)?;
        tracing::info!(
            stage = %Stage::Select,
            title = %selection.candidate.title,
            url = %selection.candidate.url,
            source = %selection.candidate.source_name,
            "candidate selected"
        );
        Ok((selection.candidate, selection.trigger_keywords))
    }

    fn resolve_image(
        &self,
        candidate: &CandidateItem,
        article: &ExtractedArticle,
    ) -> Result<ResolvedImage, PipelineError> {
        let req = ImageRequest {
            manual_override: self.cfg.manual_image_url.as_deref(),
            extracted_primary: article.images.first().map(String::as_str),
            titles: vec![candidate.title.as_str(), article.title.as_str()],
            strict: self.cfg.strict_images,
        };
        let image = resolve_image(&req)?;
        tracing::info!(
            stage = %Stage::Image,
            url = %image.url,
            source = ?image.source,
            "image resolved"
        );
        Ok(image)
    }

    /// Non-fatal: any failure falls back to the default focus point.
    async fn focus_point(&self, image_url: &str) -> FocusPoint {
        let res = call_stage(
            Stage::Focus,
            self.cfg.service_timeout(),
            self.collab.generator.complete_json(FOCUS_PROMPT, Some(image_url)),
        )
        .await;
        match res {
            Ok(raw) => decode_focus(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "focus detection failed, using default");
                FocusPoint::default()
            }
        }
    }

    async fn generate(
        &self,
        context: &str,
        title: &str,
        image: &ResolvedImage,
        focus: FocusPoint,
    ) -> Result<GeneratedCopy, PipelineError> {
        let prompt = match self.cfg.variant {
            Variant::Reel => reel_prompt(context),
            Variant::Card => card_prompt(context, title),
        };
        let raw = call_stage(
            Stage::Generate,
            self.cfg.service_timeout(),
            self.collab.generator.complete_json(&prompt, None),
        )
        .await?;

        let copy = match self.cfg.variant {
            Variant::Reel => {
                let (mut script, ok) = decode_reel_script(&raw);
                if !ok {
                    tracing::warn!(
                        stage = %Stage::Generate,
                        "unusable script, using default document"
                    );
                }
                script.apply_persona_override();
                tracing::info!(
                    stage = %Stage::Generate,
                    headline = %script.headline,
                    persona = %script.persona,
                    slides = script.slides.len(),
                    "script generated"
                );
                GeneratedCopy {
                    job: RenderJob::Reel(ReelProps::new(&script, &image.url, focus)),
                    headline: script.headline,
                    caption: script.facebook_description,
                    sub_headline: script.sub_headline,
                    category: script.category,
                }
            }
            Variant::Card => {
                let (card, ok) = decode_card_content(&raw);
                if !ok {
                    tracing::warn!(
                        stage = %Stage::Generate,
                        "unusable card content, using default document"
                    );
                }
                tracing::info!(
                    stage = %Stage::Generate,
                    title = %card.title,
                    card_type = %card.card_type,
                    "card generated"
                );
                GeneratedCopy {
                    job: RenderJob::Card(CardProps::new(&card, &image.url, focus)),
                    headline: card.title,
                    caption: card.facebook_description,
                    sub_headline: card.sub_headline,
                    category: card.category,
                }
            }
        };
        Ok(copy)
    }
}

fn generation_context(article: &ExtractedArticle, title: &str) -> String {
    if article.content.chars().count() < MIN_CONTEXT_CHARS {
        tracing::warn!(
            chars = article.content.chars().count(),
            "extracted content too short, using title as context"
        );
        return title.to_string();
    }
    article.content.clone()
}

// src/error.rs
use std::time::Duration;

use thiserror::Error;

/// Stage names used in logs, metrics and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sweep,
    Aggregate,
    Freshness,
    Dedup,
    Select,
    Extract,
    Image,
    Focus,
    Generate,
    Render,
    Upload,
    Deliver,
    Record,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Sweep => "sweep",
            Stage::Aggregate => "aggregate",
            Stage::Freshness => "freshness",
            Stage::Dedup => "dedup",
            Stage::Select => "select",
            Stage::Extract => "extract",
            Stage::Image => "image",
            Stage::Focus => "focus",
            Stage::Generate => "generate",
            Stage::Render => "render",
            Stage::Upload => "upload",
            Stage::Deliver => "deliver",
            Stage::Record => "record",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal reasons for a run. Every variant ends the run with no history mutation
/// beyond the sweep checkpoint.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no candidates after aggregation and freshness filtering")]
    NoCandidates,
    #[error("every remaining candidate was already posted")]
    AllDuplicates,
    #[error("all candidates are in topic cooldown")]
    CooldownExhausted,
    #[error("no qualifying image for the selected candidate")]
    NoQualifyingImage,
    #[error("{stage} failed: {source:#}")]
    ExternalServiceFailure {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
    #[error("{stage} timed out after {after:?}")]
    StageTimeout { stage: Stage, after: Duration },
    #[error("history could not be persisted: {0:#}")]
    HistoryWrite(#[source] anyhow::Error),
}

impl PipelineError {
    pub fn external(stage: Stage, source: anyhow::Error) -> Self {
        PipelineError::ExternalServiceFailure { stage, source }
    }

    /// Stable label for logs and the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineError::NoCandidates => "no_candidates",
            PipelineError::AllDuplicates => "all_duplicates",
            PipelineError::CooldownExhausted => "cooldown_exhausted",
            PipelineError::NoQualifyingImage => "no_qualifying_image",
            PipelineError::ExternalServiceFailure { .. } => "external_service_failure",
            PipelineError::StageTimeout { .. } => "stage_timeout",
            PipelineError::HistoryWrite(_) => "history_write",
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::ExternalServiceFailure { stage, .. }
            | PipelineError::StageTimeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

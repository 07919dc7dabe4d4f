// src/filter/dedup.rs
use std::collections::HashSet;

use crate::error::PipelineError;
use crate::history::{normalize_title, titles_overlap, HistoryRecord};
use crate::ingest::types::CandidateItem;

/// Which history checks are enabled. Both are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupChecks {
    pub urls: bool,
    pub titles: bool,
}

impl Default for DedupChecks {
    fn default() -> Self {
        Self {
            urls: true,
            titles: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub kept: Vec<CandidateItem>,
    pub url_hits: usize,
    pub title_hits: usize,
    /// Same url repeated across feeds within this run.
    pub repeated: usize,
}

/// Drop candidates already represented in `history`. Order of survivors is preserved.
pub fn dedup_filter(
    items: Vec<CandidateItem>,
    history: &HistoryRecord,
    checks: DedupChecks,
) -> Result<DedupOutcome, PipelineError> {
    let posted_titles: Vec<String> = if checks.titles {
        history
            .posted_titles
            .iter()
            .map(|t| normalize_title(t))
            .collect()
    } else {
        Vec::new()
    };

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut out = DedupOutcome {
        kept: Vec::with_capacity(items.len()),
        url_hits: 0,
        title_hits: 0,
        repeated: 0,
    };

    for it in items {
        if checks.urls && history.is_url_posted(&it.url) {
            tracing::debug!(url = %it.url, "already posted (url)");
            out.url_hits += 1;
            continue;
        }
        if checks.titles {
            let norm = normalize_title(&it.title);
            if posted_titles.iter().any(|p| titles_overlap(&norm, p)) {
                tracing::debug!(title = %it.title, "already posted (title)");
                out.title_hits += 1;
                continue;
            }
        }
        if !seen_urls.insert(it.url.clone()) {
            out.repeated += 1;
            continue;
        }
        out.kept.push(it);
    }

    if out.kept.is_empty() {
        return Err(PipelineError::AllDuplicates);
    }
    Ok(out)
}

//! Topic bucketing & selection.
//!
//! Cooled-down candidates are removed first. The rest are sorted into non-exclusive topic
//! buckets; a non-empty bucket is picked uniformly, then a candidate uniformly within it,
//! so a one-item bucket is as likely as a twenty-item one.

use rand::Rng;

use crate::error::PipelineError;
use crate::history::HistoryRecord;
use crate::ingest::types::CandidateItem;

#[derive(Debug, Clone, Copy)]
pub struct TopicBucket {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl TopicBucket {
    pub fn matches(&self, title_lower: &str) -> bool {
        self.keywords.iter().any(|k| title_lower.contains(k))
    }
}

pub const BUCKETS: &[TopicBucket] = &[
    TopicBucket {
        name: "soccer",
        keywords: &[
            "champions league", "premier league", "laliga", "serie a", "bundesliga",
            "madrid", "barça", "barcelona", "atletico", "manchester", "liverpool", "arsenal",
            "chelsea", "haaland", "mbappé", "bellingham", "yamal", "vinícius", "salah", "kane",
            "lewandowski", "psg", "bayern", "leverkusen", "dortmund", "inter milan", "juventus",
            "milan",
        ],
    },
    TopicBucket {
        name: "nba",
        keywords: &[
            "nba", "lebron", "curry", "lakers", "celtics", "warriors", "mavericks", "nuggets",
            "jokic", "doncic", "antetokounmpo", "giannis", "wembanyama", "suns", "heat",
        ],
    },
    TopicBucket {
        name: "variety",
        keywords: &[
            "f1", "formula 1", "verstappen", "hamilton", "ferrari", "red bull", "super bowl",
            "mahomes", "nfl", "draft", "ohtani", "dodgers", "yankees", "mlb", "alcaraz",
            "djokovic", "sinner", "tennis", "olympic", "winter games", "gold medal",
        ],
    },
];

/// Subjects that go into cooldown once a story about them is published.
pub const TRIGGER_KEYWORDS: &[&str] = &[
    "Barcelona", "Barça", "Madrid", "Messi", "Ronaldo", "Mbappé", "LeBron", "Curry", "Mahomes",
    "Ohtani", "Verstappen", "Hamilton",
];

#[derive(Debug, Clone)]
pub struct Selection {
    pub candidate: CandidateItem,
    /// `None` when the most-recent fallback picked the candidate.
    pub bucket: Option<&'static str>,
    pub bucket_size: usize,
    pub cooled_down: usize,
    /// Trigger keywords found in the chosen title; merged into history on success.
    pub trigger_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    /// Pick the newest candidate when every bucket is empty instead of aborting.
    pub most_recent_fallback: bool,
}

pub fn trigger_keywords_in(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    TRIGGER_KEYWORDS
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .map(|k| k.to_string())
        .collect()
}

/// Bucket the candidates that survive the cooldown. Returns non-empty buckets in table
/// order plus the number of cooled-down candidates.
pub fn bucketize<'a>(
    items: &'a [CandidateItem],
    history: &HistoryRecord,
) -> (Vec<(&'static str, Vec<&'a CandidateItem>)>, usize) {
    let mut buckets: Vec<(&'static str, Vec<&CandidateItem>)> =
        BUCKETS.iter().map(|b| (b.name, Vec::new())).collect();
    let mut cooled = 0usize;

    for it in items {
        let lower = it.title_lower();
        if history.is_cooled_down(&lower) {
            cooled += 1;
            continue;
        }
        for (def, (_, members)) in BUCKETS.iter().zip(buckets.iter_mut()) {
            if def.matches(&lower) {
                members.push(it);
            }
        }
    }

    buckets.retain(|(_, members)| !members.is_empty());
    (buckets, cooled)
}

/// Pick one candidate. `items` must be newest-first for the fallback to mean anything.
pub fn select_candidate<R: Rng + ?Sized>(
    items: &[CandidateItem],
    history: &HistoryRecord,
    rng: &mut R,
    opts: SelectOptions,
) -> Result<Selection, PipelineError> {
    let (buckets, cooled) = bucketize(items, history);

    if buckets.is_empty() {
        let Some(newest) = items.first().filter(|_| opts.most_recent_fallback) else {
            return Err(PipelineError::CooldownExhausted);
        };
        tracing::warn!(
            cooled,
            title = %newest.title,
            "every bucket empty, falling back to most recent candidate"
        );
        return Ok(Selection {
            trigger_keywords: trigger_keywords_in(&newest.title),
            candidate: newest.clone(),
            bucket: None,
            bucket_size: 0,
            cooled_down: cooled,
        });
    }

    let (name, members) = &buckets[rng.random_range(0..buckets.len())];
    let chosen = members[rng.random_range(0..members.len())];
    tracing::info!(
        bucket = *name,
        candidates = members.len(),
        buckets = buckets.len(),
        cooled,
        "bucket selected"
    );

    Ok(Selection {
        trigger_keywords: trigger_keywords_in(&chosen.title),
        candidate: chosen.clone(),
        bucket: Some(*name),
        bucket_size: members.len(),
        cooled_down: cooled,
    })
}

//! Freshness & impact: narrow the aggregate to recent, topically significant candidates.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cmp::Reverse;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::error::PipelineError;
use crate::ingest::types::CandidateItem;

/// Titles containing any of these win the soft boost.
pub const IMPACT_KEYWORDS: &[&str] = &[
    // Real Madrid & Barcelona
    "real madrid", "madrid", "barcelona", "barça", "el clasico", "la liga",
    // soccer stars
    "messi", "ronaldo", "mbappe", "vinicius", "vini jr", "bellingham", "haaland", "neymar",
    "lewandowski", "yamal", "salah", "kane", "wirtz", "musiala",
    // NBA
    "lebron", "curry", "lakers", "nba", "jokic", "doncic", "wembanyama", "giannis", "durant",
    // NFL & MLB
    "mahomes", "nfl", "draft", "super bowl", "ohtani", "dodgers", "yankees", "mlb",
    // F1, tennis
    "f1", "formula 1", "verstappen", "hamilton", "ferrari", "red bull", "norris",
    "djokovic", "alcaraz", "sinner", "tennis",
    // general impact
    "breaking", "legend", "record", "viral", "miracle", "shocking", "epic", "historic",
];

#[derive(Debug, Clone)]
pub struct FreshnessOutcome {
    /// Newest first; undated entries sort last.
    pub pool: Vec<CandidateItem>,
    pub fresh: usize,
    pub undated: usize,
    /// True when the pool fell back to undated candidates.
    pub used_undated: bool,
    /// True when the impact subset replaced the full pool.
    pub boosted: bool,
}

/// Parse a feed date. RFC 2822 (RSS) and RFC 3339 (Atom) are accepted; chrono's
/// RFC 2822 parser is tried last for obsolete zone names.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = OffsetDateTime::parse(raw, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), dt.nanosecond()).single());
    parsed.or_else(|| {
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

pub fn has_impact_keyword(title_lower: &str) -> bool {
    IMPACT_KEYWORDS.iter().any(|k| title_lower.contains(k))
}

/// Keep candidates published within `window` of `now`; fall back to undated ones.
/// Dated-but-stale candidates are dropped entirely.
pub fn freshness_filter(
    items: Vec<CandidateItem>,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<FreshnessOutcome, PipelineError> {
    let mut fresh = Vec::new();
    let mut undated = Vec::new();

    for it in items {
        match it.published_at.as_deref().and_then(parse_published) {
            Some(ts) if now.signed_duration_since(ts) <= window => fresh.push((Some(ts), it)),
            Some(_) => {}
            None => undated.push((None, it)),
        }
    }

    let (fresh_n, undated_n) = (fresh.len(), undated.len());
    let used_undated = fresh.is_empty();
    let mut pool = if used_undated { undated } else { fresh };
    if pool.is_empty() {
        return Err(PipelineError::NoCandidates);
    }

    pool.sort_by_key(|(ts, _)| Reverse(*ts));
    let pool: Vec<CandidateItem> = pool.into_iter().map(|(_, it)| it).collect();

    let boosted_pool: Vec<CandidateItem> = pool
        .iter()
        .filter(|c| has_impact_keyword(&c.title_lower()))
        .cloned()
        .collect();
    let boosted = !boosted_pool.is_empty();

    Ok(FreshnessOutcome {
        pool: if boosted { boosted_pool } else { pool },
        fresh: fresh_n,
        undated: undated_n,
        used_undated,
        boosted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rss_and_atom_dates() {
        let a = parse_published("Fri, 16 Oct 2026 09:30:00 +0000").unwrap();
        let b = parse_published("2026-10-16T09:30:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_published("GMT yesterday-ish").is_none());
        assert!(parse_published("").is_none());
    }

    #[test]
    fn fresh_pool_sorted_newest_first_and_stale_dropped() {
        let items = vec![
            CandidateItem::new("Messi old", "u1", "s", Some("2026-10-16T01:00:00Z")),
            CandidateItem::new("Messi new", "u2", "s", Some("2026-10-16T11:00:00Z")),
            CandidateItem::new("Messi stale", "u3", "s", Some("2026-10-10T11:00:00Z")),
            CandidateItem::new("Messi undated", "u4", "s", None),
        ];
        let out = freshness_filter(items, now(), Duration::hours(24)).unwrap();
        assert!(!out.used_undated);
        let urls: Vec<_> = out.pool.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["u2", "u1"]);
    }

    #[test]
    fn undated_used_when_nothing_fresh() {
        let items = vec![
            CandidateItem::new("Quiet day", "u1", "s", Some("not a date")),
            CandidateItem::new("Stale", "u2", "s", Some("2020-01-01T00:00:00Z")),
        ];
        let out = freshness_filter(items, now(), Duration::hours(24)).unwrap();
        assert!(out.used_undated);
        assert!(!out.boosted);
        assert_eq!(out.pool.len(), 1);
        assert_eq!(out.pool[0].url, "u1");
    }

    #[test]
    fn impact_subset_replaces_pool() {
        let items = vec![
            CandidateItem::new("Local club news", "u1", "s", None),
            CandidateItem::new("Haaland breaks record", "u2", "s", None),
        ];
        let out = freshness_filter(items, now(), Duration::hours(24)).unwrap();
        assert!(out.boosted);
        assert_eq!(out.pool.len(), 1);
        assert_eq!(out.pool[0].url, "u2");
    }

    #[test]
    fn nothing_left_is_no_candidates() {
        let items = vec![CandidateItem::new("Stale", "u", "s", Some("2020-01-01T00:00:00Z"))];
        let err = freshness_filter(items, now(), Duration::hours(24)).unwrap_err();
        assert!(matches!(err, PipelineError::NoCandidates));
    }
}

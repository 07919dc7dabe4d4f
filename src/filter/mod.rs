//! Candidate narrowing: freshness & impact first, then history-based dedup.

pub mod dedup;
pub mod freshness;

pub use dedup::{dedup_filter, DedupChecks, DedupOutcome};
pub use freshness::{freshness_filter, parse_published, FreshnessOutcome};

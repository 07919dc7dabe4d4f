// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod assets;
pub mod collab;
pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod image;
pub mod ingest;
pub mod pipeline;
pub mod select;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::{PipelineConfig, Variant};
pub use crate::error::{PipelineError, Stage};
pub use crate::history::{HistoryRecord, HistoryStore, JsonFileStore, MemoryStore};
pub use crate::pipeline::{Collaborators, Pipeline, RunOutcome};

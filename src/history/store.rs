// src/history/store.rs
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::HistoryRecord;

/// How a load went. `Recovered` is the malformed-history path: logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    Missing,
    Loaded,
    Recovered { reason: String },
}

/// Persistence port for the history ledger.
///
/// `load` never fails: anything unreadable degrades to defaults plus a report.
/// `save` re-applies the caps before writing.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> (HistoryRecord, LoadReport);
    fn save(&self, record: &HistoryRecord) -> Result<()>;
}

/// Decode a persisted document. Shared by every store so they all tolerate the same damage.
pub fn decode_history(raw: &str) -> (HistoryRecord, LoadReport) {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return (
                HistoryRecord::default(),
                LoadReport::Recovered {
                    reason: format!("invalid json: {e}"),
                },
            )
        }
    };
    let (record, bad) = HistoryRecord::from_value_lenient(value);
    if bad.is_empty() {
        (record, LoadReport::Loaded)
    } else {
        (
            record,
            LoadReport::Recovered {
                reason: format!("dropped or defaulted: {}", bad.join(", ")),
            },
        )
    }
}

pub fn encode_history(record: &HistoryRecord) -> Result<String> {
    serde_json::to_string_pretty(&record.capped()).context("serializing history")
}

/// `history.json` on local disk. Writes go to a temp file and are renamed into place,
/// so a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> (HistoryRecord, LoadReport) {
        if !self.path.exists() {
            return (HistoryRecord::default(), LoadReport::Missing);
        }
        match fs::read_to_string(&self.path) {
            Ok(s) => decode_history(&s),
            Err(e) => (
                HistoryRecord::default(),
                LoadReport::Recovered {
                    reason: format!("read {}: {e}", self.path.display()),
                },
            ),
        }
    }

    fn save(&self, record: &HistoryRecord) -> Result<()> {
        let json = encode_history(record)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating history dir {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all().ok();
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming into {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests. Keeps the serialized form so loads go through the same decoder.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: &HistoryRecord) -> Result<Self> {
        let store = Self::new();
        *store.lock_raw() = Some(encode_history(record)?);
        Ok(store)
    }

    /// Seed with an arbitrary (possibly broken) document.
    pub fn with_raw(raw: &str) -> Self {
        let store = Self::new();
        *store.lock_raw() = Some(raw.to_string());
        store
    }

    pub fn raw(&self) -> Option<String> {
        self.lock_raw().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_raw(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.raw.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> (HistoryRecord, LoadReport) {
        match self.lock_raw().as_deref() {
            None => (HistoryRecord::default(), LoadReport::Missing),
            Some(s) => decode_history(s),
        }
    }

    fn save(&self, record: &HistoryRecord) -> Result<()> {
        let json = encode_history(record)?;
        *self.lock_raw() = Some(json);
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

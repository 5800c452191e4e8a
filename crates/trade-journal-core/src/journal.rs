use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::record::{RecordId, TradeRecord};
use crate::{JournalError, JournalResult};

const ENTRY_PREFIX: &str = "trade_";
const ENTRY_EXTENSION: &str = "json";

/// Criteria for listing journal entries.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Case-insensitive symbol match
    pub symbol: Option<String>,
}

impl JournalFilter {
    fn matches(&self, record: &TradeRecord) -> bool {
        match &self.symbol {
            Some(symbol) => record.symbol.eq_ignore_ascii_case(symbol.trim()),
            None => true,
        }
    }
}

/// The combined journal: one JSON entry file per submission inside a user's data directory.
///
/// Entries are append-only. An existing entry file is never overwritten.
pub struct JournalStore {
    dir: PathBuf,
}

impl JournalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self, id: &RecordId) -> PathBuf {
        self.dir.join(format!("{ENTRY_PREFIX}{id}.{ENTRY_EXTENSION}"))
    }

    /// Write `record` as a new entry file and return its path.
    pub fn append(&self, record: &TradeRecord) -> JournalResult<PathBuf> {
        let path = self.entry_path(&record.id);
        let content = serde_json::to_string_pretty(record)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| JournalError::write(&path, e))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| JournalError::write(&path, e))?;

        info!(id = %record.id, path = %path.display(), "appended journal entry");
        Ok(path)
    }

    /// Read a single entry by id.
    pub fn get(&self, id: &RecordId) -> JournalResult<TradeRecord> {
        read_entry(&self.entry_path(id))
    }

    /// All entries matching `filter`, oldest first.
    ///
    /// A journal directory that does not exist yet is an empty journal.
    pub fn list(&self, filter: &JournalFilter) -> JournalResult<Vec<TradeRecord>> {
        let dir_entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(JournalError::read(&self.dir, e)),
        };

        let mut records = Vec::new();
        for entry in dir_entries {
            let path = entry.map_err(|e| JournalError::read(&self.dir, e))?.path();
            if !is_entry_file(&path) {
                continue;
            }
            let record = read_entry(&path)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

fn is_entry_file(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(ENTRY_PREFIX));
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == ENTRY_EXTENSION);
    path.is_file() && has_prefix && has_extension
}

fn read_entry(path: &Path) -> JournalResult<TradeRecord> {
    let content = fs::read_to_string(path).map_err(|e| JournalError::read(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        JournalError::Serialization(format!("Failed to parse '{}': {}", path.display(), e))
    })
}

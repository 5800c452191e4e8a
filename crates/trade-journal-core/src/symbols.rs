use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{JournalError, JournalResult};

const DEFAULT_SYMBOLS: [&str; 4] = ["XAUUSD", "BTCUSD", "EURUSD", "USDJPY"];

/// Tradable symbols offered to the trader.
///
/// Independent of the multiplier table: a listed symbol may have no
/// multiplier and an unlisted symbol can still be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolList(Vec<String>);

impl Default for SymbolList {
    fn default() -> Self {
        SymbolList(DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect())
    }
}

impl SymbolList {
    pub fn new(symbols: Vec<String>) -> Self {
        SymbolList(symbols)
    }

    /// New list with `symbol` appended. Blank input and exact duplicates leave it unchanged.
    pub fn add(&self, symbol: &str) -> SymbolList {
        let symbol = symbol.trim();
        let mut next = self.0.clone();
        if !symbol.is_empty() && !self.contains(symbol) {
            next.push(symbol.to_string());
        }
        SymbolList(next)
    }

    pub fn cleared(&self) -> SymbolList {
        SymbolList(Vec::new())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.iter().any(|s| s == symbol)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flat JSON array file backing a [`SymbolList`].
pub struct SymbolStore {
    file_path: PathBuf,
}

impl SymbolStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Load the stored list, falling back to the default symbols when no file exists yet.
    pub fn load(&self) -> JournalResult<SymbolList> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SymbolList::default()),
            Err(e) => return Err(JournalError::read(&self.file_path, e)),
        };
        serde_json::from_str(&content).map_err(|e| {
            JournalError::Serialization(format!(
                "Failed to parse '{}': {}",
                self.file_path.display(),
                e
            ))
        })
    }

    pub fn save(&self, symbols: &SymbolList) -> JournalResult<()> {
        let content = serde_json::to_string(symbols)?;

        // Write to a temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(|e| JournalError::write(&temp_path, e))?;
        fs::rename(&temp_path, &self.file_path)
            .map_err(|e| JournalError::write(&self.file_path, e))?;

        info!(path = %self.file_path.display(), count = symbols.len(), "saved symbol list");
        Ok(())
    }
}

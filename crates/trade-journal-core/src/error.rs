use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Malformed screenshot image: {0}")]
    MalformedImage(String),

    #[error("Failed to write '{}': {reason}", .path.display())]
    StorageWrite { path: PathBuf, reason: String },

    #[error("Failed to read '{}': {reason}", .path.display())]
    StorageRead { path: PathBuf, reason: String },

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl JournalError {
    pub(crate) fn write(path: &Path, reason: impl ToString) -> Self {
        JournalError::StorageWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn read(path: &Path, reason: impl ToString) -> Self {
        JournalError::StorageRead {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Serialization(e.to_string())
    }
}

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::{JournalError, JournalResult};

pub const REPORTS_DIR: &str = "output_pdfs";
pub const DATA_DIR: &str = "trade_data";
pub const LOGOS_DIR: &str = "logos";
pub const SYMBOLS_FILE: &str = "symbols.json";

/// Per-user storage namespace under a shared base directory.
///
/// ```text
/// <base>/output_pdfs/<user>/   rendered reports
/// <base>/trade_data/<user>/    journal entries and screenshots
/// <base>/logos/<SYMBOL>.png    shared instrument logos
/// <base>/symbols.json          shared symbol list
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct UserPaths {
    pub username: String,
    pub reports_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logos_dir: PathBuf,
    pub symbols_file: PathBuf,
}

impl UserPaths {
    pub fn new(base: impl AsRef<Path>, username: &str) -> JournalResult<Self> {
        validate_username(username)?;
        let base = base.as_ref();
        Ok(UserPaths {
            username: username.to_string(),
            reports_dir: base.join(REPORTS_DIR).join(username),
            data_dir: base.join(DATA_DIR).join(username),
            logos_dir: base.join(LOGOS_DIR),
            symbols_file: base.join(SYMBOLS_FILE),
        })
    }

    /// Create the user's report and data directories plus the shared logo directory.
    pub fn provision(&self) -> JournalResult<()> {
        for dir in [&self.reports_dir, &self.data_dir, &self.logos_dir] {
            fs::create_dir_all(dir).map_err(|e| JournalError::write(dir, e))?;
        }
        debug!(user = %self.username, "storage provisioned");
        Ok(())
    }

    /// Conventional logo location for a symbol; the file may not exist.
    pub fn logo_path(&self, symbol: &str) -> PathBuf {
        self.logos_dir.join(format!("{}.png", file_stem(symbol)))
    }
}

/// Flatten free text into a single file-name component.
///
/// Path separators become `_`, so symbols like `BTC/USD` or `../other`
/// always stay inside the directory they are joined onto.
pub fn file_stem(raw: &str) -> String {
    raw.trim().replace(['/', '\\'], "_")
}

/// Usernames partition storage, so they must be a single plain path component.
fn validate_username(username: &str) -> JournalResult<()> {
    let invalid = |reason: &str| JournalError::InvalidInput {
        field: "user".into(),
        reason: reason.into(),
    };
    if username.trim().is_empty() {
        return Err(invalid("Username cannot be empty."));
    }
    let mut components = Path::new(username).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == username => Ok(()),
        _ => Err(invalid(
            "Username must be a single path component without separators.",
        )),
    }
}

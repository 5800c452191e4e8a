//! Configuration loaded from environment variables (and `.env`).
//!
//! - `TRADE_JOURNAL_HOME` - base directory for reports, trade data, logos and symbols (default: `.`)
//! - `TRADE_JOURNAL_USER` - username partitioning the storage (overridden by `--user`)
//! - `TRADE_JOURNAL_MULTIPLIERS` - optional TOML file with a `[multipliers]` table

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use trade_journal_core::pnl::MultiplierTable;
use trade_journal_core::storage::{UserPaths, SYMBOLS_FILE};

#[derive(Debug, Clone)]
pub struct JournalConfig {
    pub home: PathBuf,
    pub user: Option<String>,
    pub multipliers: MultiplierTable,
}

#[derive(Debug, Deserialize)]
struct MultiplierFile {
    #[serde(default)]
    multipliers: BTreeMap<String, u32>,
}

impl JournalConfig {
    pub fn from_env() -> Result<Self> {
        let home = env::var("TRADE_JOURNAL_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let user = env::var("TRADE_JOURNAL_USER")
            .ok()
            .filter(|u| !u.trim().is_empty());

        let multipliers = match env::var("TRADE_JOURNAL_MULTIPLIERS") {
            Ok(path) => load_multipliers(Path::new(&path))?,
            Err(_) => MultiplierTable::default(),
        };

        Ok(Self {
            home,
            user,
            multipliers,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, home: Option<PathBuf>, user: Option<String>) -> Self {
        if let Some(home) = home {
            self.home = home;
        }
        if user.is_some() {
            self.user = user;
        }
        self
    }

    pub fn user_paths(&self) -> Result<UserPaths> {
        let user = self
            .user
            .as_deref()
            .context("No user given: pass --user or set TRADE_JOURNAL_USER")?;
        Ok(UserPaths::new(&self.home, user)?)
    }

    pub fn symbols_file(&self) -> PathBuf {
        self.home.join(SYMBOLS_FILE)
    }
}

fn load_multipliers(path: &Path) -> Result<MultiplierTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read multiplier file {}", path.display()))?;
    let table = parse_multipliers(&content, MultiplierTable::default())
        .with_context(|| format!("Invalid multiplier file {}", path.display()))?;
    info!("Loaded contract multipliers from {:?}", path);
    Ok(table)
}

/// Layer the `[multipliers]` table of a TOML document over `base`.
pub fn parse_multipliers(content: &str, base: MultiplierTable) -> Result<MultiplierTable> {
    let file: MultiplierFile = toml::from_str(content).context("Failed to parse TOML")?;
    let mut table = base;
    for (symbol, multiplier) in file.multipliers {
        table = table.with_override(&symbol, multiplier)?;
    }
    Ok(table)
}

use clap::Subcommand;
use serde_json::Value;

use trade_journal_core::journal::{JournalFilter, JournalStore};
use trade_journal_core::record::RecordId;

use crate::config::JournalConfig;

/// Query the combined journal
#[derive(Subcommand)]
pub enum JournalCommand {
    /// List journal entries, oldest first
    List {
        /// Only entries for this symbol (case-insensitive)
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Show a single entry by id
    Show {
        /// Entry id, e.g. 20250615093000123-a1b2
        id: String,
    },
}

pub fn run_journal(
    command: JournalCommand,
    config: &JournalConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let paths = config.user_paths()?;
    let store = JournalStore::new(&paths.data_dir);

    match command {
        JournalCommand::List { symbol } => {
            let entries = store.list(&JournalFilter { symbol })?;
            Ok(serde_json::to_value(entries)?)
        }
        JournalCommand::Show { id } => {
            let record = store.get(&RecordId::parse(&id)?)?;
            Ok(serde_json::to_value(record)?)
        }
    }
}

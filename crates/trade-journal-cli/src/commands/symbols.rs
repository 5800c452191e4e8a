use clap::Subcommand;
use serde_json::{json, Value};
use std::fs;

use trade_journal_core::pnl::MultiplierTable;
use trade_journal_core::symbols::{SymbolList, SymbolStore};

use crate::config::JournalConfig;

/// Manage the list of tradable symbols
#[derive(Subcommand)]
pub enum SymbolsCommand {
    /// Show the stored symbol list
    List,
    /// Add a symbol (duplicates are ignored)
    Add {
        /// Symbol to add, e.g. GBPUSD
        symbol: String,
    },
    /// Remove every symbol
    Clear,
}

pub fn run_symbols(
    command: SymbolsCommand,
    config: &JournalConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let store = SymbolStore::new(config.symbols_file());
    let current = store.load()?;

    let next = match command {
        SymbolsCommand::List => return Ok(symbols_json(&current, &config.multipliers)),
        SymbolsCommand::Add { symbol } => current.add(&symbol),
        SymbolsCommand::Clear => current.cleared(),
    };

    fs::create_dir_all(&config.home)?;
    store.save(&next)?;
    Ok(symbols_json(&next, &config.multipliers))
}

/// Effective contract multipliers, including the fallback for unlisted symbols.
pub fn run_multipliers(config: &JournalConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let table: serde_json::Map<String, Value> = config
        .multipliers
        .entries()
        .map(|(symbol, m)| (symbol.to_string(), json!(m)))
        .collect();
    Ok(json!({
        "multipliers": table,
        "default": trade_journal_core::pnl::DEFAULT_MULTIPLIER,
    }))
}

fn symbols_json(symbols: &SymbolList, table: &MultiplierTable) -> Value {
    let unpriced: Vec<&String> = symbols
        .as_slice()
        .iter()
        .filter(|s| table.get(s).is_none())
        .collect();
    json!({
        "symbols": symbols,
        "count": symbols.len(),
        "without_multiplier": unpriced,
    })
}

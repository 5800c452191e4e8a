use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::journal::JournalStore;
use crate::pnl::{compute_pnl, MultiplierTable};
use crate::record::{build_record, RecordId, TradeInput, TradeRecord};
use crate::report::render_report;
use crate::storage::UserPaths;
use crate::JournalResult;

/// Where a submission ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmitResult {
    JournalEntry { id: RecordId, path: PathBuf },
    Report { id: RecordId, path: PathBuf },
}

impl EmitResult {
    pub fn path(&self) -> &PathBuf {
        match self {
            EmitResult::JournalEntry { path, .. } | EmitResult::Report { path, .. } => path,
        }
    }
}

/// Persist a finished record: a journal entry when `combine` is set,
/// otherwise a rendered PDF report. The two branches share nothing but the record.
pub fn emit(record: &TradeRecord, combine: bool, paths: &UserPaths) -> JournalResult<EmitResult> {
    if combine {
        let path = JournalStore::new(&paths.data_dir).append(record)?;
        Ok(EmitResult::JournalEntry {
            id: record.id.clone(),
            path,
        })
    } else {
        let path = render_report(record, paths)?;
        Ok(EmitResult::Report {
            id: record.id.clone(),
            path,
        })
    }
}

/// Full submission: resolve the multiplier, compute PnL, build the record, emit it.
pub fn submit(
    input: TradeInput,
    table: &MultiplierTable,
    now: NaiveDateTime,
    paths: &UserPaths,
) -> JournalResult<EmitResult> {
    let multiplier = table.multiplier_or_default(&input.symbol);
    let pnl = compute_pnl(
        input.position,
        input.entry_price,
        input.exit_price,
        input.lot_size,
        input.commission,
        multiplier,
    )?;
    debug!(symbol = %input.symbol, %multiplier, %pnl, "computed trade pnl");

    let combine = input.combine;
    let record = build_record(input, multiplier, pnl, now, &paths.data_dir)?;
    emit(&record, combine, paths)
}

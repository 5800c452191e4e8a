use chrono::{Local, NaiveDateTime};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use trade_journal_core::emit;
use trade_journal_core::pnl;
use trade_journal_core::record::TradeInput;
use trade_journal_core::Position;

use crate::config::JournalConfig;
use crate::input;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Trade fields, given as flags or as a JSON document
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TradeArgs {
    /// Instrument symbol (e.g. XAUUSD)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Trade direction: long or short
    #[arg(long)]
    pub position: Option<Position>,

    /// Entry price
    #[arg(long)]
    pub entry: Option<Decimal>,

    /// Exit price
    #[arg(long)]
    pub exit: Option<Decimal>,

    /// Lot size (multiplied by the symbol's contract multiplier)
    #[arg(long)]
    pub lot_size: Option<Decimal>,

    /// Commission paid, in account currency
    #[arg(long, default_value = "0")]
    pub commission: Decimal,

    /// Trade number
    #[arg(long, default_value = "")]
    pub trade_number: String,

    /// Broker position id (the '#' is added automatically)
    #[arg(long, default_value = "")]
    pub position_id: String,

    /// Free-text notes
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Trade rating, 1-5
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,

    /// Entry time (YYYY-MM-DDTHH:MM:SS or DD/MM/YYYY HH:MM:SS)
    #[arg(long, value_parser = parse_datetime)]
    pub entry_time: Option<NaiveDateTime>,

    /// Exit time (YYYY-MM-DDTHH:MM:SS or DD/MM/YYYY HH:MM:SS)
    #[arg(long, value_parser = parse_datetime)]
    pub exit_time: Option<NaiveDateTime>,

    /// Custom PDF name, without extension (also applies to --input documents)
    #[arg(long)]
    pub report_name: Option<String>,

    /// Append to the combined journal instead of rendering a PDF report
    /// (also applies to --input documents)
    #[arg(long)]
    pub combine: bool,

    /// Path to JSON input file (overrides trade flags except --combine and --report-name)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for recording a trade
#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub trade: TradeArgs,

    /// Screenshot to attach (PNG, JPEG, ...); saved as PNG
    #[arg(long)]
    pub screenshot: Option<PathBuf>,
}

/// Arguments for a PnL preview
#[derive(Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub trade: TradeArgs,
}

pub fn run_record(
    args: RecordArgs,
    config: &JournalConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut trade = args.trade.into_input(None)?;
    if let Some(ref path) = args.screenshot {
        trade.screenshot = Some(input::file::read_bytes(path)?);
    }

    let paths = config.user_paths()?;
    paths.provision()?;

    let result = emit::submit(trade, &config.multipliers, Local::now().naive_local(), &paths)?;
    info!("Saved {}", result.path().display());
    Ok(serde_json::to_value(result)?)
}

pub fn run_estimate(
    args: EstimateArgs,
    config: &JournalConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    // Times only affect warnings here, so default them to now
    let trade = args.trade.into_input(Some(Local::now().naive_local()))?;
    let result = pnl::estimate_pnl(&trade, &config.multipliers)?;
    Ok(serde_json::to_value(result)?)
}

impl TradeArgs {
    /// Build the core input from `--input`, piped stdin, or flags, in that order.
    /// `default_time` fills missing entry/exit times; without it they are required.
    fn into_input(
        self,
        default_time: Option<NaiveDateTime>,
    ) -> Result<TradeInput, Box<dyn std::error::Error>> {
        let document: Option<TradeInput> = match self.input {
            Some(ref path) => Some(input::file::read_json(path)?),
            None => input::stdin::read_stdin()?,
        };
        let mut trade = if let Some(doc) = document {
            with_routing_flags(doc, self.combine, self.report_name)
        } else {
            let entry_time = self.entry_time.or(default_time);
            let exit_time = self.exit_time.or(default_time);
            TradeInput {
                symbol: self
                    .symbol
                    .ok_or("--symbol is required (or provide --input)")?,
                position: self
                    .position
                    .ok_or("--position is required (or provide --input)")?,
                entry_price: self
                    .entry
                    .ok_or("--entry is required (or provide --input)")?,
                exit_price: self
                    .exit
                    .ok_or("--exit is required (or provide --input)")?,
                lot_size: self
                    .lot_size
                    .ok_or("--lot-size is required (or provide --input)")?,
                commission: self.commission,
                trade_number: self.trade_number,
                position_id: self.position_id,
                report_name: self.report_name,
                notes: self.notes,
                rating: self.rating,
                screenshot: None,
                entry_time: entry_time.ok_or("--entry-time is required (or provide --input)")?,
                exit_time: exit_time.ok_or("--exit-time is required (or provide --input)")?,
                combine: self.combine,
            }
        };

        // JSON documents bypass clap's range check
        trade.rating = trade.rating.clamp(1, 5);
        Ok(trade)
    }
}

/// Routing flags given on the command line win over a JSON document.
fn with_routing_flags(
    mut trade: TradeInput,
    combine: bool,
    report_name: Option<String>,
) -> TradeInput {
    trade.combine |= combine;
    if report_name.is_some() {
        trade.report_name = report_name;
    }
    trade
}

fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .ok_or_else(|| {
            format!("'{raw}' is not a date-time; use YYYY-MM-DDTHH:MM:SS or DD/MM/YYYY HH:MM:SS")
        })
}

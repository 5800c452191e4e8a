use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};
use image::ImageFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pnl::{position_size, round_pnl};
use crate::{types::*, JournalError, JournalResult};

const SECONDS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One trade as submitted by the trader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub symbol: String,
    pub position: Position,
    pub entry_price: Money,
    pub exit_price: Money,
    pub lot_size: Units,
    pub commission: Money,
    pub trade_number: String,
    /// Broker position id, without the leading '#'
    pub position_id: String,
    /// Custom report file name (without extension)
    #[serde(default)]
    pub report_name: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// 1-5, clamped by the input surface
    #[serde(default = "default_rating")]
    pub rating: u8,
    /// Raw image bytes in any format `image` can decode
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    /// Append to the combined journal instead of rendering a report
    #[serde(default)]
    pub combine: bool,
}

fn default_rating() -> u8 {
    3
}

/// The canonical, immutable record of a submitted trade.
///
/// This is exactly what a journal entry file holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: RecordId,
    pub symbol: String,
    pub position: Position,
    #[serde(rename = "entry")]
    pub entry_price: Money,
    #[serde(rename = "exit")]
    pub exit_price: Money,
    pub lot_size: Units,
    pub commission: Money,
    pub multiplier: Decimal,
    /// lot_size × multiplier
    pub position_size: Units,
    pub pnl: Money,
    pub trade_number: String,
    /// Rendered with a leading '#'
    pub position_id: String,
    pub report_name: Option<String>,
    pub notes: String,
    pub rating: u8,
    #[serde(with = "journal_datetime")]
    pub entry_time: NaiveDateTime,
    #[serde(with = "journal_datetime")]
    pub exit_time: NaiveDateTime,
    /// "<d>d <h>h <m>m"
    pub duration: String,
    pub duration_seconds: i64,
    /// File name of the saved screenshot inside the user's data directory
    pub screenshot: Option<String>,
}

impl TradeRecord {
    pub fn screenshot_path(&self, data_dir: &Path) -> Option<PathBuf> {
        self.screenshot.as_ref().map(|name| data_dir.join(name))
    }
}

/// Record identity: creation wall-clock time plus a random suffix.
///
/// Formatted `YYYYMMDDHHMMSSmmm-xxxx`, so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate(now: NaiveDateTime) -> Self {
        Self::from_parts(now, rand::random::<u16>())
    }

    pub fn from_parts(now: NaiveDateTime, suffix: u16) -> Self {
        RecordId(format!("{}-{:04x}", now.format("%Y%m%d%H%M%S%3f"), suffix))
    }

    /// Accept an id typed by a user; only ASCII alphanumerics and '-' are allowed.
    pub fn parse(raw: &str) -> JournalResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(JournalError::InvalidInput {
                field: "id".into(),
                reason: format!("'{raw}' is not a valid journal entry id."),
            });
        }
        Ok(RecordId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed interval split into whole days, hours and minutes.
///
/// Days use floor division, so hours and minutes are always non-negative and
/// an exit one second before entry reads `-1d 23h 59m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBreakdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub total_seconds: i64,
}

impl DurationBreakdown {
    pub fn between(entry: NaiveDateTime, exit: NaiveDateTime) -> Self {
        let total_seconds = exit.signed_duration_since(entry).num_seconds();
        let days = total_seconds.div_euclid(SECONDS_PER_DAY);
        let remainder = total_seconds.rem_euclid(SECONDS_PER_DAY);
        DurationBreakdown {
            days,
            hours: remainder / 3600,
            minutes: (remainder / 60) % 60,
            total_seconds,
        }
    }

    pub fn label(&self) -> String {
        format!("{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Assemble the canonical record for a submission.
///
/// When the input carries a screenshot it is decoded and re-encoded as PNG
/// into `data_dir` before the record is returned. A screenshot that fails
/// to decode rejects the whole submission and nothing is written.
pub fn build_record(
    input: TradeInput,
    multiplier: Decimal,
    pnl: Money,
    now: NaiveDateTime,
    data_dir: &Path,
) -> JournalResult<TradeRecord> {
    let size = position_size(input.lot_size, multiplier)?;
    let id = RecordId::generate(now);

    let screenshot = match input.screenshot.as_deref() {
        Some(bytes) => {
            let file_name = format!("screenshot_{id}.png");
            save_screenshot(bytes, &data_dir.join(&file_name))?;
            Some(file_name)
        }
        None => None,
    };

    let entry_time = truncate_to_second(input.entry_time);
    let exit_time = truncate_to_second(input.exit_time);
    let duration = DurationBreakdown::between(entry_time, exit_time);

    Ok(TradeRecord {
        id,
        symbol: input.symbol,
        position: input.position,
        entry_price: input.entry_price,
        exit_price: input.exit_price,
        lot_size: input.lot_size,
        commission: input.commission,
        multiplier,
        position_size: size,
        pnl: round_pnl(pnl),
        trade_number: input.trade_number,
        position_id: format!("#{}", input.position_id),
        report_name: input.report_name,
        notes: input.notes,
        rating: input.rating,
        entry_time,
        exit_time,
        duration: duration.label(),
        duration_seconds: duration.total_seconds,
        screenshot,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn save_screenshot(bytes: &[u8], path: &Path) -> JournalResult<()> {
    let img =
        image::load_from_memory(bytes).map_err(|e| JournalError::MalformedImage(e.to_string()))?;
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| JournalError::write(path, e))?;
    info!(path = %path.display(), "saved screenshot");
    Ok(())
}

fn truncate_to_second(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Journal date-time encoding: `dd/mm/YYYY HH:MM:SS`.
mod journal_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::TradeInput;
use crate::{types::*, JournalError, JournalResult};

/// Multiplier applied to any symbol missing from the table.
pub const DEFAULT_MULTIPLIER: u32 = 1;

// ---------------------------------------------------------------------------
// Multiplier table
// ---------------------------------------------------------------------------

/// Contract multipliers keyed by uppercase symbol.
///
/// Converts a lot size into position-size units. Lookups are
/// case-insensitive and a miss resolves to [`DEFAULT_MULTIPLIER`] through
/// [`MultiplierTable::multiplier_or_default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierTable {
    multipliers: BTreeMap<String, u32>,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        let multipliers = [
            ("XAUUSD", 100),
            ("BTCUSD", 1),
            ("EURUSD", 100_000),
            ("USDJPY", 100_000),
        ]
        .into_iter()
        .map(|(symbol, m)| (symbol.to_string(), m))
        .collect();
        Self { multipliers }
    }
}

impl MultiplierTable {
    /// Table with no entries; every symbol resolves to the default.
    pub fn empty() -> Self {
        Self {
            multipliers: BTreeMap::new(),
        }
    }

    /// Add or replace a symbol's multiplier. Zero is rejected.
    pub fn with_override(mut self, symbol: &str, multiplier: u32) -> JournalResult<Self> {
        let key = normalize_symbol(symbol);
        if key.is_empty() {
            return Err(JournalError::InvalidInput {
                field: "symbol".into(),
                reason: "Multiplier symbol cannot be empty.".into(),
            });
        }
        if multiplier == 0 {
            return Err(JournalError::InvalidInput {
                field: format!("multipliers.{key}"),
                reason: "Contract multiplier must be a positive integer.".into(),
            });
        }
        self.multipliers.insert(key, multiplier);
        Ok(self)
    }

    /// Raw lookup, `None` when the symbol has no entry.
    pub fn get(&self, symbol: &str) -> Option<u32> {
        self.multipliers.get(&normalize_symbol(symbol)).copied()
    }

    /// Lookup with the explicit fallback to [`DEFAULT_MULTIPLIER`].
    pub fn multiplier_or_default(&self, symbol: &str) -> Decimal {
        match self.get(symbol) {
            Some(m) => Decimal::from(m),
            None => {
                warn!(symbol, "no contract multiplier configured, using default");
                Decimal::from(DEFAULT_MULTIPLIER)
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.multipliers.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// PnL
// ---------------------------------------------------------------------------

/// Signed profit or loss of a closed trade.
///
/// `direction × (exit − entry) × (lot_size × multiplier) − commission`.
/// Negative lot sizes and commissions are passed through unchanged.
/// Results outside the decimal range are rejected instead of overflowing.
pub fn compute_pnl(
    position: Position,
    entry: Money,
    exit: Money,
    lot_size: Units,
    commission: Money,
    multiplier: Decimal,
) -> JournalResult<Money> {
    let size = position_size(lot_size, multiplier)?;
    exit.checked_sub(entry)
        .and_then(|diff| diff.checked_mul(position.direction()))
        .and_then(|diff| diff.checked_mul(size))
        .and_then(|gross| gross.checked_sub(commission))
        .ok_or_else(|| out_of_range("pnl"))
}

/// Contract units traded: `lot_size × multiplier`.
pub fn position_size(lot_size: Units, multiplier: Decimal) -> JournalResult<Units> {
    lot_size
        .checked_mul(multiplier)
        .ok_or_else(|| out_of_range("position_size"))
}

fn out_of_range(field: &str) -> JournalError {
    JournalError::InvalidInput {
        field: field.into(),
        reason: "Trade values are too large to compute exactly.".into(),
    }
}

/// Round to cents, keeping a fixed scale of 2 so `4` renders as `4.00`.
pub fn round_pnl(pnl: Money) -> Money {
    let mut rounded = pnl.round_dp(2);
    rounded.rescale(2);
    rounded
}

// ---------------------------------------------------------------------------
// Estimate (preview without persisting)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlEstimate {
    pub symbol: String,
    pub position: Position,
    pub multiplier: Decimal,
    /// True when the symbol was missing from the table
    pub multiplier_defaulted: bool,
    pub position_size: Units,
    pub pnl: Money,
    pub is_profit: bool,
}

/// Preview the PnL a submission would record, without building or saving it.
pub fn estimate_pnl(
    input: &TradeInput,
    table: &MultiplierTable,
) -> JournalResult<ComputationOutput<PnlEstimate>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let multiplier_defaulted = table.get(&input.symbol).is_none();
    if multiplier_defaulted {
        warnings.push(format!(
            "No contract multiplier for '{}'; defaulted to {}.",
            input.symbol, DEFAULT_MULTIPLIER
        ));
    }
    if input.exit_time < input.entry_time {
        warnings.push("Exit time precedes entry time; duration will be negative.".into());
    }

    let multiplier = table.multiplier_or_default(&input.symbol);
    let pnl = round_pnl(compute_pnl(
        input.position,
        input.entry_price,
        input.exit_price,
        input.lot_size,
        input.commission,
        multiplier,
    )?);

    let output = PnlEstimate {
        symbol: input.symbol.clone(),
        position: input.position,
        multiplier,
        multiplier_defaulted,
        position_size: position_size(input.lot_size, multiplier)?,
        pnl,
        is_profit: pnl >= Decimal::ZERO,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "direction": "Long: exit - entry, Short: entry - exit",
        "position_size": "lot_size x contract multiplier",
        "unknown_symbol_multiplier": DEFAULT_MULTIPLIER,
        "rounding": "2 decimal places, banker's rounding",
    });

    Ok(with_metadata(
        "Contract-multiplier trade PnL",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_long_eurusd_scenario() {
        let table = MultiplierTable::default();
        let m = table.multiplier_or_default("EURUSD");
        let pnl = compute_pnl(Position::Long, dec!(100), dec!(110), dec!(1), dec!(5), m).unwrap();
        assert_eq!(round_pnl(pnl), dec!(999995.00));
    }

    #[test]
    fn test_short_xauusd_scenario() {
        let table = MultiplierTable::default();
        let m = table.multiplier_or_default("XAUUSD");
        let pnl =
            compute_pnl(Position::Short, dec!(1900), dec!(1890), dec!(0.5), dec!(2), m).unwrap();
        assert_eq!(round_pnl(pnl), dec!(498.00));
    }

    #[test]
    fn test_unknown_symbol_defaults_to_one() {
        let table = MultiplierTable::default();
        let m = table.multiplier_or_default("FOOBAR");
        assert_eq!(m, Decimal::ONE);
        // Repeated lookups are stable
        assert_eq!(table.multiplier_or_default("FOOBAR"), Decimal::ONE);

        let pnl = compute_pnl(Position::Long, dec!(10), dec!(12), dec!(2), dec!(0), m).unwrap();
        assert_eq!(round_pnl(pnl), dec!(4.00));
        assert_eq!(round_pnl(pnl).to_string(), "4.00");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = MultiplierTable::default();
        assert_eq!(table.get("xauusd"), Some(100));
        assert_eq!(table.get(" EurUsd "), Some(100_000));
    }

    #[test]
    fn test_commission_is_linear() {
        let m = dec!(100);
        for position in [Position::Long, Position::Short] {
            for c in [dec!(0), dec!(1.5), dec!(-3), dec!(250)] {
                let with_c =
                    compute_pnl(position, dec!(50), dec!(47.25), dec!(0.3), c, m).unwrap();
                let without =
                    compute_pnl(position, dec!(50), dec!(47.25), dec!(0.3), dec!(0), m).unwrap();
                assert_eq!(with_c, without - c);
            }
        }
    }

    #[test]
    fn test_short_loses_when_price_rises() {
        let pnl =
            compute_pnl(Position::Short, dec!(10), dec!(11), dec!(1), dec!(0), dec!(1)).unwrap();
        assert_eq!(pnl, dec!(-1));
    }

    #[test]
    fn test_round_pnl_bankers() {
        assert_eq!(round_pnl(dec!(1.005)).to_string(), "1.00");
        assert_eq!(round_pnl(dec!(1.015)).to_string(), "1.02");
        assert_eq!(round_pnl(dec!(-2.3456)).to_string(), "-2.35");
    }

    #[test]
    fn test_override_replaces_and_rejects_zero() {
        let table = MultiplierTable::default()
            .with_override("xauusd", 50)
            .unwrap()
            .with_override("NAS100", 20)
            .unwrap();
        assert_eq!(table.get("XAUUSD"), Some(50));
        assert_eq!(table.get("nas100"), Some(20));

        let err = MultiplierTable::empty().with_override("ES", 0).unwrap_err();
        assert!(matches!(err, JournalError::InvalidInput { .. }));
    }

    #[test]
    fn test_oversized_trade_is_rejected() {
        let huge = Decimal::from_str_exact("1000000000000000000000000").unwrap();
        let err = compute_pnl(Position::Long, dec!(0), huge, dec!(10), dec!(0), dec!(100000))
            .unwrap_err();
        assert!(matches!(err, JournalError::InvalidInput { ref field, .. } if field == "pnl"));

        let err = position_size(Decimal::MAX, dec!(2)).unwrap_err();
        assert!(
            matches!(err, JournalError::InvalidInput { ref field, .. } if field == "position_size")
        );
    }
}

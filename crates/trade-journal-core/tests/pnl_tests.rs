use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trade_journal_core::pnl::{self, MultiplierTable};
use trade_journal_core::record::TradeInput;
use trade_journal_core::{JournalError, Position};

// ===========================================================================
// Contract-multiplier PnL tests
// ===========================================================================

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn input(symbol: &str, position: Position, entry: Decimal, exit: Decimal) -> TradeInput {
    TradeInput {
        symbol: symbol.into(),
        position,
        entry_price: entry,
        exit_price: exit,
        lot_size: dec!(1),
        commission: dec!(0),
        trade_number: "1".into(),
        position_id: "1".into(),
        report_name: None,
        notes: String::new(),
        rating: 3,
        screenshot: None,
        entry_time: at(9, 0, 0),
        exit_time: at(10, 0, 0),
        combine: true,
    }
}

#[test]
fn test_scenario_long_eurusd() {
    let table = MultiplierTable::default();
    let mut trade = input("EURUSD", Position::Long, dec!(100), dec!(110));
    trade.commission = dec!(5);
    let est = pnl::estimate_pnl(&trade, &table).unwrap().result;
    assert_eq!(est.pnl, dec!(999995.00));
    assert_eq!(est.position_size, dec!(100000));
    assert!(est.is_profit);
    assert!(!est.multiplier_defaulted);
}

#[test]
fn test_scenario_short_xauusd() {
    let table = MultiplierTable::default();
    let mut trade = input("XAUUSD", Position::Short, dec!(1900), dec!(1890));
    trade.lot_size = dec!(0.5);
    trade.commission = dec!(2);
    let est = pnl::estimate_pnl(&trade, &table).unwrap().result;
    assert_eq!(est.pnl, dec!(498.00));
    assert_eq!(est.position_size, dec!(50));
}

#[test]
fn test_scenario_unknown_symbol() {
    let table = MultiplierTable::default();
    let mut trade = input("FOOBAR", Position::Long, dec!(10), dec!(12));
    trade.lot_size = dec!(2);
    let out = pnl::estimate_pnl(&trade, &table).unwrap();
    assert_eq!(out.result.multiplier, Decimal::ONE);
    assert!(out.result.multiplier_defaulted);
    assert_eq!(out.result.pnl, dec!(4.00));
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("FOOBAR"));
}

#[test]
fn test_lowercase_symbol_uses_table() {
    let table = MultiplierTable::default();
    let trade = input("xauusd", Position::Long, dec!(2000), dec!(2001));
    let est = pnl::estimate_pnl(&trade, &table).unwrap().result;
    assert_eq!(est.multiplier, dec!(100));
    assert_eq!(est.pnl, dec!(100.00));
}

#[test]
fn test_losing_trade_flagged() {
    let table = MultiplierTable::default();
    let mut trade = input("BTCUSD", Position::Long, dec!(65000), dec!(64000));
    trade.lot_size = dec!(0.1);
    trade.commission = dec!(3.5);
    let est = pnl::estimate_pnl(&trade, &table).unwrap().result;
    // (64000 - 65000) × 0.1 − 3.5
    assert_eq!(est.pnl, dec!(-103.50));
    assert!(!est.is_profit);
}

#[test]
fn test_inverted_times_warn_but_compute() {
    let table = MultiplierTable::default();
    let mut trade = input("EURUSD", Position::Short, dec!(1.1), dec!(1.09));
    trade.exit_time = at(8, 59, 59);
    let out = pnl::estimate_pnl(&trade, &table).unwrap();
    assert_eq!(out.result.pnl, dec!(1000.00));
    assert!(out.warnings.iter().any(|w| w.contains("precedes")));
}

#[test]
fn test_commission_linearity_both_directions() {
    for position in [Position::Long, Position::Short] {
        for commission in [dec!(0.01), dec!(7), dec!(-2.5)] {
            let base =
                pnl::compute_pnl(position, dec!(3.2), dec!(3.9), dec!(4), dec!(0), dec!(25))
                    .unwrap();
            let charged =
                pnl::compute_pnl(position, dec!(3.2), dec!(3.9), dec!(4), commission, dec!(25))
                    .unwrap();
            assert_eq!(charged, base - commission);
        }
    }
}

#[test]
fn test_estimate_envelope_metadata() {
    let table = MultiplierTable::default();
    let trade = input("USDJPY", Position::Long, dec!(1), dec!(1));
    let out = pnl::estimate_pnl(&trade, &table).unwrap();
    assert_eq!(out.methodology, "Contract-multiplier trade PnL");
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.result.pnl, Decimal::ZERO);
    assert!(out.result.is_profit);
}

#[test]
fn test_estimate_rejects_out_of_range_trade() {
    let table = MultiplierTable::default();
    let huge = Decimal::from_str_exact("1000000000000000000000000").unwrap();
    let trade = input("EURUSD", Position::Long, dec!(0), huge);
    let err = pnl::estimate_pnl(&trade, &table).unwrap_err();
    assert!(matches!(err, JournalError::InvalidInput { .. }));
}

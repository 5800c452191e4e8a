use std::fs;
use std::io::Cursor;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use image::{DynamicImage, ImageFormat, RgbImage};
use rust_decimal_macros::dec;
use trade_journal_core::emit::{emit, submit, EmitResult};
use trade_journal_core::journal::{JournalFilter, JournalStore};
use trade_journal_core::pnl::MultiplierTable;
use trade_journal_core::record::TradeInput;
use trade_journal_core::storage::UserPaths;
use trade_journal_core::{JournalError, Position};

// ===========================================================================
// Submission pipeline tests: journal-append vs document-render
// ===========================================================================

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 12)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, [30, 144, 255].into()));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn jpeg_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 9, [200, 40, 40].into()));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn sample_input(combine: bool) -> TradeInput {
    TradeInput {
        symbol: "EURUSD".into(),
        position: Position::Long,
        entry_price: dec!(100),
        exit_price: dec!(110),
        lot_size: dec!(1),
        commission: dec!(5),
        trade_number: "3".into(),
        position_id: "A-19".into(),
        report_name: None,
        notes: "Followed the plan. ".repeat(40),
        rating: 4,
        screenshot: None,
        entry_time: at(9, 0, 0),
        exit_time: at(13, 30, 0),
        combine,
    }
}

fn provisioned() -> (tempfile::TempDir, UserPaths) {
    let base = tempfile::tempdir().unwrap();
    let paths = UserPaths::new(base.path(), "hamza").unwrap();
    paths.provision().unwrap();
    (base, paths)
}

fn count_with_extension(dir: &Path, ext: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == ext))
        .count()
}

#[test]
fn test_combine_writes_one_entry_and_no_report() {
    let (_base, paths) = provisioned();
    let table = MultiplierTable::default();

    let result = submit(sample_input(true), &table, at(13, 31, 0), &paths).unwrap();

    assert!(matches!(result, EmitResult::JournalEntry { .. }));
    assert!(result.path().is_file());
    assert_eq!(count_with_extension(&paths.data_dir, "json"), 1);
    assert_eq!(count_with_extension(&paths.reports_dir, "pdf"), 0);

    let entries = JournalStore::new(&paths.data_dir)
        .list(&JournalFilter::default())
        .unwrap();
    assert_eq!(entries[0].pnl, dec!(999995.00));
    assert_eq!(entries[0].duration, "0d 4h 30m");
}

#[test]
fn test_render_writes_one_report_and_no_entry() {
    let (_base, paths) = provisioned();
    let table = MultiplierTable::default();

    let result = submit(sample_input(false), &table, at(13, 31, 0), &paths).unwrap();

    let EmitResult::Report { id, path } = &result else {
        panic!("expected a report, got {result:?}");
    };
    assert_eq!(path, &paths.reports_dir.join(format!("EURUSD_{id}.pdf")));
    assert!(fs::read(path).unwrap().starts_with(b"%PDF"));
    assert_eq!(count_with_extension(&paths.reports_dir, "pdf"), 1);
    assert_eq!(count_with_extension(&paths.data_dir, "json"), 0);
}

#[test]
fn test_custom_report_name() {
    let (_base, paths) = provisioned();
    let mut input = sample_input(false);
    input.report_name = Some("week-37-eurusd".into());

    let result = submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap();
    assert_eq!(result.path(), &paths.reports_dir.join("week-37-eurusd.pdf"));
}

#[test]
fn test_symbol_with_separators_stays_in_user_report_dir() {
    let base = tempfile::tempdir().unwrap();
    let hamza = UserPaths::new(base.path(), "hamza").unwrap();
    let sara = UserPaths::new(base.path(), "sara").unwrap();
    hamza.provision().unwrap();
    sara.provision().unwrap();
    let table = MultiplierTable::default();

    for symbol in ["BTC/USD", "../sara/EURUSD"] {
        let mut input = sample_input(false);
        input.symbol = symbol.into();
        let result = submit(input, &table, at(13, 31, 0), &hamza).unwrap();
        assert_eq!(result.path().parent(), Some(hamza.reports_dir.as_path()));
        assert!(result.path().is_file());
    }

    assert_eq!(count_with_extension(&hamza.reports_dir, "pdf"), 2);
    assert_eq!(count_with_extension(&sara.reports_dir, "pdf"), 0);
}

#[test]
fn test_oversized_trade_writes_nothing() {
    let (_base, paths) = provisioned();
    let mut input = sample_input(true);
    input.exit_price = rust_decimal::Decimal::from_str_exact("1000000000000000000000000").unwrap();
    input.screenshot = Some(png_bytes(8, 8));

    let err = submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap_err();
    assert!(matches!(err, JournalError::InvalidInput { .. }));
    assert_eq!(fs::read_dir(&paths.data_dir).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&paths.reports_dir).unwrap().count(), 0);
}

#[test]
fn test_report_with_logo_and_screenshot() {
    let (_base, paths) = provisioned();
    fs::write(paths.logo_path("EURUSD"), png_bytes(64, 64)).unwrap();
    let mut input = sample_input(false);
    input.screenshot = Some(jpeg_bytes());
    input.position = Position::Short; // losing trade, red PnL

    let result = submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap();

    assert!(fs::read(result.path()).unwrap().starts_with(b"%PDF"));
    // Screenshot normalised to PNG in the data directory
    assert_eq!(count_with_extension(&paths.data_dir, "png"), 1);
}

#[test]
fn test_tall_screenshot_paginates() {
    let (_base, paths) = provisioned();
    let mut input = sample_input(false);
    input.screenshot = Some(png_bytes(40, 400));

    let result = submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap();
    assert!(result.path().is_file());
}

#[test]
fn test_unreadable_logo_is_skipped() {
    let (_base, paths) = provisioned();
    fs::write(paths.logo_path("EURUSD"), b"not a png").unwrap();

    let result = submit(
        sample_input(false),
        &MultiplierTable::default(),
        at(13, 31, 0),
        &paths,
    );
    assert!(result.is_ok());
}

#[test]
fn test_malformed_screenshot_rejects_submission() {
    let (_base, paths) = provisioned();
    for combine in [true, false] {
        let mut input = sample_input(combine);
        input.screenshot = Some(vec![0x89, b'P', b'N', b'G', 0, 1, 2]);

        let err = submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap_err();
        assert!(matches!(err, JournalError::MalformedImage(_)));
    }
    assert_eq!(fs::read_dir(&paths.data_dir).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&paths.reports_dir).unwrap().count(), 0);
}

#[test]
fn test_inverted_times_persist_negative_duration() {
    let (_base, paths) = provisioned();
    let mut input = sample_input(true);
    input.exit_time = at(8, 59, 59);

    submit(input, &MultiplierTable::default(), at(13, 31, 0), &paths).unwrap();
    let entries = JournalStore::new(&paths.data_dir)
        .list(&JournalFilter::default())
        .unwrap();
    assert_eq!(entries[0].duration, "-1d 23h 59m");
    assert_eq!(entries[0].duration_seconds, -1);
}

#[test]
fn test_write_failures_surface_for_both_branches() {
    let base = tempfile::tempdir().unwrap();
    // Not provisioned: neither directory exists
    let paths = UserPaths::new(base.path(), "sara").unwrap();

    for combine in [true, false] {
        let err = submit(
            sample_input(combine),
            &MultiplierTable::default(),
            at(13, 31, 0),
            &paths,
        )
        .unwrap_err();
        assert!(
            matches!(err, JournalError::StorageWrite { .. }),
            "combine={combine}: {err:?}"
        );
    }
}

#[test]
fn test_emit_uses_given_record_id() {
    let (_base, paths) = provisioned();
    let record = trade_journal_core::record::build_record(
        sample_input(true),
        dec!(100000),
        dec!(999995),
        at(13, 31, 0),
        &paths.data_dir,
    )
    .unwrap();

    let result = emit(&record, true, &paths).unwrap();
    assert_eq!(
        result,
        EmitResult::JournalEntry {
            id: record.id.clone(),
            path: paths.data_dir.join(format!("trade_{}.json", record.id)),
        }
    );
}

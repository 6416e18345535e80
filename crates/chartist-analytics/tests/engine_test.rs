//! 엔진 통합 테스트: 실제 전략, 다중 종목 실행, 병렬 실행.

use std::sync::Arc;

use chartist_analytics::{BacktestConfig, BacktestEngine, BacktestError, RoundedReport};
use chartist_core::{Bar, Instrument, SignalAction};
use chartist_data::{BarProvider, DateWindow, MemoryBarProvider};
use chartist_strategy::create_strategy;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

/// 지지 10 / 저항 12 박스 60봉 + 이탈 봉 + 회복 봉
fn box_break_reclaim() -> Vec<Bar> {
    let t0 = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    let mut bars: Vec<Bar> = (0..60)
        .map(|i| Bar::new(t0 + Duration::days(i), 11.0, 12.0, 10.0, 11.0, 100))
        .collect();
    bars.push(Bar::new(t0 + Duration::days(60), 11.0, 11.5, 9.0, 9.5, 200));
    bars.push(Bar::new(t0 + Duration::days(61), 9.6, 10.6, 9.4, 10.2, 200));
    bars
}

fn with_follow_through(mut bars: Vec<Bar>, count: i64) -> Vec<Bar> {
    let t = bars[bars.len() - 1].time;
    for i in 1..=count {
        bars.push(Bar::new(t + Duration::days(i), 10.4, 10.8, 10.3, 10.6, 150));
    }
    bars
}

fn sr_engine() -> BacktestEngine {
    let config = BacktestConfig::new(100_000.0)
        .with_slippage_bps(0.0)
        .with_commission_bps(1.0);
    let strategy = create_strategy("support_resistance", &json!({ "break_pct": 0.01 })).unwrap();
    BacktestEngine::new(config, strategy).unwrap()
}

#[test]
fn test_reclaim_entry_fills_next_open() {
    let bars = with_follow_through(box_break_reclaim(), 10);
    let report = sr_engine().run(&Instrument::stock("600000"), &bars);

    assert!(report.is_ok());
    assert!(report.total_trades >= 1);
    let trade = &report.trades[0];
    assert_eq!(trade.entry_time, bars[62].time);
    assert_eq!(trade.entry_price, 10.4);
    assert_eq!(trade.reason_entry, "break_bottom_flip_reclaim_support");
    assert_eq!(trade.quantity, 9_600.0);
    assert!((trade.net_pnl - (trade.gross_pnl - trade.entry_fee - trade.exit_fee)).abs() < 1e-9);
    // 신호 봉까지는 현금 그대로
    assert_eq!(report.equity_curve[61].equity, 100_000.0);
}

#[test]
fn test_scan_reports_reclaim_on_last_bar() {
    let bars = box_break_reclaim();
    let report = sr_engine().scan(&Instrument::stock("600000"), &bars);

    assert!(report.is_ok());
    assert_eq!(report.next_action, Some(SignalAction::Buy));
    assert_eq!(report.reason.as_deref(), Some("break_bottom_flip_reclaim_support"));
    assert_eq!(report.suggested_target, Some(14.0));
    let stop = report.suggested_stop.unwrap();
    assert!((stop - 8.955).abs() <= 0.0051);
    assert_eq!(report.support, Some(10.0));
    assert_eq!(report.resistance, Some(12.0));
    assert_eq!(report.last_close, 10.2);
    assert!(report.entry_date.is_none());
}

#[test]
fn test_rerun_is_identical() {
    let bars = with_follow_through(box_break_reclaim(), 10);
    let engine = sr_engine();
    let instrument = Instrument::stock("600000");

    let first = engine.run(&instrument, &bars);
    let second = engine.run(&instrument, &bars);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&RoundedReport::from(&first)).unwrap(),
        serde_json::to_string(&RoundedReport::from(&second)).unwrap()
    );
}

#[tokio::test]
async fn test_run_all_records_per_instrument_errors() {
    let bars = with_follow_through(box_break_reclaim(), 5);
    let provider = MemoryBarProvider::new()
        .with_bars("AAA", bars.clone())
        .with_bars("SHORT", bars[..20].to_vec());
    let instruments = vec![
        Instrument::stock("AAA"),
        Instrument::stock("MISSING"),
        Instrument::stock("SHORT"),
    ];

    let reports = sr_engine()
        .run_all(&provider, &instruments, &DateWindow::default())
        .await
        .unwrap();

    let symbols: Vec<_> = reports.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAA", "MISSING", "SHORT"]);
    assert!(reports[0].is_ok());
    assert_eq!(reports[1].errors.len(), 1);
    assert_eq!(reports[2].errors, vec!["not enough bars: 20".to_string()]);
}

#[tokio::test]
async fn test_run_all_without_instruments() {
    let provider = MemoryBarProvider::new();
    let err = sr_engine()
        .run_all(&provider, &[], &DateWindow::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BacktestError::NoInstruments));
}

#[tokio::test]
async fn test_scan_all_keeps_order() {
    let provider = MemoryBarProvider::new()
        .with_bars("B", box_break_reclaim())
        .with_bars("A", with_follow_through(box_break_reclaim(), 3));
    let instruments = vec![Instrument::stock("B"), Instrument::stock("A")];

    let reports = sr_engine()
        .scan_all(&provider, &instruments, &DateWindow::default())
        .await
        .unwrap();

    assert_eq!(reports[0].symbol, "B");
    assert!(reports[0].has_signal());
    assert_eq!(reports[1].symbol, "A");
    assert!(!reports[1].has_signal());
}

#[tokio::test]
async fn test_concurrent_matches_sequential() {
    let mut provider = MemoryBarProvider::new();
    let mut instruments = Vec::new();
    for (i, extra) in [10_i64, 3, 7, 0, 12].iter().enumerate() {
        let symbol = format!("S{i}");
        provider.insert(symbol.clone(), with_follow_through(box_break_reclaim(), *extra));
        instruments.push(Instrument::stock(symbol));
    }
    instruments.push(Instrument::stock("MISSING"));

    let engine = Arc::new(sr_engine());
    let provider: Arc<dyn BarProvider> = Arc::new(provider);
    let window = DateWindow::default();

    let sequential = engine
        .run_all(provider.as_ref(), &instruments, &window)
        .await
        .unwrap();
    let concurrent = Arc::clone(&engine)
        .run_all_concurrent(Arc::clone(&provider), instruments.clone(), window)
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    let symbols: Vec<_> = concurrent.iter().map(|r| r.symbol.clone()).collect();
    assert_eq!(symbols, vec!["S0", "S1", "S2", "S3", "S4", "MISSING"]);
    assert!(!concurrent[5].is_ok());
}

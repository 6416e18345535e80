//! 지지/저항 전략 시나리오 테스트.

use chartist_core::{Bar, Position, SignalAction};
use chartist_strategy::strategies::support_resistance::FlipPhase;
use chartist_strategy::{
    create_strategy, Strategy, SupportResistanceConfig, SupportResistanceStrategy,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

/// 지지 10 / 저항 12의 평평한 박스 60봉 + 이탈 봉 + 회복 봉
fn box_break_reclaim() -> Vec<Bar> {
    let t0 = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    let mut bars: Vec<Bar> = (0..60)
        .map(|i| Bar::new(t0 + Duration::days(i), 11.0, 12.0, 10.0, 11.0, 100))
        .collect();
    bars.push(Bar::new(t0 + Duration::days(60), 11.0, 11.5, 9.0, 9.5, 200));
    bars.push(Bar::new(t0 + Duration::days(61), 9.6, 10.6, 9.4, 10.2, 200));
    bars
}

#[test]
fn test_reclaim_emits_buy_on_reclaim_bar() {
    let bars = box_break_reclaim();
    let mut strategy = create_strategy("support_resistance", &json!({ "break_pct": 0.01 })).unwrap();

    let flat = Position::flat();
    let signals: Vec<_> = (0..bars.len())
        .filter_map(|i| strategy.on_bar(i, &bars, &flat).map(|s| (i, s)))
        .collect();

    assert_eq!(signals.len(), 1);
    let (index, signal) = &signals[0];
    assert_eq!(*index, 61);
    assert_eq!(signal.action, SignalAction::Buy);
    assert_eq!(signal.reason, "break_bottom_flip_reclaim_support");
    assert_eq!(signal.time, bars[61].time);

    let levels = strategy.trade_levels(bars[61].time).unwrap();
    assert!((levels.target - 14.0).abs() < 1e-9);
    assert!((levels.stop - 9.0 * 0.995).abs() < 1e-9);

    let key = strategy.key_levels(&bars, 61).unwrap();
    assert_eq!((key.support, key.resistance), (10.0, 12.0));
}

#[test]
fn test_break_resistance_mode_waits_for_box_top() {
    let mut bars = box_break_reclaim();
    let t = bars.last().unwrap().time;
    bars.push(Bar::new(t + Duration::days(1), 10.3, 11.8, 10.2, 11.5, 150));
    bars.push(Bar::new(t + Duration::days(2), 11.6, 12.6, 11.5, 12.4, 150));

    let config = SupportResistanceConfig {
        break_pct: 0.01,
        entry_mode: chartist_strategy::strategies::EntryMode::BreakResistance,
        ..Default::default()
    };
    let mut strategy = SupportResistanceStrategy::new(config).unwrap();
    let flat = Position::flat();

    for i in 60..=62 {
        assert!(strategy.on_bar(i, &bars, &flat).is_none(), "bar {i}");
    }
    assert!(matches!(strategy.state().flip, FlipPhase::FlipReady { .. }));

    let signal = strategy.on_bar(63, &bars, &flat).unwrap();
    assert_eq!(signal.reason, "break_bottom_flip_break_resistance");
    assert_eq!(strategy.state().flip, FlipPhase::Idle);
}

#[test]
fn test_fresh_clone_replays_identically() {
    let bars = box_break_reclaim();
    let template = create_strategy("tsai_sen", &json!({ "break_pct": 0.01 })).unwrap();

    let run = |mut s: Box<dyn Strategy>| -> Vec<String> {
        let flat = Position::flat();
        (0..bars.len())
            .filter_map(|i| s.on_bar(i, &bars, &flat).map(|sig| sig.reason))
            .collect()
    };

    assert_eq!(run(template.clone_fresh()), run(template.clone_fresh()));
}

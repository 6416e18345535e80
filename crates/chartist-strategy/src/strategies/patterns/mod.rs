//! 차트 패턴 전략.
//!
//! 매 봉마다 `lookback` 구간의 피벗으로 머리어깨, 쌍봉/쌍바닥, 삼각수렴,
//! 3파동 패턴을 우선순위대로 탐지합니다. 탐지된 계획은 대기(pending) 상태로
//! 보관되다가 체결이 확인되면 활성(active) 계획으로 승격되고, 보유 중에는
//! 활성 계획의 목표가/손절가로 청산합니다.
//!
//! 탐지 우선순위: 머리어깨 천장 → 역머리어깨 → 쌍봉 → 쌍바닥 → 삼각수렴 →
//! 상승 3파동 → 하락 3파동.

pub mod detectors;
pub mod plan;

pub use detectors::{
    detect_hs_bottom, detect_hs_top, detect_m_top, detect_triangle, detect_w_bottom,
    detect_wave_down, detect_wave_up,
};
pub use plan::{validate_plan, TradePlan};

use chartist_core::{Bar, Position, Side, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ensure_range, StrategyResult};
use crate::strategies::common::{collect_pivots, PivotPoint};
use crate::traits::{Strategy, TradeLevels};

// ============================================================================
// 설정 (Config)
// ============================================================================

/// 패턴 전략 설정.
///
/// 패턴 토글이 하나도 켜져 있지 않으면 모든 패턴이 활성화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// 피벗 수집 구간 (봉 수)
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// 피벗 반폭
    #[serde(default = "default_pivot_n")]
    pub pivot_n: usize,

    /// 근사 동일 허용 오차 (비율)
    #[serde(default = "default_equal_tol_pct")]
    pub equal_tol_pct: f64,

    /// 넥라인 돌파 여유 (비율)
    #[serde(default = "default_break_pct")]
    pub break_pct: f64,

    /// 손절 버퍼 (비율)
    #[serde(default = "default_stop_buffer_pct")]
    pub stop_buffer_pct: f64,

    /// 목표가 배수 (패턴 높이 대비)
    #[serde(default = "default_target_multiple")]
    pub target_multiple: f64,

    #[serde(default)]
    pub enable_hs_top: bool,
    #[serde(default)]
    pub enable_hs_bottom: bool,
    #[serde(default)]
    pub enable_m_top: bool,
    #[serde(default)]
    pub enable_w_bottom: bool,
    #[serde(default)]
    pub enable_triangle_breakout: bool,
    #[serde(default)]
    pub enable_triangle_breakdown: bool,
    #[serde(default)]
    pub enable_wave_up: bool,
    #[serde(default)]
    pub enable_wave_down: bool,

    /// 삼각수렴 피벗 수집 구간
    #[serde(default = "default_triangle_lookback")]
    pub triangle_lookback: usize,

    /// 삼각수렴 상단/하단 최소 피벗 수
    #[serde(default = "default_triangle_min_pivots")]
    pub triangle_min_pivots: usize,

    /// 돌파 인정 최소 진행 비율 (시작 → 꼭짓점)
    #[serde(default = "default_triangle_min_break_frac")]
    pub triangle_min_break_frac: f64,

    /// 돌파 인정 최대 진행 비율
    #[serde(default = "default_triangle_max_break_frac")]
    pub triangle_max_break_frac: f64,

    /// 대기 계획 유지 봉 수 (미체결 시 폐기)
    #[serde(default = "default_pending_grace_bars")]
    pub pending_grace_bars: usize,
}

fn default_lookback() -> usize {
    220
}
fn default_pivot_n() -> usize {
    3
}
fn default_equal_tol_pct() -> f64 {
    0.02
}
fn default_break_pct() -> f64 {
    0.005
}
fn default_stop_buffer_pct() -> f64 {
    0.005
}
fn default_target_multiple() -> f64 {
    1.0
}
fn default_triangle_lookback() -> usize {
    160
}
fn default_triangle_min_pivots() -> usize {
    3
}
fn default_triangle_min_break_frac() -> f64 {
    0.66
}
fn default_triangle_max_break_frac() -> f64 {
    0.75
}
fn default_pending_grace_bars() -> usize {
    2
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            pivot_n: default_pivot_n(),
            equal_tol_pct: default_equal_tol_pct(),
            break_pct: default_break_pct(),
            stop_buffer_pct: default_stop_buffer_pct(),
            target_multiple: default_target_multiple(),
            enable_hs_top: false,
            enable_hs_bottom: false,
            enable_m_top: false,
            enable_w_bottom: false,
            enable_triangle_breakout: false,
            enable_triangle_breakdown: false,
            enable_wave_up: false,
            enable_wave_down: false,
            triangle_lookback: default_triangle_lookback(),
            triangle_min_pivots: default_triangle_min_pivots(),
            triangle_min_break_frac: default_triangle_min_break_frac(),
            triangle_max_break_frac: default_triangle_max_break_frac(),
            pending_grace_bars: default_pending_grace_bars(),
        }
    }
}

impl PatternConfig {
    fn toggles(&self) -> [bool; 8] {
        [
            self.enable_hs_top,
            self.enable_hs_bottom,
            self.enable_m_top,
            self.enable_w_bottom,
            self.enable_triangle_breakout,
            self.enable_triangle_breakdown,
            self.enable_wave_up,
            self.enable_wave_down,
        ]
    }

    /// 토글이 모두 꺼져 있으면 전부 켠 설정을 반환합니다.
    pub fn normalized(mut self) -> Self {
        if !self.toggles().iter().any(|on| *on) {
            self.enable_hs_top = true;
            self.enable_hs_bottom = true;
            self.enable_m_top = true;
            self.enable_w_bottom = true;
            self.enable_triangle_breakout = true;
            self.enable_triangle_breakdown = true;
            self.enable_wave_up = true;
            self.enable_wave_down = true;
        }
        self
    }

    /// 매개변수 범위를 검증합니다.
    pub fn validate(&self) -> StrategyResult<()> {
        let c = self;
        ensure_range((20..=2000).contains(&c.lookback), "lookback", c.lookback, "[20, 2000]")?;
        ensure_range((1..=20).contains(&c.pivot_n), "pivot_n", c.pivot_n, "[1, 20]")?;
        ensure_range(
            c.equal_tol_pct > 0.0 && c.equal_tol_pct <= 0.2,
            "equal_tol_pct",
            c.equal_tol_pct,
            "(0, 0.2]",
        )?;
        ensure_range((0.0..=0.2).contains(&c.break_pct), "break_pct", c.break_pct, "[0, 0.2]")?;
        ensure_range(
            (0.0..=0.2).contains(&c.stop_buffer_pct),
            "stop_buffer_pct",
            c.stop_buffer_pct,
            "[0, 0.2]",
        )?;
        ensure_range(
            c.target_multiple > 0.0 && c.target_multiple <= 10.0,
            "target_multiple",
            c.target_multiple,
            "(0, 10]",
        )?;
        ensure_range(
            (20..=2000).contains(&c.triangle_lookback),
            "triangle_lookback",
            c.triangle_lookback,
            "[20, 2000]",
        )?;
        ensure_range(
            (2..=50).contains(&c.triangle_min_pivots),
            "triangle_min_pivots",
            c.triangle_min_pivots,
            "[2, 50]",
        )?;
        ensure_range(
            c.triangle_min_break_frac > 0.0 && c.triangle_min_break_frac <= c.triangle_max_break_frac,
            "triangle_min_break_frac",
            c.triangle_min_break_frac,
            "(0, triangle_max_break_frac]",
        )?;
        ensure_range(
            c.triangle_max_break_frac <= 0.95,
            "triangle_max_break_frac",
            c.triangle_max_break_frac,
            "[triangle_min_break_frac, 0.95]",
        )?;
        ensure_range(
            c.pending_grace_bars <= 50,
            "pending_grace_bars",
            c.pending_grace_bars,
            "[0, 50]",
        )?;
        Ok(())
    }
}

// ============================================================================
// 전략 상태
// ============================================================================

/// 패턴 전략 상태.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternState {
    /// 체결 대기 중인 계획
    pub pending: Option<TradePlan>,
    /// 대기 계획이 미체결로 지난 봉 수
    pub pending_age: usize,
    /// 보유 포지션의 계획
    pub active: Option<TradePlan>,
    /// 직전 봉의 포지션 방향
    pub last_side: Side,
}

// ============================================================================
// 전략 구현
// ============================================================================

/// 차트 패턴 전략.
#[derive(Debug, Clone)]
pub struct PatternStrategy {
    config: PatternConfig,
    state: PatternState,
}

impl PatternStrategy {
    /// 검증된 설정으로 전략을 생성합니다. 토글은 [`PatternConfig::normalized`]를 거칩니다.
    pub fn new(config: PatternConfig) -> StrategyResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.normalized(),
            state: PatternState::default(),
        })
    }

    /// 현재 설정.
    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// 현재 상태.
    pub fn state(&self) -> &PatternState {
        &self.state
    }

    /// `index` 봉에서 우선순위대로 패턴을 탐지합니다.
    pub fn detect(&self, index: usize, bars: &[Bar]) -> Option<TradePlan> {
        let c = &self.config;
        let start = index.saturating_sub(c.lookback);
        let pivots = collect_pivots(bars, start, index, c.pivot_n);

        type Detector = fn(usize, &[Bar], &[PivotPoint], &PatternConfig) -> Option<TradePlan>;
        let pivot_detectors: [(bool, Detector); 4] = [
            (c.enable_hs_top, detect_hs_top),
            (c.enable_hs_bottom, detect_hs_bottom),
            (c.enable_m_top, detect_m_top),
            (c.enable_w_bottom, detect_w_bottom),
        ];
        for (enabled, detector) in pivot_detectors {
            if enabled {
                if let Some(plan) = detector(index, bars, &pivots, c) {
                    return Some(plan);
                }
            }
        }

        if c.enable_triangle_breakout || c.enable_triangle_breakdown {
            if let Some(plan) = detect_triangle(index, bars, c) {
                return Some(plan);
            }
        }

        let wave_detectors: [(bool, Detector); 2] = [
            (c.enable_wave_up, detect_wave_up),
            (c.enable_wave_down, detect_wave_down),
        ];
        wave_detectors
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .find_map(|(_, detector)| detector(index, bars, &pivots, c))
    }

    /// 포지션 변화에 맞춰 대기/활성 계획을 갱신합니다.
    fn track_position(&mut self, index: usize, side: Side) {
        let state = &mut self.state;
        if side == Side::Flat {
            if state.pending.is_some() {
                state.pending_age += 1;
                if state.pending_age > self.config.pending_grace_bars {
                    debug!(index, "미체결 대기 계획 폐기");
                    state.pending = None;
                    state.pending_age = 0;
                }
            }
            state.active = None;
        } else if state.last_side == Side::Flat {
            if let Some(plan) = state.pending.take() {
                if plan.side == side {
                    debug!(index, reason = %plan.reason, "대기 계획 활성화");
                    state.active = Some(plan);
                }
            }
            state.pending_age = 0;
        }
        state.last_side = side;
    }

    fn check_exit(&self, bar: &Bar, side: Side) -> Option<Signal> {
        let plan = self.state.active.as_ref()?;
        let close = bar.close;
        if close <= 0.0 {
            return None;
        }
        match side {
            Side::Long if close >= plan.target => {
                Some(Signal::sell(bar.time, format!("{}|target", plan.reason)))
            }
            Side::Long if close <= plan.stop => {
                Some(Signal::sell(bar.time, format!("{}|stop", plan.reason)))
            }
            Side::Short if close <= plan.target => {
                Some(Signal::cover(bar.time, format!("{}|target", plan.reason)))
            }
            Side::Short if close >= plan.stop => {
                Some(Signal::cover(bar.time, format!("{}|stop", plan.reason)))
            }
            _ => None,
        }
    }
}

impl Strategy for PatternStrategy {
    fn name(&self) -> &str {
        "patterns"
    }

    fn on_bar(&mut self, index: usize, bars: &[Bar], position: &Position) -> Option<Signal> {
        if index == 0 || index >= bars.len() {
            return None;
        }
        let side = position.side;
        self.track_position(index, side);

        let bar = &bars[index];
        if side != Side::Flat {
            return self.check_exit(bar, side);
        }

        let plan = self.detect(index, bars)?;
        debug!(
            index,
            reason = %plan.reason,
            stop = plan.stop,
            target = plan.target,
            "패턴 진입 신호"
        );
        let signal = match plan.side {
            Side::Short => Signal::short(bar.time, plan.reason.clone()),
            _ => Signal::buy(bar.time, plan.reason.clone()),
        };
        self.state.pending = Some(plan);
        self.state.pending_age = 0;
        Some(signal)
    }

    fn clone_fresh(&self) -> Box<dyn Strategy> {
        Box::new(Self {
            config: self.config.clone(),
            state: PatternState::default(),
        })
    }

    fn trade_levels(&self, _last_time: DateTime<Utc>) -> Option<TradeLevels> {
        self.state
            .pending
            .as_ref()
            .or(self.state.active.as_ref())
            .map(TradePlan::levels)
    }

    fn get_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartist_core::SignalAction;
    use chrono::{Duration, TimeZone};

    fn line_bars(prices: &[f64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::new(t0 + Duration::days(i as i64), p, p, p, p, 100))
            .collect()
    }

    fn w_bottom_config() -> PatternConfig {
        PatternConfig {
            pivot_n: 1,
            equal_tol_pct: 0.10,
            enable_w_bottom: true,
            ..Default::default()
        }
    }

    const W_PRICES: [f64; 15] = [
        100.0, 80.0, 60.0, 40.0, 20.0, 30.0, 40.0, 60.0, 80.0, 60.0, 40.0, 21.0, 30.0, 50.0, 81.0,
    ];

    #[test]
    fn test_toggles_normalized_when_none_set() {
        let s = PatternStrategy::new(PatternConfig::default()).unwrap();
        assert!(s.config().toggles().iter().all(|on| *on));

        let s = PatternStrategy::new(w_bottom_config()).unwrap();
        assert!(s.config().enable_w_bottom);
        assert!(!s.config().enable_m_top);
    }

    #[test]
    fn test_config_validation() {
        assert!(PatternConfig::default().validate().is_ok());

        let bad = PatternConfig {
            triangle_min_break_frac: 0.8,
            triangle_max_break_frac: 0.7,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = PatternConfig {
            lookback: 10,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = PatternConfig {
            pending_grace_bars: 51,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_w_bottom_entry_then_target_exit() {
        let mut prices = W_PRICES.to_vec();
        prices.push(140.0);
        let bars = line_bars(&prices);
        let mut s = PatternStrategy::new(w_bottom_config()).unwrap();

        let flat = Position::flat();
        let mut signals = Vec::new();
        for i in 1..15 {
            if let Some(sig) = s.on_bar(i, &bars, &flat) {
                signals.push((i, sig));
            }
        }
        assert_eq!(signals.len(), 1);
        let (i, sig) = &signals[0];
        assert_eq!(*i, 14);
        assert_eq!(sig.action, SignalAction::Buy);
        assert_eq!(sig.reason, "w_bottom");

        let levels = s.trade_levels(bars[14].time).unwrap();
        assert!((levels.target - 140.0).abs() < 1e-9);
        assert!((levels.stop - 19.9).abs() < 1e-9);

        // 다음 봉 시가 체결 후 목표가 도달
        let long = Position::open(Side::Long, 10.0, bars[15].time, 140.0, 0.0, 0.0);
        let exit = s.on_bar(15, &bars, &long).unwrap();
        assert_eq!(exit.action, SignalAction::Sell);
        assert_eq!(exit.reason, "w_bottom|target");
        assert!(s.state().pending.is_none());
        assert!(s.state().active.is_some());
    }

    #[test]
    fn test_stop_exit_for_long() {
        let mut prices = W_PRICES.to_vec();
        prices.push(19.0);
        let bars = line_bars(&prices);
        let mut s = PatternStrategy::new(w_bottom_config()).unwrap();

        let flat = Position::flat();
        for i in 1..15 {
            s.on_bar(i, &bars, &flat);
        }
        let long = Position::open(Side::Long, 10.0, bars[15].time, 81.0, 0.0, 0.0);
        let exit = s.on_bar(15, &bars, &long).unwrap();
        assert_eq!(exit.reason, "w_bottom|stop");
    }

    #[test]
    fn test_pending_plan_expires_after_grace() {
        let mut prices = W_PRICES.to_vec();
        prices.extend([70.0, 70.0, 70.0]);
        let bars = line_bars(&prices);
        let mut s = PatternStrategy::new(w_bottom_config()).unwrap();

        let flat = Position::flat();
        for i in 1..15 {
            s.on_bar(i, &bars, &flat);
        }
        assert!(s.state().pending.is_some());

        assert!(s.on_bar(15, &bars, &flat).is_none());
        assert!(s.on_bar(16, &bars, &flat).is_none());
        assert_eq!(s.state().pending_age, 2);
        assert!(s.state().pending.is_some());

        assert!(s.on_bar(17, &bars, &flat).is_none());
        assert!(s.state().pending.is_none());
        assert!(s.trade_levels(bars[17].time).is_none());
    }

    #[test]
    fn test_clone_fresh_resets_state() {
        let bars = line_bars(&W_PRICES);
        let mut s = PatternStrategy::new(w_bottom_config()).unwrap();
        for i in 1..15 {
            s.on_bar(i, &bars, &Position::flat());
        }
        let fresh = s.clone_fresh();
        assert!(fresh.get_state()["pending"].is_null());
        assert_eq!(fresh.name(), "patterns");
    }
}

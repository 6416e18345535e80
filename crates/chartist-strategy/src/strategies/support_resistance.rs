//! 지지/저항 돌파-회복 전략 (破底翻).
//!
//! ## 핵심 아이디어
//!
//! 박스권 지지선을 장중에 깨고 내려갔던 가격이 짧은 기간 안에 다시 지지선 위로
//! 복귀하면, 매도 세력이 소진된 반전 신호로 보고 매수합니다.
//!
//! ## 상태 전이 (봉 마감 기준, 체결은 다음 봉 시가)
//!
//! 1. **idle → break-active**: 저가가 지지선 × (1 - break_pct) 아래로 이탈
//! 2. **break-active → flip-ready**: `flip_max_bars` 이내에 종가가 지지선 위로 회복.
//!    기한이 지나면 idle로 만료
//! 3. **flip-ready → 매수**: `entry_mode`에 따라 즉시 / N봉 연속 안착 / 이탈 전 저항선 돌파
//! 4. **fake-active** (선택): 저항선 돌파 후 `fake_max_bars` 이내 종가가 저항선 아래로
//!    복귀하면 무포지션은 숏 진입, 롱 보유 중이면 청산
//!
//! 보유 중에는 종가가 지지선 아래(롱) / 저항선 위(숏)로 마감하면 청산합니다.
//! 롱 보유 중 같은 봉에서 두 청산 조건이 모두 성립하면 가짜 돌파 청산이 우선합니다.

use chartist_core::{Bar, Position, Side, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ensure_range, StrategyResult};
use crate::strategies::common::{
    cluster_level, collect_pivots, pivot_prices, volume_ma, PivotKind,
};
use crate::traits::{KeyLevels, Strategy, TradeLevels};

// ============================================================================
// 설정 (Config)
// ============================================================================

/// 지지/저항 산출 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelMode {
    /// 피벗 군집화 (실패 시 구간 극값으로 대체)
    #[default]
    Pivots,
    /// 구간 최저가/최고가
    Extremes,
}

/// 회복 이후 진입 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// 지지선 회복 즉시 진입
    #[default]
    ReclaimSupport,
    /// 회복 후 N봉 연속 안착 시 진입
    StabilizeSupport,
    /// 회복 후 이탈 전 저항선 돌파 시 진입
    BreakResistance,
}

/// 지지/저항 전략 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportResistanceConfig {
    /// 수준 산출 방식
    #[serde(default)]
    pub level_mode: LevelMode,

    /// 박스 산출 구간 (봉 수)
    #[serde(default = "default_box_lookback")]
    pub box_lookback: usize,

    /// 피벗 반폭
    #[serde(default = "default_pivot_n")]
    pub pivot_n: usize,

    /// 터치 군집 허용 오차 (비율)
    #[serde(default = "default_touch_tol_pct")]
    pub touch_tol_pct: f64,

    /// 지지/저항 각각의 최소 터치 수
    #[serde(default = "default_min_touches")]
    pub min_touches: usize,

    /// 최소 박스 폭 (지지선 대비 비율)
    #[serde(default = "default_min_range_pct")]
    pub min_range_pct: f64,

    /// 이탈/돌파 판정 여유 (비율)
    #[serde(default = "default_break_pct")]
    pub break_pct: f64,

    /// 회복 판정 여유 (비율)
    #[serde(default)]
    pub reclaim_pct: f64,

    /// 이탈 후 회복 대기 최대 봉 수
    #[serde(default = "default_flip_max_bars")]
    pub flip_max_bars: usize,

    /// 진입 방식
    #[serde(default)]
    pub entry_mode: EntryMode,

    /// 안착 확인 봉 수 (`stabilize_support`)
    #[serde(default = "default_stabilize_bars")]
    pub stabilize_bars: usize,

    /// 손절 버퍼 (비율)
    #[serde(default = "default_stop_buffer_pct")]
    pub stop_buffer_pct: f64,

    /// 목표가 배수 (박스 높이 대비)
    #[serde(default = "default_target_multiple")]
    pub target_multiple: f64,

    /// 거래량 이동평균 기간
    #[serde(default = "default_vol_ma_n")]
    pub vol_ma_n: usize,

    /// 신규 진입 최소 거래량 비율 (0이면 비활성)
    #[serde(default)]
    pub vol_ratio_min: f64,

    /// 가짜 돌파 판정 사용 여부
    #[serde(default)]
    pub enable_fake_breakout: bool,

    /// 가짜 돌파 확인 최대 봉 수
    #[serde(default = "default_fake_max_bars")]
    pub fake_max_bars: usize,
}

fn default_box_lookback() -> usize {
    60
}
fn default_pivot_n() -> usize {
    3
}
fn default_touch_tol_pct() -> f64 {
    0.003
}
fn default_min_touches() -> usize {
    3
}
fn default_min_range_pct() -> f64 {
    0.03
}
fn default_break_pct() -> f64 {
    0.005
}
fn default_flip_max_bars() -> usize {
    20
}
fn default_stabilize_bars() -> usize {
    2
}
fn default_stop_buffer_pct() -> f64 {
    0.005
}
fn default_target_multiple() -> f64 {
    1.0
}
fn default_vol_ma_n() -> usize {
    20
}
fn default_fake_max_bars() -> usize {
    10
}

impl Default for SupportResistanceConfig {
    fn default() -> Self {
        Self {
            level_mode: LevelMode::default(),
            box_lookback: default_box_lookback(),
            pivot_n: default_pivot_n(),
            touch_tol_pct: default_touch_tol_pct(),
            min_touches: default_min_touches(),
            min_range_pct: default_min_range_pct(),
            break_pct: default_break_pct(),
            reclaim_pct: 0.0,
            flip_max_bars: default_flip_max_bars(),
            entry_mode: EntryMode::default(),
            stabilize_bars: default_stabilize_bars(),
            stop_buffer_pct: default_stop_buffer_pct(),
            target_multiple: default_target_multiple(),
            vol_ma_n: default_vol_ma_n(),
            vol_ratio_min: 0.0,
            enable_fake_breakout: false,
            fake_max_bars: default_fake_max_bars(),
        }
    }
}

impl SupportResistanceConfig {
    /// 매개변수 범위를 검증합니다.
    pub fn validate(&self) -> StrategyResult<()> {
        let c = self;
        ensure_range((10..=500).contains(&c.box_lookback), "box_lookback", c.box_lookback, "[10, 500]")?;
        ensure_range((1..=20).contains(&c.pivot_n), "pivot_n", c.pivot_n, "[1, 20]")?;
        ensure_range(
            c.touch_tol_pct > 0.0 && c.touch_tol_pct <= 0.05,
            "touch_tol_pct",
            c.touch_tol_pct,
            "(0, 0.05]",
        )?;
        ensure_range((2..=50).contains(&c.min_touches), "min_touches", c.min_touches, "[2, 50]")?;
        ensure_range(
            c.min_range_pct > 0.0 && c.min_range_pct <= 0.5,
            "min_range_pct",
            c.min_range_pct,
            "(0, 0.5]",
        )?;
        ensure_range(c.break_pct > 0.0 && c.break_pct <= 0.2, "break_pct", c.break_pct, "(0, 0.2]")?;
        ensure_range((0.0..=0.2).contains(&c.reclaim_pct), "reclaim_pct", c.reclaim_pct, "[0, 0.2]")?;
        ensure_range((1..=300).contains(&c.flip_max_bars), "flip_max_bars", c.flip_max_bars, "[1, 300]")?;
        ensure_range((1..=60).contains(&c.stabilize_bars), "stabilize_bars", c.stabilize_bars, "[1, 60]")?;
        ensure_range(
            c.stop_buffer_pct > 0.0 && c.stop_buffer_pct <= 0.2,
            "stop_buffer_pct",
            c.stop_buffer_pct,
            "(0, 0.2]",
        )?;
        ensure_range(
            c.target_multiple > 0.0 && c.target_multiple <= 10.0,
            "target_multiple",
            c.target_multiple,
            "(0, 10]",
        )?;
        ensure_range((1..=300).contains(&c.vol_ma_n), "vol_ma_n", c.vol_ma_n, "[1, 300]")?;
        ensure_range((0.0..=50.0).contains(&c.vol_ratio_min), "vol_ratio_min", c.vol_ratio_min, "[0, 50]")?;
        ensure_range((1..=300).contains(&c.fake_max_bars), "fake_max_bars", c.fake_max_bars, "[1, 300]")?;
        Ok(())
    }
}

// ============================================================================
// 전략 상태
// ============================================================================

/// 지지선 이탈 시점의 박스 정보.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakSetup {
    /// 이탈 봉 인덱스
    pub index: usize,
    /// 이탈 당시 지지선
    pub support: f64,
    /// 이탈 당시 저항선
    pub resistance: f64,
    /// 이탈 중 최저가
    pub low: f64,
}

/// 롱 진입 준비 단계.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum FlipPhase {
    /// 대기
    #[default]
    Idle,
    /// 지지선 이탈 후 회복 대기
    BreakActive { setup: BreakSetup },
    /// 회복 완료, 진입 조건 대기
    FlipReady { setup: BreakSetup, reclaim_index: usize },
}

/// 저항선 돌파(가짜 돌파 후보) 정보.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FakeSetup {
    /// 돌파 봉 인덱스
    pub index: usize,
    /// 돌파 당시 지지선
    pub support: f64,
    /// 돌파 당시 저항선
    pub resistance: f64,
}

/// 전략 상태.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SupportResistanceState {
    /// 롱 진입 준비 단계
    pub flip: FlipPhase,
    /// 가짜 돌파 후보
    pub fake: Option<FakeSetup>,
    /// 마지막 진입 계획 (생성 봉 시각, 손절/목표)
    pub last_plan: Option<(DateTime<Utc>, TradeLevels)>,
}

// ============================================================================
// 전략 구현
// ============================================================================

/// 지지/저항 돌파-회복 전략.
#[derive(Debug, Clone)]
pub struct SupportResistanceStrategy {
    config: SupportResistanceConfig,
    state: SupportResistanceState,
}

impl SupportResistanceStrategy {
    /// 검증된 설정으로 전략을 생성합니다.
    pub fn new(config: SupportResistanceConfig) -> StrategyResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SupportResistanceState::default(),
        })
    }

    /// 현재 설정.
    pub fn config(&self) -> &SupportResistanceConfig {
        &self.config
    }

    /// 현재 상태.
    pub fn state(&self) -> &SupportResistanceState {
        &self.state
    }

    /// `index` 봉 직전까지의 데이터로 지지/저항을 산출합니다.
    pub fn levels_at(&self, bars: &[Bar], index: usize) -> Option<KeyLevels> {
        let levels = match self.config.level_mode {
            LevelMode::Pivots => self
                .pivot_levels(bars, index)
                .or_else(|| box_levels(bars, index, self.config.box_lookback)),
            LevelMode::Extremes => box_levels(bars, index, self.config.box_lookback),
        };
        levels.filter(KeyLevels::is_valid)
    }

    fn pivot_levels(&self, bars: &[Bar], index: usize) -> Option<KeyLevels> {
        let c = &self.config;
        let start = index.saturating_sub(c.box_lookback);
        let pivots = collect_pivots(bars, start, index, c.pivot_n);
        let lows = pivot_prices(&pivots, PivotKind::Low);
        let highs = pivot_prices(&pivots, PivotKind::High);
        if lows.len() < c.min_touches || highs.len() < c.min_touches {
            return None;
        }

        let support = cluster_level(&lows, c.touch_tol_pct)?;
        let resistance = cluster_level(&highs, c.touch_tol_pct)?;
        if support.count < c.min_touches || resistance.count < c.min_touches {
            return None;
        }

        let levels = KeyLevels {
            support: support.level,
            resistance: resistance.level,
        };
        if !levels.is_valid() || levels.height() / levels.support < c.min_range_pct {
            return None;
        }
        Some(levels)
    }

    fn update_break_state(&mut self, index: usize, bar: &Bar, levels: KeyLevels) {
        if let FlipPhase::BreakActive { setup } = self.state.flip {
            if index > setup.index + self.config.flip_max_bars {
                debug!(index, "지지선 이탈 후 회복 기한 만료");
                self.state.flip = FlipPhase::Idle;
            }
            return;
        }

        if bar.low < levels.support * (1.0 - self.config.break_pct) {
            debug!(index, support = levels.support, low = bar.low, "지지선 이탈 감지");
            self.state.flip = FlipPhase::BreakActive {
                setup: BreakSetup {
                    index,
                    support: levels.support,
                    resistance: levels.resistance,
                    low: bar.low,
                },
            };
        }
    }

    fn update_fake_state(&mut self, index: usize, bar: &Bar, levels: KeyLevels) {
        if let Some(fake) = self.state.fake {
            if index > fake.index + self.config.fake_max_bars {
                self.state.fake = None;
            }
            return;
        }

        if bar.high > levels.resistance * (1.0 + self.config.break_pct)
            && bar.close > levels.resistance
        {
            debug!(index, resistance = levels.resistance, "저항선 돌파 (가짜 돌파 후보)");
            self.state.fake = Some(FakeSetup {
                index,
                support: levels.support,
                resistance: levels.resistance,
            });
        }
    }

    /// 가짜 돌파가 확인되면 상태를 소비하고 돌파 정보를 반환합니다.
    fn confirm_fake_breakout(&mut self, index: usize, bar: &Bar, levels: KeyLevels) -> Option<FakeSetup> {
        if !self.config.enable_fake_breakout {
            return None;
        }
        self.update_fake_state(index, bar, levels);

        let fake = self.state.fake?;
        if index <= fake.index + self.config.fake_max_bars
            && bar.close < fake.resistance * (1.0 - self.config.reclaim_pct)
        {
            self.state.fake = None;
            return Some(fake);
        }
        None
    }

    fn plan_long(&self, setup: &BreakSetup) -> TradeLevels {
        let c = &self.config;
        let height = setup.resistance - setup.support;
        let mut target = setup.resistance + height * c.target_multiple;
        let mut stop = setup.low * (1.0 - c.stop_buffer_pct);
        if stop <= 0.0 {
            stop = setup.support * (1.0 - c.stop_buffer_pct);
        }
        if target <= 0.0 {
            target = setup.resistance;
        }
        TradeLevels { stop, target }
    }

    fn plan_short(&self, fake: &FakeSetup) -> TradeLevels {
        let c = &self.config;
        let height = fake.resistance - fake.support;
        let mut target = fake.support - height * c.target_multiple;
        let stop = fake.resistance * (1.0 + c.stop_buffer_pct);
        if target <= 0.0 {
            target = fake.support;
        }
        TradeLevels { stop, target }
    }

    fn enter_long(&mut self, bar: &Bar, setup: BreakSetup, reason: &str) -> Signal {
        let plan = self.plan_long(&setup);
        debug!(reason, stop = plan.stop, target = plan.target, "롱 진입 신호");
        self.state.last_plan = Some((bar.time, plan));
        self.state.flip = FlipPhase::Idle;
        Signal::buy(bar.time, reason)
    }

    fn on_flat(&mut self, index: usize, bars: &[Bar], levels: KeyLevels) -> Option<Signal> {
        let bar = &bars[index];
        let c = self.config.clone();
        self.update_break_state(index, bar, levels);

        if let FlipPhase::BreakActive { setup } = self.state.flip {
            if index <= setup.index + c.flip_max_bars
                && bar.close > setup.support * (1.0 + c.reclaim_pct)
            {
                debug!(index, support = setup.support, "지지선 회복");
                if c.entry_mode == EntryMode::ReclaimSupport {
                    return Some(self.enter_long(bar, setup, "break_bottom_flip_reclaim_support"));
                }
                self.state.flip = FlipPhase::FlipReady {
                    setup,
                    reclaim_index: index,
                };
            }
        }

        if let FlipPhase::FlipReady {
            setup,
            reclaim_index,
        } = self.state.flip
        {
            match c.entry_mode {
                EntryMode::StabilizeSupport => {
                    let need = c.stabilize_bars;
                    let level = setup.support * (1.0 + c.reclaim_pct);
                    if index + 1 >= reclaim_index + need
                        && all_closes_above(bars, index, need, level)
                    {
                        return Some(self.enter_long(
                            bar,
                            setup,
                            "break_bottom_flip_stabilize_support",
                        ));
                    }
                }
                EntryMode::BreakResistance => {
                    if bar.close > setup.resistance {
                        return Some(self.enter_long(
                            bar,
                            setup,
                            "break_bottom_flip_break_resistance",
                        ));
                    }
                }
                EntryMode::ReclaimSupport => {}
            }
        }

        if let Some(fake) = self.confirm_fake_breakout(index, bar, levels) {
            let plan = self.plan_short(&fake);
            debug!(index, stop = plan.stop, target = plan.target, "가짜 돌파 숏 진입 신호");
            self.state.last_plan = Some((bar.time, plan));
            return Some(Signal::short(bar.time, "fake_breakout_confirm"));
        }

        None
    }
}

/// `[index - lookback, index)` 구간의 최저가/최고가.
fn box_levels(bars: &[Bar], index: usize, lookback: usize) -> Option<KeyLevels> {
    let start = index.saturating_sub(lookback);
    let window = bars.get(start..index)?;
    if window.is_empty() {
        return None;
    }
    let support = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let resistance = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    Some(KeyLevels {
        support,
        resistance,
    })
}

/// `[index - n + 1, index]` 구간의 종가가 모두 `level` 초과인지 확인합니다.
fn all_closes_above(bars: &[Bar], index: usize, n: usize, level: f64) -> bool {
    if n == 0 {
        return false;
    }
    let start = (index + 1).saturating_sub(n);
    bars[start..=index].iter().all(|b| b.close > level)
}

impl Strategy for SupportResistanceStrategy {
    fn name(&self) -> &str {
        "support_resistance"
    }

    fn on_bar(&mut self, index: usize, bars: &[Bar], position: &Position) -> Option<Signal> {
        if index == 0 || index < self.config.box_lookback || index >= bars.len() {
            return None;
        }

        let bar = bars[index];
        let levels = self.levels_at(bars, index)?;

        // 거래량 필터는 신규 진입만 막고 청산은 막지 않습니다.
        if self.config.vol_ratio_min > 0.0 && position.is_flat() {
            let ma = volume_ma(bars, index, self.config.vol_ma_n);
            if ma > 0.0 && (bar.volume as f64) / ma < self.config.vol_ratio_min {
                return None;
            }
        }

        match position.side {
            Side::Long => {
                // 가짜 돌파 청산이 기본 지지선 청산보다 먼저 평가됩니다.
                if self.confirm_fake_breakout(index, &bar, levels).is_some() {
                    return Some(Signal::sell(bar.time, "fake_breakout_confirm"));
                }
                if bar.close < levels.support {
                    return Some(Signal::sell(bar.time, "close_below_support"));
                }
                None
            }
            Side::Short => {
                if bar.close > levels.resistance {
                    return Some(Signal::cover(bar.time, "close_above_resistance"));
                }
                None
            }
            Side::Flat => self.on_flat(index, bars, levels),
        }
    }

    fn clone_fresh(&self) -> Box<dyn Strategy> {
        Box::new(Self {
            config: self.config.clone(),
            state: SupportResistanceState::default(),
        })
    }

    fn key_levels(&self, bars: &[Bar], index: usize) -> Option<KeyLevels> {
        self.levels_at(bars, index)
    }

    fn trade_levels(&self, last_time: DateTime<Utc>) -> Option<TradeLevels> {
        self.state
            .last_plan
            .filter(|(time, _)| *time == last_time)
            .map(|(_, plan)| plan)
    }

    fn get_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

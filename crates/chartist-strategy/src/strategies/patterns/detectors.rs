//! 차트 패턴 탐지기.
//!
//! 각 탐지기는 `index` 봉 종가 기준으로 패턴 완성을 확인하고, 검증을 통과한
//! 계획만 반환합니다. 피벗은 `index` 이전 봉에서만 수집됩니다.

use chartist_core::{Bar, Side};

use super::plan::{validate_plan, TradePlan};
use super::PatternConfig;
use crate::strategies::common::{
    approx_equal, collect_pivots, prev_pivot, solve_triangle, PivotKind, PivotPoint, Trendline,
};

fn close_at(bars: &[Bar], index: usize) -> Option<f64> {
    bars.get(index).map(|b| b.close).filter(|c| *c > 0.0)
}

/// 쌍봉 (M-Top): 고점-저점-고점, 두 고점이 근사 동일하고 종가가 넥라인을 하향 이탈.
pub fn detect_m_top(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    for (pos, h2) in pivots.iter().enumerate().rev() {
        if h2.kind != PivotKind::High || h2.index >= index {
            continue;
        }
        let Some((low_pos, neck_pivot)) = prev_pivot(pivots, pos, PivotKind::Low) else {
            continue;
        };
        let Some((_, h1)) = prev_pivot(pivots, low_pos, PivotKind::High) else {
            continue;
        };
        if !approx_equal(h1.price, h2.price, config.equal_tol_pct) {
            continue;
        }

        let neck = neck_pivot.price;
        if neck <= 0.0 || close >= neck * (1.0 - config.break_pct) {
            continue;
        }
        let top = h1.price.max(h2.price);
        let height = top - neck;
        if height <= 0.0 {
            continue;
        }

        return validate_plan(TradePlan::new(
            Side::Short,
            neck - height * config.target_multiple,
            top * (1.0 + config.stop_buffer_pct),
            "m_top",
        ));
    }
    None
}

/// 쌍바닥 (W-Bottom): 저점-고점-저점, 두 저점이 근사 동일하고 종가가 넥라인을 상향 돌파.
pub fn detect_w_bottom(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    for (pos, l2) in pivots.iter().enumerate().rev() {
        if l2.kind != PivotKind::Low || l2.index >= index {
            continue;
        }
        let Some((high_pos, neck_pivot)) = prev_pivot(pivots, pos, PivotKind::High) else {
            continue;
        };
        let Some((_, l1)) = prev_pivot(pivots, high_pos, PivotKind::Low) else {
            continue;
        };
        if !approx_equal(l1.price, l2.price, config.equal_tol_pct) {
            continue;
        }

        let neck = neck_pivot.price;
        if close <= neck * (1.0 + config.break_pct) {
            continue;
        }
        let bottom = l1.price.min(l2.price);
        let height = neck - bottom;
        if height <= 0.0 {
            continue;
        }

        return validate_plan(TradePlan::new(
            Side::Long,
            neck + height * config.target_multiple,
            bottom * (1.0 - config.stop_buffer_pct),
            "w_bottom",
        ));
    }
    None
}

/// 머리어깨 천장: 어깨-골-머리-골-어깨, 종가가 두 골을 잇는 넥라인을 하향 이탈.
pub fn detect_hs_top(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    let (rs_pos, right) = prev_pivot(pivots, pivots.len(), PivotKind::High)?;
    if right.index >= index {
        return None;
    }
    let (t2_pos, t2) = prev_pivot(pivots, rs_pos, PivotKind::Low)?;
    let (head_pos, head) = prev_pivot(pivots, t2_pos, PivotKind::High)?;
    let (t1_pos, t1) = prev_pivot(pivots, head_pos, PivotKind::Low)?;
    let (_, left) = prev_pivot(pivots, t1_pos, PivotKind::High)?;

    if head.price <= left.price || head.price <= right.price {
        return None;
    }
    if !approx_equal(left.price, right.price, config.equal_tol_pct) {
        return None;
    }

    let neckline = Trendline::through(t1, t2);
    let neck = neckline.at(index);
    if neck <= 0.0 || close >= neck * (1.0 - config.break_pct) {
        return None;
    }
    let neck_at_head = neckline.at(head.index);
    if neck_at_head <= 0.0 {
        return None;
    }
    let height = head.price - neck_at_head;
    if height <= 0.0 {
        return None;
    }

    validate_plan(TradePlan::new(
        Side::Short,
        neck - height * config.target_multiple,
        head.price.max(right.price) * (1.0 + config.stop_buffer_pct),
        "hs_top",
    ))
}

/// 역머리어깨 바닥: 어깨-봉우리-머리-봉우리-어깨, 종가가 넥라인을 상향 돌파.
pub fn detect_hs_bottom(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    let (rs_pos, right) = prev_pivot(pivots, pivots.len(), PivotKind::Low)?;
    if right.index >= index {
        return None;
    }
    let (p2_pos, p2) = prev_pivot(pivots, rs_pos, PivotKind::High)?;
    let (head_pos, head) = prev_pivot(pivots, p2_pos, PivotKind::Low)?;
    let (p1_pos, p1) = prev_pivot(pivots, head_pos, PivotKind::High)?;
    let (_, left) = prev_pivot(pivots, p1_pos, PivotKind::Low)?;

    if head.price >= left.price || head.price >= right.price {
        return None;
    }
    if !approx_equal(left.price, right.price, config.equal_tol_pct) {
        return None;
    }

    let neckline = Trendline::through(p1, p2);
    let neck = neckline.at(index);
    if neck <= 0.0 || close <= neck * (1.0 + config.break_pct) {
        return None;
    }
    let neck_at_head = neckline.at(head.index);
    if neck_at_head <= 0.0 {
        return None;
    }
    let height = neck_at_head - head.price;
    if height <= 0.0 {
        return None;
    }

    validate_plan(TradePlan::new(
        Side::Long,
        neck + height * config.target_multiple,
        head.price.min(right.price) * (1.0 - config.stop_buffer_pct),
        "hs_bottom",
    ))
}

/// 대칭 삼각수렴 돌파/이탈.
///
/// 자체 `triangle_lookback` 구간에서 피벗을 다시 수집하며, 꼭짓점까지 거리의
/// `[triangle_min_break_frac, triangle_max_break_frac]` 구간에서 일어난 돌파만
/// 인정합니다.
pub fn detect_triangle(index: usize, bars: &[Bar], config: &PatternConfig) -> Option<TradePlan> {
    if index == 0 {
        return None;
    }
    let start = index.saturating_sub(config.triangle_lookback);
    let pivots = collect_pivots(bars, start, index, config.pivot_n);
    let triangle = solve_triangle(&pivots, start, config.triangle_min_pivots)?;

    let frac = triangle.breakout_fraction(index);
    if frac < config.triangle_min_break_frac || frac > config.triangle_max_break_frac {
        return None;
    }

    let upper = triangle.upper.at(index);
    let lower = triangle.lower.at(index);
    if upper <= 0.0 || lower <= 0.0 || upper <= lower {
        return None;
    }
    let height = triangle.height();
    if height <= 0.0 {
        return None;
    }
    let close = close_at(bars, index)?;

    if config.enable_triangle_breakdown && close < lower * (1.0 - config.break_pct) {
        return validate_plan(TradePlan::new(
            Side::Short,
            lower - height * config.target_multiple,
            upper * (1.0 + config.stop_buffer_pct),
            "triangle_breakdown",
        ));
    }
    if config.enable_triangle_breakout && close > upper * (1.0 + config.break_pct) {
        return validate_plan(TradePlan::new(
            Side::Long,
            upper + height * config.target_multiple,
            lower * (1.0 - config.stop_buffer_pct),
            "triangle_breakout",
        ));
    }
    None
}

/// 상승 3파동: 저점 A < 고점 B, 저점 C > A, 종가가 B를 상향 돌파.
pub fn detect_wave_up(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    let (c_pos, c) = prev_pivot(pivots, pivots.len(), PivotKind::Low)?;
    if c.index >= index {
        return None;
    }
    let (b_pos, b) = prev_pivot(pivots, c_pos, PivotKind::High)?;
    let (_, a) = prev_pivot(pivots, b_pos, PivotKind::Low)?;

    if c.price <= a.price || close <= b.price * (1.0 + config.break_pct) {
        return None;
    }
    let amplitude = b.price - a.price;
    if amplitude <= 0.0 {
        return None;
    }

    validate_plan(TradePlan::new(
        Side::Long,
        c.price + amplitude * config.target_multiple,
        c.price * (1.0 - config.stop_buffer_pct),
        "wave_up",
    ))
}

/// 하락 3파동: 고점 A > 저점 B, 고점 C < A, 종가가 B를 하향 이탈.
pub fn detect_wave_down(
    index: usize,
    bars: &[Bar],
    pivots: &[PivotPoint],
    config: &PatternConfig,
) -> Option<TradePlan> {
    let close = close_at(bars, index)?;

    let (c_pos, c) = prev_pivot(pivots, pivots.len(), PivotKind::High)?;
    if c.index >= index {
        return None;
    }
    let (b_pos, b) = prev_pivot(pivots, c_pos, PivotKind::Low)?;
    let (_, a) = prev_pivot(pivots, b_pos, PivotKind::High)?;

    if c.price >= a.price || close >= b.price * (1.0 - config.break_pct) {
        return None;
    }
    let amplitude = a.price - b.price;
    if amplitude <= 0.0 {
        return None;
    }

    validate_plan(TradePlan::new(
        Side::Short,
        c.price - amplitude * config.target_multiple,
        c.price * (1.0 + config.stop_buffer_pct),
        "wave_down",
    ))
}

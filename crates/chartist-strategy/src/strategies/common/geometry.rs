//! 추세선 기하 유틸리티.
//!
//! 넥라인/추세선 투영, 근사 동일 비교, 삼각수렴 꼭짓점 계산을 제공합니다.

use super::pivots::{PivotKind, PivotPoint};

/// 꼭짓점이 구간 시작에서 최소한 떨어져야 하는 봉 수.
pub const MIN_APEX_DISTANCE: usize = 10;

/// 두 점 `(x1, y1)`, `(x2, y2)`를 지나는 직선의 `x` 위치 값.
///
/// 구간 밖은 외삽하며, `x1 == x2`이면 `y2`를 반환합니다.
pub fn line_at(x1: usize, y1: f64, x2: usize, y2: f64, x: usize) -> f64 {
    if x1 == x2 {
        return y2;
    }
    let t = (x as f64 - x1 as f64) / (x2 as f64 - x1 as f64);
    y1 + (y2 - y1) * t
}

/// `|a - b| / min(a, b) <= tol_pct`. 0 이하 값은 항상 false.
pub fn approx_equal(a: f64, b: f64, tol_pct: f64) -> bool {
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    (a - b).abs() / a.min(b) <= tol_pct
}

/// 두 피벗을 잇는 추세선.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trendline {
    /// 시작 피벗
    pub from: PivotPoint,
    /// 끝 피벗
    pub to: PivotPoint,
}

impl Trendline {
    /// 두 피벗으로 추세선을 만듭니다.
    pub fn through(from: PivotPoint, to: PivotPoint) -> Self {
        Self { from, to }
    }

    /// 봉당 기울기. 두 피벗의 인덱스가 같으면 None.
    pub fn slope(&self) -> Option<f64> {
        if self.from.index == self.to.index {
            return None;
        }
        Some((self.to.price - self.from.price) / (self.to.index as f64 - self.from.index as f64))
    }

    /// `index` 위치의 추세선 값.
    pub fn at(&self, index: usize) -> f64 {
        line_at(
            self.from.index,
            self.from.price,
            self.to.index,
            self.to.price,
            index,
        )
    }
}

/// 대칭 삼각수렴 (상단 하락, 하단 상승).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// 상단 추세선 (첫/마지막 피벗 고점)
    pub upper: Trendline,
    /// 하단 추세선 (첫/마지막 피벗 저점)
    pub lower: Trendline,
    /// 패턴 시작 인덱스
    pub start_index: usize,
    /// 두 추세선이 만나는 인덱스
    pub apex_index: usize,
}

impl Triangle {
    /// 시작점에서 꼭짓점까지 중 `index`가 진행한 비율.
    pub fn breakout_fraction(&self, index: usize) -> f64 {
        (index as f64 - self.start_index as f64)
            / (self.apex_index as f64 - self.start_index as f64)
    }

    /// 시작 인덱스에서의 패턴 높이 (상단 - 하단).
    pub fn height(&self) -> f64 {
        self.upper.at(self.start_index) - self.lower.at(self.start_index)
    }
}

/// 피벗 목록에서 대칭 삼각수렴을 계산합니다.
///
/// 고점/저점이 각각 `min_pivots`개 이상 필요합니다. 상단 기울기가 음수,
/// 하단 기울기가 양수가 아니면 거부하고, 꼭짓점이 NaN/무한대이거나 시작점에서
/// [`MIN_APEX_DISTANCE`] 봉 이내이면 거부합니다.
pub fn solve_triangle(
    pivots: &[PivotPoint],
    window_start: usize,
    min_pivots: usize,
) -> Option<Triangle> {
    let highs: Vec<PivotPoint> = pivots
        .iter()
        .copied()
        .filter(|p| p.kind == PivotKind::High)
        .collect();
    let lows: Vec<PivotPoint> = pivots
        .iter()
        .copied()
        .filter(|p| p.kind == PivotKind::Low)
        .collect();
    if highs.len() < min_pivots.max(2) || lows.len() < min_pivots.max(2) {
        return None;
    }

    let upper = Trendline::through(highs[0], highs[highs.len() - 1]);
    let lower = Trendline::through(lows[0], lows[lows.len() - 1]);
    let upper_slope = upper.slope()?;
    let lower_slope = lower.slope()?;
    if upper_slope >= 0.0 || lower_slope <= 0.0 {
        return None;
    }

    let den = upper_slope - lower_slope;
    if den == 0.0 {
        return None;
    }
    let t_apex = (lower.from.price - upper.from.price + upper_slope * upper.from.index as f64
        - lower_slope * lower.from.index as f64)
        / den;
    if !t_apex.is_finite() {
        return None;
    }

    let start_index = upper.from.index.min(lower.from.index).min(window_start);
    let apex = t_apex.round();
    if apex <= (start_index + MIN_APEX_DISTANCE) as f64 {
        return None;
    }

    Some(Triangle {
        upper,
        lower,
        start_index,
        apex_index: apex as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high(index: usize, price: f64) -> PivotPoint {
        PivotPoint { index, price, kind: PivotKind::High }
    }

    fn low(index: usize, price: f64) -> PivotPoint {
        PivotPoint { index, price, kind: PivotKind::Low }
    }

    #[test]
    fn test_line_at_interpolates_and_extrapolates() {
        assert_eq!(line_at(0, 10.0, 10, 20.0, 5), 15.0);
        assert_eq!(line_at(0, 10.0, 10, 20.0, 20), 30.0);
        assert_eq!(line_at(4, 10.0, 4, 20.0, 9), 20.0);
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(100.0, 101.0, 0.02));
        assert!(!approx_equal(100.0, 110.0, 0.02));
        assert!(!approx_equal(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_solve_symmetric_triangle() {
        // 상단: 20 → 16 (idx 0 → 40), 하단: 10 → 12 (idx 2 → 42)
        let pivots = vec![high(0, 20.0), low(2, 10.0), high(20, 18.0), low(22, 11.0), high(40, 16.0), low(42, 12.0)];
        let tri = solve_triangle(&pivots, 0, 3).unwrap();

        // 상단 기울기 -0.1, 하단 기울기 +0.05 → 꼭짓점 = (10 - 20 + 0 - 0.1) / -0.15 ≈ 67
        assert_eq!(tri.start_index, 0);
        assert_eq!(tri.apex_index, 67);
        assert!((tri.height() - 10.1).abs() < 1e-9);
        assert!((tri.breakout_fraction(47) - 47.0 / 67.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_converging_slopes() {
        let rising = vec![high(0, 16.0), low(2, 10.0), high(20, 18.0), low(22, 11.0), high(40, 20.0), low(42, 12.0)];
        assert!(solve_triangle(&rising, 0, 3).is_none());
    }

    #[test]
    fn test_rejects_insufficient_pivots() {
        let pivots = vec![high(0, 20.0), low(2, 10.0), high(40, 16.0), low(42, 12.0)];
        assert!(solve_triangle(&pivots, 0, 3).is_none());
    }

    #[test]
    fn test_rejects_apex_near_start() {
        // 가파르게 수렴하여 꼭짓점이 시작점 근처
        let pivots = vec![high(0, 20.0), low(1, 10.0), high(2, 16.0), low(3, 14.0), high(4, 15.5), low(5, 14.5)];
        assert!(solve_triangle(&pivots, 0, 3).is_none());
    }
}

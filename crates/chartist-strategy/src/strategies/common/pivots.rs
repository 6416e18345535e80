//! 피벗 탐지 및 가격 군집화.
//!
//! 모든 함수는 불변 봉 슬라이스와 인덱스 범위를 받아 매 호출마다 새 결과를
//! 반환하는 순수 함수입니다.

use chartist_core::Bar;
use serde::Serialize;

/// 피벗 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotKind {
    /// 저점
    Low,
    /// 고점
    High,
}

/// 국지적 고점/저점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotPoint {
    /// 봉 인덱스
    pub index: usize,
    /// 피벗 가격 (저점은 low, 고점은 high)
    pub price: f64,
    /// 종류
    pub kind: PivotKind,
}

/// 가격 군집.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// 군집 평균 가격
    pub level: f64,
    /// 군집에 속한 값 개수
    pub count: usize,
}

/// `index` 봉이 반폭 `n` 창에서 피벗 저점인지 확인합니다.
///
/// 이웃 2n개 중 저가가 엄격히 더 낮은 봉이 하나라도 있으면 피벗이 아닙니다.
/// 같은 값의 이웃은 허용합니다. 이웃이 부족하거나 가격이 0 이하이면 false.
pub fn is_pivot_low(bars: &[Bar], index: usize, n: usize) -> bool {
    is_pivot(bars, index, n, |b| b.low, |neighbor, x| neighbor < x)
}

/// `index` 봉이 반폭 `n` 창에서 피벗 고점인지 확인합니다.
pub fn is_pivot_high(bars: &[Bar], index: usize, n: usize) -> bool {
    is_pivot(bars, index, n, |b| b.high, |neighbor, x| neighbor > x)
}

fn is_pivot(
    bars: &[Bar],
    index: usize,
    n: usize,
    price: impl Fn(&Bar) -> f64,
    dominates: impl Fn(f64, f64) -> bool,
) -> bool {
    if n == 0 || index < n || index + n >= bars.len() {
        return false;
    }
    let x = price(&bars[index]);
    if x <= 0.0 {
        return false;
    }
    (index - n..=index + n)
        .filter(|&k| k != index)
        .all(|k| !dominates(price(&bars[k]), x))
}

/// `[start, end)` 구간의 피벗을 인덱스 오름차순으로 수집합니다.
///
/// 구간 양 끝의 `n`개 봉은 이웃이 부족하므로 건너뜁니다. 같은 봉이 고점과
/// 저점을 동시에 만족하면 저점이 먼저 기록됩니다.
pub fn collect_pivots(bars: &[Bar], start: usize, end: usize, n: usize) -> Vec<PivotPoint> {
    let end = end.min(bars.len());
    if n == 0 || end <= start || end - start <= 2 * n {
        return Vec::new();
    }

    let mut out = Vec::new();
    for j in start + n..end - n {
        if is_pivot_low(bars, j, n) {
            out.push(PivotPoint {
                index: j,
                price: bars[j].low,
                kind: PivotKind::Low,
            });
        }
        if is_pivot_high(bars, j, n) {
            out.push(PivotPoint {
                index: j,
                price: bars[j].high,
                kind: PivotKind::High,
            });
        }
    }
    out
}

/// 특정 종류 피벗의 가격 목록.
pub fn pivot_prices(pivots: &[PivotPoint], kind: PivotKind) -> Vec<f64> {
    pivots
        .iter()
        .filter(|p| p.kind == kind)
        .map(|p| p.price)
        .collect()
}

/// `pivots[..end]`에서 뒤로 탐색하여 해당 종류의 가장 최근 피벗을 찾습니다.
///
/// 찾은 피벗과 그 위치를 반환하며, 위치는 다음 탐색의 `end`로 사용합니다.
pub fn prev_pivot(
    pivots: &[PivotPoint],
    end: usize,
    kind: PivotKind,
) -> Option<(usize, PivotPoint)> {
    pivots[..end.min(pivots.len())]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, p)| p.kind == kind)
        .map(|(pos, p)| (pos, *p))
}

/// 정렬된 값에서 가장 긴 연속 구간을 찾아 평균과 개수를 반환합니다.
///
/// 구간의 모든 값은 `lower * (1 + tol_pct)` 이하여야 합니다. 길이가 같은
/// 구간이 여럿이면 먼저 발견된(가격이 낮은) 구간을 선택합니다.
pub fn cluster_level(values: &[f64], tol_pct: f64) -> Option<Cluster> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let (mut best_lo, mut best_hi) = (0, 0);
    let mut lo = 0;
    for hi in 0..sorted.len() {
        while lo < hi && sorted[hi] > sorted[lo] * (1.0 + tol_pct) {
            lo += 1;
        }
        if hi - lo > best_hi - best_lo {
            best_lo = lo;
            best_hi = hi;
        }
    }

    let run = &sorted[best_lo..=best_hi];
    Some(Cluster {
        level: run.iter().sum::<f64>() / run.len() as f64,
        count: run.len(),
    })
}

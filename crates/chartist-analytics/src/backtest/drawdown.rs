//! 최고점 대비 낙폭 추적.

use serde::{Deserialize, Serialize};

/// 러닝 피크와 최대 낙폭.
///
/// 피크는 초기 자산에서 시작하여 감소하지 않으며, 최대 낙폭은
/// `(peak - equity) / peak`의 누적 최댓값입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownTracker {
    peak: f64,
    max_drawdown: f64,
}

impl DrawdownTracker {
    /// 초기 자산으로 추적기를 생성합니다.
    pub fn new(initial_equity: f64) -> Self {
        Self {
            peak: initial_equity,
            max_drawdown: 0.0,
        }
    }

    /// 새 평가 자산을 반영하고 현재 낙폭(비율)을 반환합니다.
    pub fn update(&mut self, equity: f64) -> f64 {
        if equity > self.peak {
            self.peak = equity;
        }
        let drawdown = if self.peak > 0.0 {
            (self.peak - equity) / self.peak
        } else {
            0.0
        };
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        drawdown
    }

    /// 현재까지의 최고 자산.
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// 최대 낙폭 (비율).
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// 최대 낙폭 (%).
    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawdown_sequence() {
        let mut dd = DrawdownTracker::new(100.0);
        assert_eq!(dd.update(100.0), 0.0);
        assert_eq!(dd.update(120.0), 0.0);
        assert_eq!(dd.peak(), 120.0);
        assert!((dd.update(90.0) - 0.25).abs() < 1e-12);
        assert!((dd.update(110.0) - 1.0 / 12.0).abs() < 1e-12);
        assert!((dd.max_drawdown_pct() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_equity_below_initial_counts_from_initial_peak() {
        let mut dd = DrawdownTracker::new(1_000.0);
        dd.update(800.0);
        assert_eq!(dd.peak(), 1_000.0);
        assert!((dd.max_drawdown() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_peak() {
        let mut dd = DrawdownTracker::new(0.0);
        assert_eq!(dd.update(-5.0), 0.0);
        assert_eq!(dd.max_drawdown(), 0.0);
    }
}

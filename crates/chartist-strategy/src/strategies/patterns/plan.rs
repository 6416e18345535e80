//! 패턴 매매 계획과 검증 게이트.

use chartist_core::Side;
use serde::Serialize;

use crate::traits::TradeLevels;

/// 탐지된 패턴이 제안하는 거래 계획.
///
/// 롱은 `target > stop`, 숏은 `target < stop`이며 두 값 모두 양의 유한수입니다.
/// 이 조건은 [`validate_plan`]을 통과한 계획에만 보장됩니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePlan {
    /// 진입 방향
    pub side: Side,
    /// 목표가
    pub target: f64,
    /// 손절가
    pub stop: f64,
    /// 패턴 사유 (`m_top`, `hs_bottom` 등)
    pub reason: String,
}

impl TradePlan {
    /// 새 계획을 생성합니다. 검증은 [`validate_plan`]에서 수행합니다.
    pub fn new(side: Side, target: f64, stop: f64, reason: impl Into<String>) -> Self {
        Self {
            side,
            target,
            stop,
            reason: reason.into(),
        }
    }

    /// 손절/목표가.
    pub fn levels(&self) -> TradeLevels {
        TradeLevels {
            stop: self.stop,
            target: self.target,
        }
    }
}

/// 계획의 불변 조건을 검사합니다.
///
/// 유효하지 않으면 None을 반환하며, 사유가 비어 있으면 `pattern_<side>`로
/// 채웁니다. 이미 유효한 계획에 대해서는 아무것도 바꾸지 않습니다.
pub fn validate_plan(mut plan: TradePlan) -> Option<TradePlan> {
    if !plan.target.is_finite() || !plan.stop.is_finite() {
        return None;
    }
    if plan.target <= 0.0 || plan.stop <= 0.0 {
        return None;
    }
    match plan.side {
        Side::Long if plan.target <= plan.stop => return None,
        Side::Short if plan.target >= plan.stop => return None,
        Side::Flat => return None,
        _ => {}
    }
    if plan.reason.is_empty() {
        plan.reason = format!("pattern_{}", plan.side);
    }
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_levels() {
        assert!(validate_plan(TradePlan::new(Side::Long, 9.0, 10.0, "x")).is_none());
        assert!(validate_plan(TradePlan::new(Side::Short, 11.0, 10.0, "x")).is_none());
        assert!(validate_plan(TradePlan::new(Side::Long, 10.0, 10.0, "x")).is_none());
    }

    #[test]
    fn test_rejects_non_finite_and_non_positive() {
        assert!(validate_plan(TradePlan::new(Side::Long, f64::NAN, 1.0, "x")).is_none());
        assert!(validate_plan(TradePlan::new(Side::Short, 1.0, f64::INFINITY, "x")).is_none());
        assert!(validate_plan(TradePlan::new(Side::Short, -1.0, 2.0, "x")).is_none());
        assert!(validate_plan(TradePlan::new(Side::Flat, 2.0, 1.0, "x")).is_none());
    }

    #[test]
    fn test_fills_empty_reason() {
        let plan = validate_plan(TradePlan::new(Side::Short, 8.0, 12.0, "")).unwrap();
        assert_eq!(plan.reason, "pattern_short");
    }
}

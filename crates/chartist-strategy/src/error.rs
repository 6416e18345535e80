//! 전략 에러 타입.

use chartist_core::ChartistError;
use thiserror::Error;

/// 전략 생성/설정 에러.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// 알 수 없는 전략 유형
    #[error("알 수 없는 전략 유형: {0}")]
    UnknownType(String),

    /// 매개변수 파싱 실패
    #[error("전략 매개변수 파싱 실패: {0}")]
    Parse(String),

    /// 매개변수 범위 위반
    #[error("전략 매개변수 오류: {name}={value} (허용 범위 {expected})")]
    OutOfRange {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// 전략 작업을 위한 Result 타입.
pub type StrategyResult<T> = Result<T, StrategyError>;

impl From<serde_json::Error> for StrategyError {
    fn from(err: serde_json::Error) -> Self {
        StrategyError::Parse(err.to_string())
    }
}

impl From<StrategyError> for ChartistError {
    fn from(err: StrategyError) -> Self {
        ChartistError::Strategy(err.to_string())
    }
}

/// 값이 조건을 만족하지 않으면 [`StrategyError::OutOfRange`]를 반환합니다.
pub(crate) fn ensure_range(
    ok: bool,
    name: &'static str,
    value: impl std::fmt::Display,
    expected: &'static str,
) -> StrategyResult<()> {
    if ok {
        Ok(())
    } else {
        Err(StrategyError::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        })
    }
}

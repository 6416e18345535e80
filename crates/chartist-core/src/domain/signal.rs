//! 전략의 매매 신호.
//!
//! 신호는 체결이 아닌 "의도"이며, 생성 이후 변경되지 않습니다.
//! 엔진은 신호를 생성한 봉의 다음 봉 시가에 체결합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 신호 액션.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    /// 롱 진입
    Buy,
    /// 롱 청산
    Sell,
    /// 숏 진입
    Short,
    /// 숏 청산
    Cover,
}

impl SignalAction {
    /// 진입 신호 여부.
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalAction::Buy | SignalAction::Short)
    }
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "buy"),
            SignalAction::Sell => write!(f, "sell"),
            SignalAction::Short => write!(f, "short"),
            SignalAction::Cover => write!(f, "cover"),
        }
    }
}

/// 전략이 생성한 매매 신호.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// 신호를 생성한 봉의 시각
    pub time: DateTime<Utc>,
    /// 액션
    pub action: SignalAction,
    /// 사유 (거래 감사 추적용)
    pub reason: String,
}

impl Signal {
    /// 새 신호를 생성합니다.
    pub fn new(time: DateTime<Utc>, action: SignalAction, reason: impl Into<String>) -> Self {
        Self {
            time,
            action,
            reason: reason.into(),
        }
    }

    /// 롱 진입 신호
    pub fn buy(time: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(time, SignalAction::Buy, reason)
    }

    /// 롱 청산 신호
    pub fn sell(time: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(time, SignalAction::Sell, reason)
    }

    /// 숏 진입 신호
    pub fn short(time: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(time, SignalAction::Short, reason)
    }

    /// 숏 청산 신호
    pub fn cover(time: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(time, SignalAction::Cover, reason)
    }
}

//! 포지션 추적.
//!
//! 종목당 하나의 포지션만 열려 있을 수 있으며, 무포지션(flat) 상태에서는
//! 수량/수수료/증거금이 모두 0입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 무포지션
    #[default]
    Flat,
    /// 매수 포지션
    Long,
    /// 매도 포지션
    Short,
}

impl Side {
    /// 손익 계산용 방향 계수 (롱 1, 숏 -1, 무포지션 0).
    pub fn direction(&self) -> f64 {
        match self {
            Side::Flat => 0.0,
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Flat => write!(f, "flat"),
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// 종목의 현재 보유 상태.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// 포지션 방향
    pub side: Side,
    /// 보유 수량
    pub quantity: f64,
    /// 진입 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<DateTime<Utc>>,
    /// 진입 체결가 (슬리피지 포함)
    pub entry_price: f64,
    /// 진입 수수료
    pub entry_fee: f64,
    /// 예치 증거금 (선물 전용)
    pub margin: f64,
}

impl Position {
    /// 무포지션 상태를 생성합니다.
    pub fn flat() -> Self {
        Self::default()
    }

    /// 새 포지션을 엽니다.
    pub fn open(
        side: Side,
        quantity: f64,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        entry_fee: f64,
        margin: f64,
    ) -> Self {
        Self {
            side,
            quantity,
            entry_time: Some(entry_time),
            entry_price,
            entry_fee,
            margin,
        }
    }

    /// 무포지션 여부.
    pub fn is_flat(&self) -> bool {
        self.side == Side::Flat
    }

    /// 지정 가격 기준 선물 정산 손익.
    ///
    /// `(price - entry) * direction * qty * multiplier`
    pub fn settle_pnl(&self, price: f64, multiplier: f64) -> f64 {
        (price - self.entry_price) * self.side.direction() * self.quantity * multiplier
    }
}

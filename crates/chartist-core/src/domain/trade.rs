//! 거래 기록.
//!
//! 포지션이 무포지션으로 전환될 때만 `Trade`가 생성됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Position, Side};

/// 청산 완료된 왕복 거래.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// 종목 코드
    pub symbol: String,
    /// 방향
    pub side: Side,
    /// 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 진입가
    pub entry_price: f64,
    /// 청산 시각
    pub exit_time: DateTime<Utc>,
    /// 청산가
    pub exit_price: f64,
    /// 수량
    #[serde(rename = "qty")]
    pub quantity: f64,
    /// 진입 수수료
    pub entry_fee: f64,
    /// 청산 수수료
    pub exit_fee: f64,
    /// 총 손익 (수수료 제외 전)
    pub gross_pnl: f64,
    /// 순손익
    pub net_pnl: f64,
    /// 수익률 (%)
    pub return_pct: f64,
    /// 진입 사유
    pub reason_entry: String,
    /// 청산 사유
    pub reason_exit: String,
}

impl Trade {
    /// 열린 포지션을 청산하여 거래 기록을 만듭니다.
    ///
    /// `net_pnl == gross_pnl - entry_fee - exit_fee`가 항상 성립합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn close(
        symbol: impl Into<String>,
        position: &Position,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        exit_fee: f64,
        multiplier: f64,
        reason_entry: impl Into<String>,
        reason_exit: impl Into<String>,
    ) -> Self {
        let gross_pnl = position.settle_pnl(exit_price, multiplier);
        let net_pnl = gross_pnl - position.entry_fee - exit_fee;

        let mut return_pct = 0.0;
        if position.entry_price > 0.0 {
            return_pct = (exit_price - position.entry_price) / position.entry_price * 100.0;
            if position.side == Side::Short {
                return_pct = -return_pct;
            }
        }

        Self {
            symbol: symbol.into(),
            side: position.side,
            entry_time: position.entry_time.unwrap_or(exit_time),
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            quantity: position.quantity,
            entry_fee: position.entry_fee,
            exit_fee,
            gross_pnl,
            net_pnl,
            return_pct,
            reason_entry: reason_entry.into(),
            reason_exit: reason_exit.into(),
        }
    }

    /// 순손익이 양수인 거래인지 확인합니다.
    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }
}

/// 자산 곡선의 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 봉 시각
    pub time: DateTime<Utc>,
    /// 평가 자산
    pub equity: f64,
}

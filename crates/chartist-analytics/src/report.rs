//! 출력용 리포트 반올림.
//!
//! 시뮬레이션은 `f64`로 계산하고, 외부로 내보내는 금액과 비율만
//! `rust_decimal`로 소수 둘째 자리에서 반올림합니다 (0.5는 0에서 먼 쪽).

use chartist_core::{EquityPoint, InstrumentType, Side, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::backtest::BacktestReport;

/// 리포트 소수 자릿수.
pub const REPORT_DECIMALS: u32 = 2;

/// 소수 둘째 자리로 반올림한 Decimal. 표현할 수 없는 값은 0입니다.
pub fn to_decimal2(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(REPORT_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or_default()
}

/// 소수 둘째 자리로 반올림합니다. NaN/무한대는 그대로 반환합니다.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(REPORT_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// 반올림된 거래 기록.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundedTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    pub exit_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub exit_price: Decimal,
    pub qty: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub exit_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub return_pct: Decimal,
    pub reason_entry: String,
    pub reason_exit: String,
}

impl From<&Trade> for RoundedTrade {
    fn from(trade: &Trade) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            side: trade.side,
            entry_time: trade.entry_time,
            entry_price: to_decimal2(trade.entry_price),
            exit_time: trade.exit_time,
            exit_price: to_decimal2(trade.exit_price),
            qty: trade.quantity,
            entry_fee: to_decimal2(trade.entry_fee),
            exit_fee: to_decimal2(trade.exit_fee),
            gross_pnl: to_decimal2(trade.gross_pnl),
            net_pnl: to_decimal2(trade.net_pnl),
            return_pct: to_decimal2(trade.return_pct),
            reason_entry: trade.reason_entry.clone(),
            reason_exit: trade.reason_exit.clone(),
        }
    }
}

/// 반올림된 백테스트 결과 (JSON 출력용).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundedReport {
    pub symbol: String,
    pub instrument: InstrumentType,
    pub trades: Vec<RoundedTrade>,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_equity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_drawdown_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate_pct: Decimal,
    pub total_trades: usize,
    pub equity_curve: Vec<EquityPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<&BacktestReport> for RoundedReport {
    fn from(report: &BacktestReport) -> Self {
        Self {
            symbol: report.symbol.clone(),
            instrument: report.instrument_type,
            trades: report.trades.iter().map(RoundedTrade::from).collect(),
            final_equity: to_decimal2(report.final_equity),
            max_drawdown_pct: to_decimal2(report.max_drawdown_pct),
            win_rate_pct: to_decimal2(report.win_rate_pct),
            total_trades: report.total_trades,
            equity_curve: report
                .equity_curve
                .iter()
                .map(|p| EquityPoint {
                    time: p.time,
                    equity: round2(p.equity),
                })
                .collect(),
            errors: report.errors.clone(),
        }
    }
}

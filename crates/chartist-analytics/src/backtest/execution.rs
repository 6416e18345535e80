//! 체결 모델.
//!
//! 신호는 다음 봉 시가에 슬리피지를 반영하여 체결됩니다. 주식은 명목 금액
//! 전체를 현금으로 결제하고, 선물은 증거금을 예치한 뒤 청산 시 정산 손익과
//! 함께 돌려받습니다. 수수료는 진입과 청산 양쪽에서 명목 금액 기준으로
//! 부과됩니다.

use chartist_core::{Bar, Instrument, Position, Side, Signal, SignalAction, Trade};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::engine::BacktestConfig;

/// 베이시스 포인트 분모.
pub const BPS_DENOMINATOR: f64 = 10_000.0;

/// 종료 시점 강제 청산 사유.
pub const FORCE_CLOSE_REASON: &str = "force_close_end";

/// 슬리피지를 반영한 체결가.
///
/// 매수/숏 청산은 불리하게 높은 가격, 매도/숏 진입은 낮은 가격으로
/// 체결됩니다. 가격이나 bp가 0 이하이면 그대로 반환합니다.
pub fn apply_slippage(price: f64, slippage_bps: f64, action: SignalAction) -> f64 {
    if price <= 0.0 || slippage_bps <= 0.0 {
        return price;
    }
    let rate = slippage_bps / BPS_DENOMINATOR;
    match action {
        SignalAction::Buy | SignalAction::Cover => price * (1.0 + rate),
        SignalAction::Sell | SignalAction::Short => price * (1.0 - rate),
    }
}

/// 명목 금액 기준 수수료.
pub fn commission(notional: f64, commission_bps: f64) -> f64 {
    if notional <= 0.0 || commission_bps <= 0.0 {
        return 0.0;
    }
    notional * commission_bps / BPS_DENOMINATOR
}

/// 실제 적용되는 증거금률 (0 이하이거나 1 초과면 1).
pub fn effective_margin_rate(rate: f64) -> f64 {
    if rate <= 0.0 || rate > 1.0 {
        1.0
    } else {
        rate
    }
}

/// 진입 수량을 산정합니다.
///
/// - 주식: `floor(cash × pct / price / lot) × lot`
/// - 선물: `floor(cash × pct / (price × multiplier × margin_rate))`
pub fn size_quantity(
    instrument: &Instrument,
    cash: f64,
    price: f64,
    position_pct: f64,
    margin_rate: f64,
) -> f64 {
    if cash <= 0.0 || price <= 0.0 || position_pct <= 0.0 {
        return 0.0;
    }
    let budget = cash * position_pct;

    if instrument.is_futures() {
        let per_contract =
            price * instrument.effective_multiplier() * effective_margin_rate(margin_rate);
        (budget / per_contract).floor()
    } else {
        let lot = instrument.effective_lot_size() as f64;
        (budget / price / lot).floor() * lot
    }
}

/// 종목 하나의 현금, 포지션, 거래 기록.
#[derive(Debug, Clone)]
pub(crate) struct Account {
    instrument: Instrument,
    config: BacktestConfig,
    cash: f64,
    position: Position,
    entry_reason: String,
    trades: Vec<Trade>,
}

impl Account {
    pub(crate) fn new(instrument: &Instrument, config: &BacktestConfig) -> Self {
        Self {
            instrument: instrument.clone(),
            config: *config,
            cash: config.initial_cash,
            position: Position::flat(),
            entry_reason: String::new(),
            trades: Vec::new(),
        }
    }

    pub(crate) fn cash(&self) -> f64 {
        self.cash
    }

    pub(crate) fn position(&self) -> &Position {
        &self.position
    }

    pub(crate) fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    fn multiplier(&self) -> f64 {
        if self.instrument.is_futures() {
            self.instrument.effective_multiplier()
        } else {
            1.0
        }
    }

    /// 신호를 `bar` 시가에 체결합니다. 현재 포지션과 맞지 않는 신호는 무시됩니다.
    pub(crate) fn execute(&mut self, signal: &Signal, bar: &Bar) {
        let price = apply_slippage(bar.open, self.config.slippage_bps, signal.action);
        if price <= 0.0 {
            return;
        }

        match (signal.action, self.position.side) {
            (SignalAction::Buy, Side::Flat) => {
                self.open(Side::Long, price, bar.time, &signal.reason)
            }
            (SignalAction::Short, Side::Flat) if self.instrument.can_short() => {
                self.open(Side::Short, price, bar.time, &signal.reason)
            }
            (SignalAction::Sell, Side::Long) | (SignalAction::Cover, Side::Short) => {
                self.close(price, bar.time, &signal.reason)
            }
            (action, side) => {
                debug!(%action, %side, reason = %signal.reason, "포지션과 맞지 않는 신호 무시");
            }
        }
    }

    fn open(&mut self, side: Side, price: f64, time: DateTime<Utc>, reason: &str) {
        let quantity = size_quantity(
            &self.instrument,
            self.cash,
            price,
            self.config.position_pct,
            self.config.futures_margin_rate,
        );
        if quantity <= 0.0 {
            debug!(cash = self.cash, price, "진입 수량 0, 체결 생략");
            return;
        }

        let notional = price * quantity * self.multiplier();
        let fee = commission(notional, self.config.commission_bps);
        let margin = if self.instrument.is_futures() {
            let margin = notional * effective_margin_rate(self.config.futures_margin_rate);
            self.cash -= margin + fee;
            margin
        } else {
            self.cash -= notional + fee;
            0.0
        };

        self.position = Position::open(side, quantity, time, price, fee, margin);
        self.entry_reason = reason.to_string();
        debug!(%side, quantity, price, fee, reason, "진입 체결");
    }

    fn close(&mut self, price: f64, time: DateTime<Utc>, reason: &str) {
        let multiplier = self.multiplier();
        let notional = price * self.position.quantity * multiplier;
        let fee = commission(notional, self.config.commission_bps);

        if self.instrument.is_futures() {
            self.cash += self.position.margin + self.position.settle_pnl(price, multiplier) - fee;
        } else {
            self.cash += notional - fee;
        }

        let trade = Trade::close(
            self.instrument.symbol.as_str(),
            &self.position,
            time,
            price,
            fee,
            multiplier,
            std::mem::take(&mut self.entry_reason),
            reason,
        );
        debug!(
            side = %trade.side,
            price,
            net_pnl = trade.net_pnl,
            reason,
            "청산 체결"
        );
        self.trades.push(trade);
        self.position = Position::flat();
    }

    /// 남은 포지션을 마지막 종가로 청산합니다 (슬리피지 없음, 수수료 부과).
    pub(crate) fn force_close(&mut self, bar: &Bar) {
        if self.position.is_flat() || bar.close <= 0.0 {
            return;
        }
        self.close(bar.close, bar.time, FORCE_CLOSE_REASON);
    }

    /// 종가 기준 평가 자산.
    pub(crate) fn equity(&self, close: f64) -> f64 {
        let position = &self.position;
        if position.is_flat() || position.quantity <= 0.0 || close <= 0.0 {
            return self.cash;
        }
        if self.instrument.is_futures() {
            self.cash + position.margin + position.settle_pnl(close, self.multiplier())
        } else {
            self.cash + close * position.quantity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(day: u32, open: f64, close: f64) -> Bar {
        let t = Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap();
        Bar::new(t, open, open.max(close), open.min(close), close, 1_000)
    }

    fn frictionless() -> BacktestConfig {
        BacktestConfig::new(100_000.0)
            .with_slippage_bps(0.0)
            .with_commission_bps(0.0)
    }

    #[test]
    fn test_slippage_direction() {
        assert!((apply_slippage(100.0, 10.0, SignalAction::Buy) - 100.1).abs() < 1e-9);
        assert!((apply_slippage(100.0, 10.0, SignalAction::Cover) - 100.1).abs() < 1e-9);
        assert!((apply_slippage(100.0, 10.0, SignalAction::Sell) - 99.9).abs() < 1e-9);
        assert!((apply_slippage(100.0, 10.0, SignalAction::Short) - 99.9).abs() < 1e-9);
        assert_eq!(apply_slippage(100.0, 0.0, SignalAction::Buy), 100.0);
        assert_eq!(apply_slippage(-1.0, 10.0, SignalAction::Buy), -1.0);
    }

    #[test]
    fn test_commission() {
        assert!((commission(1_000_000.0, 1.0) - 100.0).abs() < 1e-9);
        assert_eq!(commission(1_000_000.0, 0.0), 0.0);
        assert_eq!(commission(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_size_quantity_stock_lots() {
        let stock = Instrument::stock("600519");
        assert_eq!(size_quantity(&stock, 100_000.0, 33.0, 1.0, 1.0), 3000.0);
        assert_eq!(size_quantity(&stock, 100_000.0, 33.0, 0.5, 1.0), 1500.0);
        assert_eq!(size_quantity(&stock, 1_000.0, 33.0, 1.0, 1.0), 0.0);
        assert_eq!(size_quantity(&stock, 0.0, 33.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_size_quantity_futures_contracts() {
        let fut = Instrument::futures("nf_AU0", 10.0);
        // 100000 / (450 * 10 * 0.1) = 222.2
        assert_eq!(size_quantity(&fut, 100_000.0, 450.0, 1.0, 0.1), 222.0);
        // 증거금률 범위 밖이면 1로 취급
        assert_eq!(size_quantity(&fut, 100_000.0, 450.0, 1.0, 1.5), 22.0);
        assert_eq!(size_quantity(&fut, 100_000.0, 450.0, 1.0, 0.0), 22.0);
    }

    #[test]
    fn test_stock_round_trip_cash() {
        let mut account = Account::new(&Instrument::stock("AAA"), &frictionless());
        let entry = bar_at(2, 10.0, 10.0);
        account.execute(&Signal::buy(bar_at(1, 10.0, 10.0).time, "in"), &entry);
        assert_eq!(account.position().quantity, 10_000.0);
        assert!(account.cash().abs() < 1e-6);
        assert!((account.equity(11.0) - 110_000.0).abs() < 1e-6);

        account.execute(&Signal::sell(entry.time, "out"), &bar_at(3, 12.0, 12.0));
        assert!(account.position().is_flat());
        assert!((account.cash() - 120_000.0).abs() < 1e-6);

        let trades = account.into_trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].reason_entry, "in");
        assert_eq!(trades[0].reason_exit, "out");
        assert!((trades[0].gross_pnl - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_stock_cannot_short() {
        let mut account = Account::new(&Instrument::stock("AAA"), &frictionless());
        account.execute(&Signal::short(bar_at(1, 10.0, 10.0).time, "x"), &bar_at(2, 10.0, 10.0));
        assert!(account.position().is_flat());
        assert_eq!(account.cash(), 100_000.0);
    }

    #[test]
    fn test_futures_short_margin_accounting() {
        let config = frictionless().with_futures_margin_rate(0.5);
        let mut account = Account::new(&Instrument::futures("nf_RB0", 10.0), &config);

        account.execute(&Signal::short(bar_at(1, 100.0, 100.0).time, "m_top"), &bar_at(2, 100.0, 100.0));
        let pos = account.position().clone();
        assert_eq!(pos.side, Side::Short);
        // 100000 / (100 * 10 * 0.5) = 200 계약, 명목 200000, 증거금 100000
        assert_eq!(pos.quantity, 200.0);
        assert!((pos.margin - 100_000.0).abs() < 1e-6);
        assert!(account.cash().abs() < 1e-6);
        // 가격 하락 시 숏 평가이익: 10 × 200 × 10
        assert!((account.equity(90.0) - 120_000.0).abs() < 1e-6);

        account.execute(&Signal::cover(bar_at(2, 100.0, 100.0).time, "m_top|target"), &bar_at(3, 90.0, 90.0));
        assert!(account.position().is_flat());
        assert!((account.cash() - 120_000.0).abs() < 1e-6);

        let trades = account.into_trades();
        assert!((trades[0].gross_pnl - 20_000.0).abs() < 1e-6);
        assert!((trades[0].return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fee_charged_on_both_legs() {
        let config = BacktestConfig::new(100_000.0)
            .with_slippage_bps(0.0)
            .with_commission_bps(10.0);
        let mut account = Account::new(&Instrument::stock("AAA"), &config);
        account.execute(&Signal::buy(bar_at(1, 10.0, 10.0).time, "in"), &bar_at(2, 10.0, 10.0));
        // 수수료는 수량 산정에 포함되지 않으므로 현금이 수수료만큼 음수가 됩니다
        assert_eq!(account.position().quantity, 10_000.0);
        assert!((account.cash() + 100.0).abs() < 1e-6);

        account.force_close(&bar_at(3, 10.0, 10.0));
        let trades = account.into_trades();
        assert_eq!(trades[0].reason_exit, FORCE_CLOSE_REASON);
        assert!((trades[0].entry_fee - 100.0).abs() < 1e-6);
        assert!((trades[0].exit_fee - 100.0).abs() < 1e-6);
        assert!((trades[0].net_pnl + 200.0).abs() < 1e-6);
    }
}

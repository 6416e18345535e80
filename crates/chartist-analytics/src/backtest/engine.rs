//! 백테스팅 엔진
//!
//! 종목별로 봉을 한 번 순회하며 전략 신호를 다음 봉 시가에 체결합니다.
//!
//! # 봉 처리 순서
//!
//! 1. 직전 봉에서 생성된 대기 신호를 현재 봉 시가에 체결
//! 2. 현재 봉 종가 기준으로 전략 신호 생성 (다음 봉이 있을 때만 대기열에 등록)
//! 3. 평가 자산 기록 및 낙폭 갱신
//!
//! 마지막 봉까지 남은 포지션은 종가로 강제 청산됩니다. 스캔 모드는 같은
//! 루프를 사용하되 마지막 봉의 상태만 보고합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use chartist_analytics::backtest::{BacktestConfig, BacktestEngine};
//! use chartist_strategy::create_strategy;
//!
//! let config = BacktestConfig::new(1_000_000.0)
//!     .with_commission_bps(1.0)
//!     .with_slippage_bps(5.0);
//! let engine = BacktestEngine::new(config, create_strategy("patterns", &params)?)?;
//!
//! let report = engine.run(&instrument, &bars);
//! println!("{}", report.summary());
//! ```

use chartist_core::{
    backtest_span, Bar, BacktestSection, ChartistError, EquityPoint, Instrument, RunConfig,
    Signal, MIN_BARS,
};
use chartist_data::{load_bars, BarProvider, DataError, DateWindow};
use chartist_strategy::{create_strategy, Strategy, StrategyError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::drawdown::DrawdownTracker;
use super::execution::Account;
use super::result::{win_rate_pct, BacktestReport, ScanReport};
use crate::report::round2;

/// 백테스트 오류
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 설정 오류
    #[error("백테스트 설정 오류: {0}")]
    ConfigError(String),

    /// 데이터 오류
    #[error("데이터 오류: {0}")]
    DataError(String),

    /// 전략 오류
    #[error("전략 생성 오류: {0}")]
    StrategyError(String),

    /// 종목 없음
    #[error("실행할 종목이 없습니다")]
    NoInstruments,
}

/// 백테스트 결과 타입
pub type BacktestResult<T> = Result<T, BacktestError>;

impl From<StrategyError> for BacktestError {
    fn from(err: StrategyError) -> Self {
        BacktestError::StrategyError(err.to_string())
    }
}

impl From<DataError> for BacktestError {
    fn from(err: DataError) -> Self {
        BacktestError::DataError(err.to_string())
    }
}

impl From<ChartistError> for BacktestError {
    fn from(err: ChartistError) -> Self {
        match err {
            ChartistError::Config(msg) => BacktestError::ConfigError(msg),
            ChartistError::Strategy(msg) => BacktestError::StrategyError(msg),
            other => BacktestError::DataError(other.to_string()),
        }
    }
}

/// 백테스트 설정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 초기 현금
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,

    /// 진입 시 사용할 현금 비율 (0, 1]
    #[serde(default = "default_position_pct")]
    pub position_pct: f64,

    /// 슬리피지 (bp)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: f64,

    /// 수수료 (bp)
    #[serde(default = "default_commission_bps")]
    pub commission_bps: f64,

    /// 선물 증거금률 (0, 1]
    #[serde(default = "default_futures_margin_rate")]
    pub futures_margin_rate: f64,
}

fn default_initial_cash() -> f64 {
    1_000_000.0
}
fn default_position_pct() -> f64 {
    1.0
}
fn default_slippage_bps() -> f64 {
    5.0
}
fn default_commission_bps() -> f64 {
    1.0
}
fn default_futures_margin_rate() -> f64 {
    1.0
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            position_pct: default_position_pct(),
            slippage_bps: default_slippage_bps(),
            commission_bps: default_commission_bps(),
            futures_margin_rate: default_futures_margin_rate(),
        }
    }
}

impl BacktestConfig {
    /// 초기 현금으로 설정을 생성합니다. 나머지는 기본값입니다.
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            ..Default::default()
        }
    }

    /// `[backtest]` 설정 섹션에서 생성합니다.
    pub fn from_section(section: &BacktestSection) -> Self {
        Self {
            initial_cash: section.initial_cash,
            position_pct: section.position_pct,
            slippage_bps: section.slippage_bps,
            commission_bps: section.commission_bps,
            futures_margin_rate: section.futures_margin_rate,
        }
    }

    /// 진입 비율을 설정합니다.
    pub fn with_position_pct(mut self, pct: f64) -> Self {
        self.position_pct = pct;
        self
    }

    /// 슬리피지(bp)를 설정합니다.
    pub fn with_slippage_bps(mut self, bps: f64) -> Self {
        self.slippage_bps = bps;
        self
    }

    /// 수수료(bp)를 설정합니다.
    pub fn with_commission_bps(mut self, bps: f64) -> Self {
        self.commission_bps = bps;
        self
    }

    /// 선물 증거금률을 설정합니다.
    pub fn with_futures_margin_rate(mut self, rate: f64) -> Self {
        self.futures_margin_rate = rate;
        self
    }

    /// 설정 유효성을 검사합니다.
    pub fn validate(&self) -> BacktestResult<()> {
        if !(self.initial_cash > 0.0) {
            return Err(BacktestError::ConfigError(format!(
                "초기 현금은 0보다 커야 합니다: {}",
                self.initial_cash
            )));
        }
        if !(self.position_pct > 0.0 && self.position_pct <= 1.0) {
            return Err(BacktestError::ConfigError(format!(
                "진입 비율은 (0, 1] 범위여야 합니다: {}",
                self.position_pct
            )));
        }
        if !(0.0..=500.0).contains(&self.slippage_bps) {
            return Err(BacktestError::ConfigError(format!(
                "슬리피지는 [0, 500] bp 범위여야 합니다: {}",
                self.slippage_bps
            )));
        }
        if !(0.0..=500.0).contains(&self.commission_bps) {
            return Err(BacktestError::ConfigError(format!(
                "수수료는 [0, 500] bp 범위여야 합니다: {}",
                self.commission_bps
            )));
        }
        if !(self.futures_margin_rate > 0.0 && self.futures_margin_rate <= 1.0) {
            return Err(BacktestError::ConfigError(format!(
                "선물 증거금률은 (0, 1] 범위여야 합니다: {}",
                self.futures_margin_rate
            )));
        }
        Ok(())
    }
}

/// 한 번의 순회가 남긴 상태.
struct Replay {
    account: Account,
    strategy: Box<dyn Strategy>,
    equity_curve: Vec<EquityPoint>,
    drawdown: DrawdownTracker,
    last_signal: Option<Signal>,
}

/// 백테스팅 엔진
///
/// 설정과 전략 원본을 보관하며, 실행마다 전략을 `clone_fresh`로 복제하므로
/// 같은 엔진을 여러 종목과 스레드에서 공유해도 실행 간 상태가 섞이지 않습니다.
pub struct BacktestEngine {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl BacktestEngine {
    /// 새로운 백테스트 엔진을 생성합니다.
    pub fn new(config: BacktestConfig, strategy: Box<dyn Strategy>) -> BacktestResult<Self> {
        config.validate()?;
        Ok(Self { config, strategy })
    }

    /// 실행 설정에서 엔진을 생성합니다.
    ///
    /// 전략 유형이나 매개변수가 잘못되면 시뮬레이션 전에 실패합니다.
    pub fn from_run_config(run: &RunConfig) -> BacktestResult<Self> {
        let strategy = create_strategy(&run.strategy.strategy_type, &run.strategy.params)?;
        Self::new(BacktestConfig::from_section(&run.backtest), strategy)
    }

    /// 설정.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// 전략 이름.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// 종목 하나의 백테스트를 실행합니다.
    ///
    /// 봉이 부족하거나 시간순이 아니면 에러가 담긴 결과를 반환합니다.
    pub fn run(&self, instrument: &Instrument, bars: &[Bar]) -> BacktestReport {
        let span = backtest_span!("backtest", instrument.symbol, self.strategy_name());
        let _guard = span.enter();

        if let Err(err) = check_bars(bars) {
            warn!(error = %err, "백테스트 건너뜀");
            return BacktestReport::failed(instrument, err);
        }

        let Replay {
            mut account,
            equity_curve,
            drawdown,
            ..
        } = self.replay(instrument, bars);

        let final_equity = equity_curve
            .last()
            .map_or(self.config.initial_cash, |p| p.equity);
        if let Some(last) = bars.last() {
            account.force_close(last);
        }
        let trades = account.into_trades();

        let report = BacktestReport {
            symbol: instrument.symbol.clone(),
            instrument_type: instrument.instrument_type,
            win_rate_pct: win_rate_pct(&trades),
            total_trades: trades.len(),
            trades,
            final_equity,
            max_drawdown_pct: drawdown.max_drawdown_pct(),
            equity_curve,
            errors: Vec::new(),
        };
        info!(
            trades = report.total_trades,
            final_equity = report.final_equity,
            max_drawdown_pct = report.max_drawdown_pct,
            win_rate_pct = report.win_rate_pct,
            "백테스트 완료"
        );
        report
    }

    /// 마지막 봉 기준 스캔 스냅샷을 생성합니다.
    pub fn scan(&self, instrument: &Instrument, bars: &[Bar]) -> ScanReport {
        let span = backtest_span!("scan", instrument.symbol, self.strategy_name());
        let _guard = span.enter();

        if let Err(err) = check_bars(bars) {
            warn!(error = %err, "스캔 건너뜀");
            return ScanReport::failed(instrument, err);
        }

        let Replay {
            account,
            strategy,
            last_signal,
            ..
        } = self.replay(instrument, bars);

        let last_index = bars.len() - 1;
        let last = &bars[last_index];
        let mut report = ScanReport::empty(instrument);
        report.last_date = Some(last.time.date_naive());
        report.last_close = round2(last.close);

        if let Some(levels) = strategy.key_levels(bars, last_index) {
            report.support = positive(levels.support).map(round2);
            report.resistance = positive(levels.resistance).map(round2);
        }

        let position = account.position();
        report.position_side = position.side;
        if !position.is_flat() {
            report.position_qty = position.quantity;
            report.entry_date = position.entry_time.map(|t| t.date_naive());
            report.entry_price = positive(position.entry_price).map(round2);
        }

        if let Some(signal) = last_signal.filter(|s| s.time == last.time) {
            if let Some(levels) = strategy.trade_levels(last.time) {
                report.suggested_stop = positive(levels.stop).map(round2);
                report.suggested_target = positive(levels.target).map(round2);
            }
            report.next_action = Some(signal.action);
            report.reason = Some(signal.reason);
        }

        info!(
            position = %report.position_side,
            next_action = ?report.next_action,
            "스캔 완료"
        );
        report
    }

    /// 여러 종목을 순서대로 로드하여 백테스트합니다.
    ///
    /// 로드 실패는 해당 종목 결과의 `errors`에 기록되고 나머지 종목은 계속
    /// 처리됩니다.
    pub async fn run_all(
        &self,
        provider: &dyn BarProvider,
        instruments: &[Instrument],
        window: &DateWindow,
    ) -> BacktestResult<Vec<BacktestReport>> {
        if instruments.is_empty() {
            return Err(BacktestError::NoInstruments);
        }

        let mut reports = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let report = match load_bars(provider, instrument, window).await {
                Ok(bars) => self.run(instrument, &bars),
                Err(err) => {
                    warn!(symbol = %instrument.symbol, error = %err, "봉 데이터 로드 실패");
                    BacktestReport::failed(instrument, err)
                }
            };
            reports.push(report);
        }

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(
            instruments = reports.len(),
            failed,
            strategy = self.strategy_name(),
            provider = provider.name(),
            "전체 백테스트 완료"
        );
        Ok(reports)
    }

    /// 여러 종목을 순서대로 로드하여 스캔합니다.
    pub async fn scan_all(
        &self,
        provider: &dyn BarProvider,
        instruments: &[Instrument],
        window: &DateWindow,
    ) -> BacktestResult<Vec<ScanReport>> {
        if instruments.is_empty() {
            return Err(BacktestError::NoInstruments);
        }

        let mut reports = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let report = match load_bars(provider, instrument, window).await {
                Ok(bars) => self.scan(instrument, &bars),
                Err(err) => {
                    warn!(symbol = %instrument.symbol, error = %err, "봉 데이터 로드 실패");
                    ScanReport::failed(instrument, err)
                }
            };
            reports.push(report);
        }

        let signals = reports.iter().filter(|r| r.has_signal()).count();
        info!(
            instruments = reports.len(),
            signals,
            strategy = self.strategy_name(),
            "전체 스캔 완료"
        );
        Ok(reports)
    }

    fn replay(&self, instrument: &Instrument, bars: &[Bar]) -> Replay {
        let mut strategy = self.strategy.clone_fresh();
        let mut account = Account::new(instrument, &self.config);
        let mut drawdown = DrawdownTracker::new(self.config.initial_cash);
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut pending: Option<Signal> = None;
        let mut last_signal: Option<Signal> = None;

        for (index, bar) in bars.iter().enumerate() {
            if let Some(signal) = pending.take() {
                let from_previous_bar = index
                    .checked_sub(1)
                    .and_then(|prev| bars.get(prev))
                    .is_some_and(|prev| prev.time == signal.time);
                if from_previous_bar {
                    account.execute(&signal, bar);
                } else {
                    debug!(index, signal_time = %signal.time, "지난 신호 폐기");
                }
            }

            if let Some(signal) = strategy.on_bar(index, bars, account.position()) {
                debug!(index, action = %signal.action, reason = %signal.reason, "신호 생성");
                if index + 1 < bars.len() {
                    pending = Some(signal.clone());
                }
                last_signal = Some(signal);
            }

            let equity = account.equity(bar.close);
            drawdown.update(equity);
            equity_curve.push(EquityPoint {
                time: bar.time,
                equity,
            });
        }

        Replay {
            account,
            strategy,
            equity_curve,
            drawdown,
            last_signal,
        }
    }
}

fn check_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.len() < MIN_BARS {
        return Err(DataError::NotEnoughBars(bars.len()));
    }
    if bars.windows(2).any(|w| w[0].time >= w[1].time) {
        return Err(DataError::InvalidData(
            "bars are not strictly ordered by time".to_string(),
        ));
    }
    Ok(())
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

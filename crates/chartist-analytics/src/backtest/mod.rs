//! 백테스팅 모듈
//!
//! # 주요 구성요소
//!
//! - [`BacktestConfig`]: 초기 현금, 진입 비율, 슬리피지/수수료, 선물 증거금률
//! - [`BacktestEngine`]: 종목별 봉 순회 엔진 (백테스트와 스캔)
//! - [`BacktestReport`]: 종목별 백테스트 결과
//! - [`ScanReport`]: 마지막 봉 기준 스캔 스냅샷
//! - [`DrawdownTracker`]: 러닝 피크와 최대 낙폭

pub mod drawdown;
pub mod engine;
pub mod execution;
pub mod result;
mod runner;

pub use drawdown::DrawdownTracker;
pub use engine::{BacktestConfig, BacktestEngine, BacktestError, BacktestResult};
pub use execution::{apply_slippage, commission, size_quantity, FORCE_CLOSE_REASON};
pub use result::{win_rate_pct, BacktestReport, ScanReport};

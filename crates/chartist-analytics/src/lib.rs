//! 시뮬레이션 엔진과 결과 리포트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 봉 단위 백테스트/스캔 엔진 (다음 봉 시가 체결, 종료 시 강제 청산)
//! - 주식(매매 단위)과 선물(계약 승수, 증거금) 회계
//! - 최대 낙폭 추적
//! - 종목 병렬 실행
//! - 소수 둘째 자리 반올림 리포트

pub mod backtest;
pub mod report;

pub use backtest::{
    BacktestConfig, BacktestEngine, BacktestError, BacktestReport, BacktestResult,
    DrawdownTracker, ScanReport,
};
pub use report::{round2, RoundedReport, RoundedTrade};

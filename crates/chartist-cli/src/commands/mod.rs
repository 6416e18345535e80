//! CLI 명령어 구현 모듈.

pub mod backtest;
pub mod output;
pub mod scan;
pub mod strategies;

//! chartist CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 설정 파일 기반 다종목 백테스트
//! - 마지막 봉 기준 신호 스캔
//! - 내장 전략 목록

pub mod commands;

pub use commands::*;

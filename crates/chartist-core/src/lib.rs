//! # Chartist Core
//!
//! 차트 패턴 백테스터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉(`Bar`) 및 종목(`Instrument`) 정의
//! - 포지션 및 매매 신호
//! - 청산 완료 거래 기록
//! - 실행 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;

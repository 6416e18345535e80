//! 차트 기반 매매 전략.
//!
//! 이 크레이트가 제공하는 기능:
//! - 봉 단위 신호 생성을 위한 `Strategy` trait
//! - 피벗/추세선 기하 유틸리티 (두 전략이 공유)
//! - 지지/저항 돌파-회복 상태 머신 전략
//! - 차트 패턴(M/W, 머리어깨, 삼각수렴, 3파동) 탐지 전략
//! - 설정 기반 전략 생성 레지스트리
//!
//! # 예제
//!
//! ```rust,ignore
//! use chartist_strategy::create_strategy;
//! use serde_json::json;
//!
//! let mut strategy = create_strategy("patterns", &json!({ "lookback": 120 }))?;
//! let signal = strategy.on_bar(index, &bars, &position);
//! ```

pub mod error;
pub mod registry;
pub mod strategies;
pub mod traits;

// 주요 타입 재내보내기
pub use error::{StrategyError, StrategyResult};
pub use registry::{available_strategies, create_strategy, StrategyMeta, StrategyType};
pub use strategies::{
    PatternConfig, PatternStrategy, SupportResistanceConfig, SupportResistanceStrategy,
    TradePlan,
};
pub use traits::{KeyLevels, Strategy, TradeLevels};

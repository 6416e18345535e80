//! 내장 전략 구현.
//!
//! - [`SupportResistanceStrategy`]: 지지선 이탈 후 회복(破底翻) 상태 머신
//! - [`PatternStrategy`]: 피벗 기반 차트 패턴 탐지

pub mod common;
pub mod patterns;
pub mod support_resistance;

pub use patterns::{validate_plan, PatternConfig, PatternStrategy, TradePlan};
pub use support_resistance::{EntryMode, LevelMode, SupportResistanceConfig, SupportResistanceStrategy};

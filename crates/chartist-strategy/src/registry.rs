//! 전략 레지스트리.
//!
//! 설정 파일의 `strategy.type` 문자열(ID 또는 별칭)로 전략을 찾고, JSON
//! 매개변수를 검증하여 인스턴스를 생성합니다.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::{StrategyError, StrategyResult};
use crate::strategies::{
    PatternConfig, PatternStrategy, SupportResistanceConfig, SupportResistanceStrategy,
};
use crate::traits::Strategy;

/// 내장 전략 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// 지지/저항 돌파-회복
    SupportResistance,
    /// 차트 패턴
    Patterns,
}

/// 전략 메타데이터.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyMeta {
    /// 전략 ID (snake_case)
    pub id: &'static str,
    /// 별칭
    pub aliases: &'static [&'static str],
    /// 전략 이름 (한글)
    pub name: &'static str,
    /// 전략 설명
    pub description: &'static str,
}

impl StrategyMeta {
    /// 전략 ID 또는 별칭으로 매칭
    pub fn matches(&self, query: &str) -> bool {
        self.id == query || self.aliases.contains(&query)
    }
}

static SUPPORT_RESISTANCE_META: StrategyMeta = StrategyMeta {
    id: "support_resistance",
    aliases: &["tsai_sen"],
    name: "지지/저항 돌파-회복",
    description: "박스 지지선 이탈 후 회복 시 롱 진입, 선택적으로 가짜 돌파 숏",
};

static PATTERNS_META: StrategyMeta = StrategyMeta {
    id: "patterns",
    aliases: &[],
    name: "차트 패턴",
    description: "머리어깨, 쌍봉/쌍바닥, 삼각수렴, 3파동 패턴 탐지",
};

impl StrategyType {
    /// 모든 내장 전략 유형.
    pub const ALL: [StrategyType; 2] = [StrategyType::SupportResistance, StrategyType::Patterns];

    /// 메타데이터.
    pub fn meta(&self) -> &'static StrategyMeta {
        match self {
            StrategyType::SupportResistance => &SUPPORT_RESISTANCE_META,
            StrategyType::Patterns => &PATTERNS_META,
        }
    }

    /// 매개변수로 전략 인스턴스를 생성합니다.
    ///
    /// `params`가 null이면 기본 설정을 사용합니다. 누락된 필드는 기본값,
    /// 알 수 없는 필드나 범위를 벗어난 값은 에러입니다.
    pub fn create(&self, params: &Value) -> StrategyResult<Box<dyn Strategy>> {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params.clone()
        };

        match self {
            StrategyType::SupportResistance => {
                let config: SupportResistanceConfig = serde_json::from_value(params)?;
                Ok(Box::new(SupportResistanceStrategy::new(config)?))
            }
            StrategyType::Patterns => {
                let config: PatternConfig = serde_json::from_value(params)?;
                Ok(Box::new(PatternStrategy::new(config)?))
            }
        }
    }
}

impl FromStr for StrategyType {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let query = s.trim().to_ascii_lowercase();
        StrategyType::ALL
            .into_iter()
            .find(|t| t.meta().matches(&query))
            .ok_or_else(|| StrategyError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta().id)
    }
}

/// 유형 문자열과 매개변수로 전략을 생성합니다.
pub fn create_strategy(strategy_type: &str, params: &Value) -> StrategyResult<Box<dyn Strategy>> {
    strategy_type.parse::<StrategyType>()?.create(params)
}

/// 사용 가능한 전략 메타데이터 목록.
pub fn available_strategies() -> Vec<&'static StrategyMeta> {
    StrategyType::ALL.iter().map(StrategyType::meta).collect()
}

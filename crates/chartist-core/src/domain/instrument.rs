//! 종목 정의.

use serde::{Deserialize, Serialize};

/// 주식 기본 매매 단위.
pub const DEFAULT_LOT_SIZE: i64 = 100;

/// 종목 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    /// 주식 (현금 전액 결제)
    Stock,
    /// 선물 (증거금 + 일일 정산)
    Futures,
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentType::Stock => write!(f, "stock"),
            InstrumentType::Futures => write!(f, "futures"),
        }
    }
}

/// 백테스트 대상 종목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목 코드
    pub symbol: String,
    /// 종목 유형
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    /// 주식 매매 단위 (0 이하이면 100)
    #[serde(default)]
    pub lot_size: i64,
    /// 선물 계약 승수 (0 이하이면 1)
    #[serde(default)]
    pub multiplier: f64,
    /// 공매도 허용 여부 (선물 전용)
    #[serde(default)]
    pub allow_short: bool,
}

impl Instrument {
    /// 주식 종목을 생성합니다.
    pub fn stock(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            instrument_type: InstrumentType::Stock,
            lot_size: DEFAULT_LOT_SIZE,
            multiplier: 0.0,
            allow_short: false,
        }
    }

    /// 선물 종목을 생성합니다. 공매도가 허용됩니다.
    pub fn futures(symbol: impl Into<String>, multiplier: f64) -> Self {
        Self {
            symbol: symbol.into(),
            instrument_type: InstrumentType::Futures,
            lot_size: 0,
            multiplier,
            allow_short: true,
        }
    }

    /// 매매 단위 설정
    pub fn with_lot_size(mut self, lot_size: i64) -> Self {
        self.lot_size = lot_size;
        self
    }

    /// 공매도 허용 설정
    pub fn with_allow_short(mut self, allow: bool) -> Self {
        self.allow_short = allow;
        self
    }

    /// 선물 여부.
    pub fn is_futures(&self) -> bool {
        self.instrument_type == InstrumentType::Futures
    }

    /// 실제 적용되는 매매 단위.
    pub fn effective_lot_size(&self) -> i64 {
        if self.lot_size <= 0 {
            DEFAULT_LOT_SIZE
        } else {
            self.lot_size
        }
    }

    /// 실제 적용되는 계약 승수.
    pub fn effective_multiplier(&self) -> f64 {
        if self.multiplier <= 0.0 {
            1.0
        } else {
            self.multiplier
        }
    }

    /// 신규 숏 진입 가능 여부.
    pub fn can_short(&self) -> bool {
        self.is_futures() && self.allow_short
    }
}

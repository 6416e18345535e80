//! 일봉(OHLCV) 데이터.
//!
//! 엔진은 시간순으로 정렬되고 중복이 제거된 `Bar` 시퀀스를 입력으로 받습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 백테스트를 실행하기 위한 최소 봉 개수.
pub const MIN_BARS: usize = 50;

/// 한 기간의 OHLCV 가격 기록.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 봉 시각
    pub time: DateTime<Utc>,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량 (음수 불가)
    pub volume: i64,
}

impl Bar {
    /// 새 봉을 생성합니다.
    pub fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 모든 가격이 양수이고 유한한지 확인합니다.
    pub fn has_positive_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }

    /// 고가와 저가의 차이.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

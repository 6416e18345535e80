//! 전략 trait 정의.
//!
//! 엔진은 봉이 마감될 때마다 `on_bar`를 호출하고, 반환된 신호를 다음 봉
//! 시가에 체결합니다. 전략 인스턴스는 돌파/회복 플래그나 대기 중인 계획 같은
//! 가변 상태를 가지므로 실행 간에 공유하지 않습니다. 실행마다
//! [`Strategy::clone_fresh`]로 독립 인스턴스를 만들어 사용합니다.

use chartist_core::{Bar, Position, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 지지/저항 수준.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    /// 지지선
    pub support: f64,
    /// 저항선
    pub resistance: f64,
}

impl KeyLevels {
    /// 유효한 박스인지 확인합니다 (0 < support < resistance).
    pub fn is_valid(&self) -> bool {
        self.support > 0.0 && self.resistance > 0.0 && self.resistance > self.support
    }

    /// 박스 높이.
    pub fn height(&self) -> f64 {
        self.resistance - self.support
    }
}

/// 진입 시 산출한 손절/목표가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    /// 손절가
    pub stop: f64,
    /// 목표가
    pub target: f64,
}

/// 봉 단위 매매 전략.
///
/// # 구현 예시
///
/// ```rust,ignore
/// struct MyStrategy { threshold: f64 }
///
/// impl Strategy for MyStrategy {
///     fn name(&self) -> &str { "my_strategy" }
///
///     fn on_bar(&mut self, index: usize, bars: &[Bar], position: &Position) -> Option<Signal> {
///         let bar = &bars[index];
///         (position.is_flat() && bar.close > self.threshold)
///             .then(|| Signal::buy(bar.time, "above_threshold"))
///     }
///
///     fn clone_fresh(&self) -> Box<dyn Strategy> {
///         Box::new(MyStrategy { threshold: self.threshold })
///     }
///
///     fn get_state(&self) -> Value { json!({}) }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// 전략 이름
    fn name(&self) -> &str;

    /// `index` 봉 마감 시점의 신호를 생성합니다.
    ///
    /// `bars[..=index]`만 참조해야 하며, 신호의 시각은 `bars[index].time`입니다.
    fn on_bar(&mut self, index: usize, bars: &[Bar], position: &Position) -> Option<Signal>;

    /// 동일 설정으로 초기 상태의 새 인스턴스를 생성합니다.
    fn clone_fresh(&self) -> Box<dyn Strategy>;

    /// `index` 봉 기준 지지/저항 수준 (차트 오버레이용).
    fn key_levels(&self, _bars: &[Bar], _index: usize) -> Option<KeyLevels> {
        None
    }

    /// 최근 계획의 손절/목표가.
    ///
    /// `last_time`은 마지막 봉의 시각이며, 해당 봉에서 만들어진 계획만
    /// 보고하는 전략도 있습니다.
    fn trade_levels(&self, _last_time: DateTime<Utc>) -> Option<TradeLevels> {
        None
    }

    /// 현재 내부 상태 (디버깅/로깅용).
    fn get_state(&self) -> Value;
}

//! 시계열 정리.

use chartist_core::{Bar, MIN_BARS};
use tracing::warn;

use crate::error::{DataError, Result};
use crate::window::DateWindow;

/// 원시 봉을 엔진 입력으로 정리합니다.
///
/// 1. 가격이 0 이하인 봉 제거
/// 2. 시간순 정렬, 같은 시각은 마지막 값 유지
/// 3. 날짜 창 적용
/// 4. [`MIN_BARS`] 미만이면 `not enough bars: N`
pub fn prepare_bars(symbol: &str, bars: Vec<Bar>, window: &DateWindow) -> Result<Vec<Bar>> {
    let total = bars.len();
    let mut bars: Vec<Bar> = bars.into_iter().filter(Bar::has_positive_prices).collect();
    let rejected = total - bars.len();
    if rejected > 0 {
        warn!(symbol, rejected, "가격이 0 이하인 봉 제외");
    }

    // 안정 정렬이므로 같은 시각의 봉은 입력 순서를 유지
    bars.sort_by_key(|b| b.time);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => deduped.push(bar),
        }
    }

    let bars = window.apply(deduped);
    if bars.len() < MIN_BARS {
        return Err(DataError::NotEnoughBars(bars.len()));
    }
    Ok(bars)
}

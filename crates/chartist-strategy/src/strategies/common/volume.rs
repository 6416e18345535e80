//! 거래량 지표.

use chartist_core::Bar;

/// `[index - n + 1, index]` 구간에서 양수 거래량의 단순 평균.
///
/// 양수 거래량이 없거나 `n == 0`이면 0을 반환합니다.
pub fn volume_ma(bars: &[Bar], index: usize, n: usize) -> f64 {
    if n == 0 || index >= bars.len() {
        return 0.0;
    }
    let start = (index + 1).saturating_sub(n);
    let (sum, count) = bars[start..=index]
        .iter()
        .filter(|b| b.volume > 0)
        .fold((0.0, 0usize), |(sum, count), b| (sum + b.volume as f64, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_with_volume(volumes: &[i64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| Bar::new(t0 + Duration::days(i as i64), 10.0, 11.0, 9.0, 10.0, v))
            .collect()
    }

    #[test]
    fn test_volume_ma_skips_zero_volume() {
        let bars = bars_with_volume(&[100, 0, 300, 200]);
        assert_eq!(volume_ma(&bars, 3, 3), 250.0);
        assert_eq!(volume_ma(&bars, 3, 10), 200.0);
    }

    #[test]
    fn test_volume_ma_empty_window() {
        let bars = bars_with_volume(&[0, 0]);
        assert_eq!(volume_ma(&bars, 1, 2), 0.0);
        assert_eq!(volume_ma(&bars, 1, 0), 0.0);
    }
}

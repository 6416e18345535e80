//! 로딩 구간 (최근 N봉 + 시작/종료일).

use chartist_core::{BacktestSection, Bar};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 로딩할 봉의 범위.
///
/// 먼저 최근 `days`개 봉으로 자른 뒤 `[start, end]` 날짜 범위로 거릅니다.
/// `days`가 0이면 개수 제한이 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    /// 최근 봉 수 제한
    pub days: usize,
    /// 시작일 (포함)
    pub start: Option<NaiveDate>,
    /// 종료일 (포함)
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// 최근 `days`개 봉 창.
    pub fn new(days: usize) -> Self {
        Self {
            days,
            ..Default::default()
        }
    }

    /// 시작일 설정
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// 종료일 설정
    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// 실행 설정의 `[backtest]` 섹션에서 창을 만듭니다.
    pub fn from_section(section: &BacktestSection) -> Self {
        Self {
            days: section.days,
            start: section.start,
            end: section.end,
        }
    }

    /// 시각이 날짜 범위 안인지 확인합니다.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        let date = time.date_naive();
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// 시간순 정렬된 봉에 창을 적용합니다.
    pub fn apply(&self, bars: Vec<Bar>) -> Vec<Bar> {
        let skip = if self.days > 0 {
            bars.len().saturating_sub(self.days)
        } else {
            0
        };
        bars.into_iter()
            .skip(skip)
            .filter(|b| self.contains(b.time))
            .collect()
    }
}

//! 일봉 Provider.
//!
//! 시장 데이터 수집(스크래핑, 외부 API)은 이 crate의 범위 밖이며, 수집된
//! 데이터는 파일로 저장되어 있다고 가정합니다.
//!
//! - [`CsvBarProvider`]: `<dir>/<symbol>.csv` (`date,open,high,low,close,volume`)
//! - [`JsonBarProvider`]: `<dir>/<symbol>.json` (레코드 배열)
//! - [`MemoryBarProvider`]: 미리 적재한 봉

pub mod csv_file;
pub mod json_file;
pub mod memory;

pub use csv_file::CsvBarProvider;
pub use json_file::JsonBarProvider;
pub use memory::MemoryBarProvider;

use async_trait::async_trait;
use chartist_core::{Bar, Instrument};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::prepare::prepare_bars;
use crate::window::DateWindow;

/// 종목별 일봉 공급자.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Provider 이름
    fn name(&self) -> &str;

    /// 종목의 원시 봉을 가져옵니다. 정렬/중복 제거는 호출자가 수행합니다.
    async fn fetch_bars(&self, instrument: &Instrument, window: &DateWindow) -> Result<Vec<Bar>>;
}

/// Provider에서 봉을 가져와 엔진 입력으로 정리합니다.
pub async fn load_bars(
    provider: &dyn BarProvider,
    instrument: &Instrument,
    window: &DateWindow,
) -> Result<Vec<Bar>> {
    let raw = provider.fetch_bars(instrument, window).await?;
    debug!(
        provider = provider.name(),
        symbol = %instrument.symbol,
        raw = raw.len(),
        "봉 로드"
    );
    prepare_bars(&instrument.symbol, raw, window)
}

/// 파일 저장 형식의 일봉 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    /// 날짜 (`YYYY-MM-DD`, RFC3339, `YYYY-MM-DD HH:MM:SS`)
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: i64,
}

impl BarRecord {
    /// 봉으로 변환합니다.
    pub fn to_bar(&self) -> Result<Bar> {
        let time = parse_bar_time(&self.date)?;
        if self.volume < 0 {
            return Err(DataError::InvalidData(format!(
                "negative volume at {}: {}",
                self.date, self.volume
            )));
        }
        Ok(Bar::new(time, self.open, self.high, self.low, self.close, self.volume))
    }
}

impl From<&Bar> for BarRecord {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.time.format("%Y-%m-%d").to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// 날짜 문자열을 UTC 시각으로 변환합니다. 날짜만 있으면 자정으로 봅니다.
pub(crate) fn parse_bar_time(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(DataError::ParseError(format!("unsupported date format: {value}")))
}

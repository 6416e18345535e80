//! CSV 파일 Provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chartist_core::{Bar, Instrument};

use super::{BarProvider, BarRecord};
use crate::error::{DataError, Result};
use crate::window::DateWindow;

/// `<dir>/<symbol>.csv`에서 일봉을 읽습니다.
///
/// 헤더는 `date,open,high,low,close,volume`입니다.
#[derive(Debug, Clone)]
pub struct CsvBarProvider {
    dir: PathBuf,
}

impl CsvBarProvider {
    /// 데이터 디렉터리로 Provider를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 종목의 파일 경로.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// CSV 본문을 봉으로 파싱합니다.
pub fn parse_csv(content: &str, source: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut bars = Vec::new();
    for (row, result) in reader.deserialize::<BarRecord>().enumerate() {
        let record = result.map_err(|err| {
            DataError::ParseError(format!("{} row {}: {}", source.display(), row + 1, err))
        })?;
        bars.push(record.to_bar()?);
    }
    Ok(bars)
}

#[async_trait]
impl BarProvider for CsvBarProvider {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_bars(&self, instrument: &Instrument, _window: &DateWindow) -> Result<Vec<Bar>> {
        let path = self.path_for(&instrument.symbol);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::NotFound(path.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        parse_csv(&content, &path)
    }
}

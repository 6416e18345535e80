//! JSON 파일 Provider.

use std::path::PathBuf;

use async_trait::async_trait;
use chartist_core::{Bar, Instrument};

use super::{BarProvider, BarRecord};
use crate::error::{DataError, Result};
use crate::window::DateWindow;

/// `<dir>/<symbol>.json`에서 일봉 레코드 배열을 읽습니다.
#[derive(Debug, Clone)]
pub struct JsonBarProvider {
    dir: PathBuf,
}

impl JsonBarProvider {
    /// 데이터 디렉터리로 Provider를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 종목의 파일 경로.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }
}

#[async_trait]
impl BarProvider for JsonBarProvider {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch_bars(&self, instrument: &Instrument, _window: &DateWindow) -> Result<Vec<Bar>> {
        let path = self.path_for(&instrument.symbol);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::NotFound(path.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let records: Vec<BarRecord> = serde_json::from_slice(&content)?;
        records.iter().map(BarRecord::to_bar).collect()
    }
}

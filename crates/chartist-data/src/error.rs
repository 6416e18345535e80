//! 데이터 모듈 오류 타입.

use chartist_core::ChartistError;
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 종목 데이터 없음
    #[error("Bars not found: {0}")]
    NotFound(String),

    /// 파일 읽기 오류
    #[error("I/O error: {0}")]
    Io(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 데이터
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 봉 수 부족
    #[error("not enough bars: {0}")]
    NotEnoughBars(usize),
}

/// 데이터 작업 Result 타입.
pub type Result<T> = std::result::Result<T, DataError>;

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

impl From<DataError> for ChartistError {
    fn from(err: DataError) -> Self {
        ChartistError::Data(err.to_string())
    }
}

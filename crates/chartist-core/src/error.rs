//! 백테스터 공통 에러 타입.
//!
//! 설정 에러는 시뮬레이션 시작 전에 즉시 실패하고, 데이터 에러는
//! 종목 단위로 결과 레코드에 기록된 뒤 나머지 종목 처리가 계속됩니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum ChartistError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 전략 에러
    #[error("전략 에러: {0}")]
    Strategy(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type ChartistResult<T> = Result<T, ChartistError>;

impl ChartistError {
    /// 실행 전에 즉시 실패해야 하는 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ChartistError::Config(_) | ChartistError::Strategy(_)
        )
    }
}

impl From<serde_json::Error> for ChartistError {
    fn from(err: serde_json::Error) -> Self {
        ChartistError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ChartistError {
    fn from(err: config::ConfigError) -> Self {
        ChartistError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ChartistError {
    fn from(err: std::io::Error) -> Self {
        ChartistError::Io(err.to_string())
    }
}

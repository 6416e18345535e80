//! 일봉 데이터 로딩.
//!
//! 이 crate는 다음을 제공합니다:
//! - 종목별 일봉을 공급하는 `BarProvider` trait
//! - 파일 기반 Provider (`<dir>/<symbol>.csv`, `<dir>/<symbol>.json`)
//! - 테스트/임베딩용 메모리 Provider
//! - 날짜 창(`DateWindow`) 적용 및 시계열 정리(`prepare_bars`)

pub mod error;
pub mod prepare;
pub mod provider;
pub mod window;

pub use error::{DataError, Result};
pub use prepare::prepare_bars;
pub use provider::{
    load_bars, BarProvider, BarRecord, CsvBarProvider, JsonBarProvider, MemoryBarProvider,
};
pub use window::DateWindow;

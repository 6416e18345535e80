//! 메모리 Provider.

use std::collections::HashMap;

use async_trait::async_trait;
use chartist_core::{Bar, Instrument};

use super::BarProvider;
use crate::error::{DataError, Result};
use crate::window::DateWindow;

/// 심볼별로 미리 적재한 봉을 공급합니다.
#[derive(Debug, Clone, Default)]
pub struct MemoryBarProvider {
    bars: HashMap<String, Vec<Bar>>,
}

impl MemoryBarProvider {
    /// 빈 Provider를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼의 봉을 등록합니다.
    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.into(), bars);
        self
    }

    /// 심볼의 봉을 등록합니다.
    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

#[async_trait]
impl BarProvider for MemoryBarProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_bars(&self, instrument: &Instrument, _window: &DateWindow) -> Result<Vec<Bar>> {
        self.bars
            .get(&instrument.symbol)
            .cloned()
            .ok_or_else(|| DataError::NotFound(instrument.symbol.clone()))
    }
}

//! 종목 병렬 실행.
//!
//! 종목마다 봉을 비동기로 로드한 뒤 시뮬레이션을 tokio 블로킹 태스크에서
//! 실행합니다. 각 실행은 전략을 새로 복제하므로 공유 가변 상태가 없고,
//! 결과는 입력 종목 순서대로 반환됩니다.

use std::sync::Arc;

use chartist_core::Instrument;
use chartist_data::{load_bars, BarProvider, DateWindow};
use futures::future::join_all;
use tracing::{info, warn};

use super::engine::{BacktestEngine, BacktestError, BacktestResult};
use super::result::BacktestReport;

impl BacktestEngine {
    /// 여러 종목을 병렬로 백테스트합니다.
    ///
    /// 실패한 종목은 에러가 담긴 결과로 대체되며 다른 종목에 영향을 주지
    /// 않습니다.
    pub async fn run_all_concurrent(
        self: Arc<Self>,
        provider: Arc<dyn BarProvider>,
        instruments: Vec<Instrument>,
        window: DateWindow,
    ) -> BacktestResult<Vec<BacktestReport>> {
        if instruments.is_empty() {
            return Err(BacktestError::NoInstruments);
        }
        let total = instruments.len();

        let tasks = instruments.into_iter().map(|instrument| {
            let engine = Arc::clone(&self);
            let provider = Arc::clone(&provider);
            async move {
                let bars = match load_bars(provider.as_ref(), &instrument, &window).await {
                    Ok(bars) => bars,
                    Err(err) => {
                        warn!(symbol = %instrument.symbol, error = %err, "봉 데이터 로드 실패");
                        return BacktestReport::failed(&instrument, err);
                    }
                };

                let task_instrument = instrument.clone();
                tokio::task::spawn_blocking(move || engine.run(&task_instrument, &bars))
                    .await
                    .unwrap_or_else(|err| {
                        warn!(symbol = %instrument.symbol, error = %err, "백테스트 태스크 실패");
                        BacktestReport::failed(&instrument, format!("task failed: {err}"))
                    })
            }
        });

        let reports = join_all(tasks).await;
        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(instruments = total, failed, "병렬 백테스트 완료");
        Ok(reports)
    }
}

//! 백테스트 명령어.
//!
//! 실행 설정 파일의 종목 전체를 백테스트하고 결과를 JSON 또는 텍스트
//! 요약으로 출력합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 결과 JSON을 stdout으로
//! chartist backtest -c config/backtest.toml
//!
//! # 파일 저장, 종목 병렬 실행
//! chartist backtest -c config/backtest.toml -o out/results.json --concurrent
//!
//! # 텍스트 요약
//! chartist backtest -c config/backtest.toml --format text
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chartist_analytics::{BacktestEngine, BacktestReport, RoundedReport};
use chartist_core::RunConfig;
use chartist_data::DateWindow;
use tracing::info;

use super::output::{write_output, DataSource, OutputFormat};

/// 백테스트 CLI 설정
#[derive(Debug, Clone)]
pub struct BacktestCliConfig {
    /// 실행 설정 파일 경로
    pub config_path: PathBuf,
    /// 봉 데이터 디렉터리
    pub data_dir: PathBuf,
    /// 봉 데이터 형식
    pub source: DataSource,
    /// 결과 저장 경로 (없으면 stdout)
    pub output_path: Option<PathBuf>,
    /// 출력 형식
    pub format: OutputFormat,
    /// 종목 병렬 실행
    pub concurrent: bool,
}

/// 백테스트를 실행하고 결과를 출력합니다.
pub async fn run_backtest(config: BacktestCliConfig) -> Result<Vec<BacktestReport>> {
    let run_config = RunConfig::load(&config.config_path)
        .with_context(|| format!("Failed to load config: {}", config.config_path.display()))?;
    let instruments = run_config.instruments();
    let window = DateWindow::from_section(&run_config.backtest);

    let engine = BacktestEngine::from_run_config(&run_config)?;
    info!(
        strategy = engine.strategy_name(),
        instruments = instruments.len(),
        data_dir = %config.data_dir.display(),
        "백테스트 시작"
    );

    let provider = config.source.provider(&config.data_dir);
    let reports = if config.concurrent {
        Arc::new(engine)
            .run_all_concurrent(provider, instruments, window)
            .await?
    } else {
        engine
            .run_all(provider.as_ref(), &instruments, &window)
            .await?
    };

    let content = match config.format {
        OutputFormat::Json => format_json(&reports)?,
        OutputFormat::Text => format_text(&reports),
    };
    write_output(&content, config.output_path.as_deref())?;

    Ok(reports)
}

/// 반올림된 결과 JSON.
pub fn format_json(reports: &[BacktestReport]) -> Result<String> {
    let rounded: Vec<RoundedReport> = reports.iter().map(RoundedReport::from).collect();
    serde_json::to_string_pretty(&rounded).context("Failed to serialize results")
}

/// 종목별 텍스트 요약.
pub fn format_text(reports: &[BacktestReport]) -> String {
    reports
        .iter()
        .map(BacktestReport::summary)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartist_core::Instrument;

    #[test]
    fn test_format_json_is_array_of_rounded_reports() {
        let mut ok = BacktestReport::empty(&Instrument::stock("AAA"));
        ok.final_equity = 1_000_123.456;
        let failed = BacktestReport::failed(&Instrument::futures("nf_AU0", 1000.0), "not enough bars: 3");

        let json: serde_json::Value =
            serde_json::from_str(&format_json(&[ok, failed]).unwrap()).unwrap();
        assert_eq!(json[0]["final_equity"], 1_000_123.46);
        assert!(json[0].get("errors").is_none());
        assert_eq!(json[1]["instrument"], "futures");
        assert_eq!(json[1]["errors"][0], "not enough bars: 3");
    }

    #[test]
    fn test_format_text_joins_summaries() {
        let reports = vec![
            BacktestReport::failed(&Instrument::stock("AAA"), "x"),
            BacktestReport::failed(&Instrument::stock("BBB"), "y"),
        ];
        let text = format_text(&reports);
        assert!(text.contains("AAA"));
        assert!(text.contains("BBB"));
        assert_eq!(text.matches("실패").count(), 2);
    }
}

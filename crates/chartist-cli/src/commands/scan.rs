//! 스캔 명령어.
//!
//! 종목별로 마지막 봉 기준 포지션과 다음 봉 시가에 체결될 신호를 보여줍니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 최근 120일 구간, 신호가 있는 종목만
//! chartist scan -c config/backtest.toml --days 120 --only-signal
//!
//! # JSON 출력
//! chartist scan -c config/backtest.toml --json -o out/scan.json
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chartist_analytics::{BacktestEngine, ScanReport};
use chartist_core::{RunConfig, Side};
use chartist_data::DateWindow;
use chrono::NaiveDate;
use tracing::info;

use super::output::{write_output, DataSource};

/// 스캔 CLI 설정
#[derive(Debug, Clone)]
pub struct ScanCliConfig {
    /// 실행 설정 파일 경로
    pub config_path: PathBuf,
    /// 봉 데이터 디렉터리
    pub data_dir: PathBuf,
    /// 봉 데이터 형식
    pub source: DataSource,
    /// 결과 저장 경로 (없으면 stdout)
    pub output_path: Option<PathBuf>,
    /// JSON 출력
    pub json: bool,
    /// 신호나 에러가 있는 종목만 출력
    pub only_signal: bool,
    /// 최근 N일 구간 (0이면 설정 파일 구간 사용)
    pub days: usize,
    /// 구간 종료일
    pub today: NaiveDate,
}

/// 스캔을 실행하고 결과를 출력합니다.
pub async fn run_scan(config: ScanCliConfig) -> Result<Vec<ScanReport>> {
    let mut run_config = RunConfig::load(&config.config_path)
        .with_context(|| format!("Failed to load config: {}", config.config_path.display()))?;
    run_config.apply_scan_days(config.days, config.today);
    run_config.validate()?;

    let instruments = run_config.instruments();
    let window = DateWindow::from_section(&run_config.backtest);
    let engine = BacktestEngine::from_run_config(&run_config)?;
    info!(
        strategy = engine.strategy_name(),
        instruments = instruments.len(),
        "스캔 시작"
    );

    let provider = config.source.provider(&config.data_dir);
    let mut reports = engine
        .scan_all(provider.as_ref(), &instruments, &window)
        .await?;
    if config.only_signal {
        reports = filter_signals(reports);
    }

    let content = if config.json {
        serde_json::to_string_pretty(&reports).context("Failed to serialize scan results")?
    } else {
        let header = (config.days > 0).then(|| window_line(&window, config.days));
        format_table(&reports, header.as_deref())
    };
    write_output(&content, config.output_path.as_deref())?;

    Ok(reports)
}

/// 신호가 있거나 에러가 난 종목만 남깁니다.
pub fn filter_signals(reports: Vec<ScanReport>) -> Vec<ScanReport> {
    reports
        .into_iter()
        .filter(|r| !r.is_ok() || r.has_signal())
        .collect()
}

/// 스캔 구간 안내 줄.
pub fn window_line(window: &DateWindow, days: usize) -> String {
    let fmt = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    format!(
        "[SCAN] window: {} ~ {} (last {} days, close-confirm -> next open exec)",
        fmt(window.start),
        fmt(window.end),
        days
    )
}

fn price_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// 텍스트 표.
pub fn format_table(reports: &[ScanReport], header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        let _ = writeln!(out, "{}", header);
    }
    let _ = writeln!(
        out,
        "{:<12} {:<12} {:<10} {:<8} {:<10} {:<10} {:<10} {}",
        "SYMBOL", "LAST_DATE", "LAST_CLOSE", "POS", "SIGNAL", "STOP", "TARGET", "REASON"
    );

    for r in reports {
        if let Some(error) = r.errors.first() {
            let _ = writeln!(
                out,
                "{:<12} {:<12} {:<10} {:<8} {:<10} {:<10} {:<10} {}",
                r.symbol, "-", "-", "-", "ERROR", "-", "-", error
            );
            continue;
        }

        let signal = r
            .next_action
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        let last_date = r
            .last_date
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let _ = writeln!(
            out,
            "{:<12} {:<12} {:<10.2} {:<8} {:<10} {:<10} {:<10} {}",
            r.symbol,
            last_date,
            r.last_close,
            r.position_side.to_string(),
            signal,
            price_or_dash(r.suggested_stop),
            price_or_dash(r.suggested_target),
            r.reason.as_deref().unwrap_or("")
        );
        if r.position_side != Side::Flat {
            let entry_date = r
                .entry_date
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            let _ = writeln!(
                out,
                "  entry: {} @ {:.2} qty={:.2}",
                entry_date,
                r.entry_price.unwrap_or_default(),
                r.position_qty
            );
        }
    }
    out.trim_end().to_string()
}

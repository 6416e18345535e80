//! 설정 파일과 CSV 데이터로 명령어 전체 흐름을 검증합니다.

use std::path::{Path, PathBuf};

use chartist_cli::commands::backtest::{run_backtest, BacktestCliConfig};
use chartist_cli::commands::output::{DataSource, OutputFormat};
use chartist_cli::commands::scan::{run_scan, ScanCliConfig};
use chrono::{Duration, NaiveDate};

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chartist-cli-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(dir.join("data")).unwrap();
    dir
}

fn write_csv(dir: &Path, symbol: &str, n: usize) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut content = String::from("date,open,high,low,close,volume\n");
    for i in 0..n {
        let date = start + Duration::days(i as i64);
        let close = 10.0 + (i % 7) as f64 * 0.1;
        content.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{}\n",
            date,
            close,
            close + 0.2,
            close - 0.2,
            close,
            1000 + i
        ));
    }
    std::fs::write(dir.join("data").join(format!("{symbol}.csv")), content).unwrap();
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("run.toml");
    std::fs::write(
        &path,
        r#"
[backtest]
initial_cash = 1000000
slippage_bps = 0

[backtest.instruments]
stocks = ["AAA", "MISSING"]

[strategy]
type = "support_resistance"
"#,
    )
    .unwrap();
    path
}

#[tokio::test]
async fn test_backtest_writes_json_report() {
    let dir = workspace("backtest");
    write_csv(&dir, "AAA", 80);
    let output = dir.join("out").join("results.json");

    let reports = run_backtest(BacktestCliConfig {
        config_path: write_config(&dir),
        data_dir: dir.join("data"),
        source: DataSource::Csv,
        output_path: Some(output.clone()),
        format: OutputFormat::Json,
        concurrent: true,
    })
    .await
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports[0].is_ok());
    assert_eq!(reports[0].equity_curve.len(), 80);
    assert!(!reports[1].is_ok());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json[0]["symbol"], "AAA");
    assert_eq!(json[0]["instrument"], "stock");
    assert_eq!(json[1]["symbol"], "MISSING");
    assert!(json[1]["errors"][0].is_string());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_scan_writes_table() {
    let dir = workspace("scan");
    write_csv(&dir, "AAA", 80);
    let output = dir.join("scan.txt");

    let reports = run_scan(ScanCliConfig {
        config_path: write_config(&dir),
        data_dir: dir.join("data"),
        source: DataSource::Csv,
        output_path: Some(output.clone()),
        json: false,
        only_signal: false,
        days: 0,
        today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    })
    .await
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].last_date, NaiveDate::from_ymd_opt(2024, 3, 20));

    let table = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = table.lines().collect();
    assert!(lines[0].starts_with("SYMBOL"));
    assert!(lines.iter().any(|l| l.starts_with("AAA") && l.contains("2024-03-20")));
    assert!(lines.iter().any(|l| l.starts_with("MISSING") && l.contains("ERROR")));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_missing_config_fails() {
    let dir = workspace("noconfig");
    let result = run_backtest(BacktestCliConfig {
        config_path: dir.join("absent.toml"),
        data_dir: dir.join("data"),
        source: DataSource::Csv,
        output_path: None,
        format: OutputFormat::Text,
        concurrent: false,
    })
    .await;
    assert!(result.is_err());
    std::fs::remove_dir_all(&dir).ok();
}

//! 차트 패턴 백테스터 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 설정 파일의 전 종목 백테스트 (JSON → stdout)
//! chartist backtest -c config/backtest.toml
//!
//! # 최근 120일 스캔, 신호 종목만
//! chartist scan -c config/backtest.toml --days 120 --only-signal
//!
//! # JSON 봉 데이터 사용
//! chartist --source json --data-dir data/json backtest -c config/backtest.toml
//!
//! # 전략 목록
//! chartist strategies
//! ```

use std::path::PathBuf;

use chartist_cli::commands::backtest::{run_backtest, BacktestCliConfig};
use chartist_cli::commands::output::{DataSource, OutputFormat};
use chartist_cli::commands::scan::{run_scan, ScanCliConfig};
use chartist_cli::commands::strategies::print_available_strategies;
use chartist_core::init_logging_from_env;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chartist")]
#[command(about = "차트 패턴 백테스터 - 지지/저항 및 차트 패턴 전략 시뮬레이션", long_about = None)]
#[command(version)]
struct Cli {
    /// 봉 데이터 디렉터리
    #[arg(long, global = true, env = "CHARTIST_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// 봉 데이터 형식 (csv, json)
    #[arg(long, global = true, default_value = "csv")]
    source: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 설정 파일의 전 종목 백테스트
    Backtest {
        /// 실행 설정 파일 (TOML, YAML, JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// 결과 저장 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 출력 형식 (json, text)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// 종목 병렬 실행
        #[arg(long, default_value = "false")]
        concurrent: bool,
    },

    /// 마지막 봉 기준 신호 스캔
    Scan {
        /// 실행 설정 파일 (TOML, YAML, JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// 결과 저장 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON 출력
        #[arg(long, default_value = "false")]
        json: bool,

        /// 신호나 에러가 있는 종목만 출력
        #[arg(long, default_value = "false")]
        only_signal: bool,

        /// 최근 N일 구간 (0이면 설정 파일 구간)
        #[arg(long, default_value = "0")]
        days: usize,
    },

    /// 사용 가능한 전략 목록
    Strategies,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging_from_env()?;

    let cli = Cli::parse();
    let source: DataSource = cli.source.parse()?;

    match cli.command {
        Commands::Backtest {
            config,
            output,
            format,
            concurrent,
        } => {
            let format: OutputFormat = format.parse()?;
            let cli_config = BacktestCliConfig {
                config_path: config,
                data_dir: cli.data_dir,
                source,
                output_path: output,
                format,
                concurrent,
            };

            match run_backtest(cli_config).await {
                Ok(reports) => {
                    let failed = reports.iter().filter(|r| !r.is_ok()).count();
                    info!(instruments = reports.len(), failed, "백테스트 종료");
                }
                Err(e) => {
                    error!("Backtest failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Scan {
            config,
            output,
            json,
            only_signal,
            days,
        } => {
            let cli_config = ScanCliConfig {
                config_path: config,
                data_dir: cli.data_dir,
                source,
                output_path: output,
                json,
                only_signal,
                days,
                today: Local::now().date_naive(),
            };

            match run_scan(cli_config).await {
                Ok(reports) => {
                    let signals = reports.iter().filter(|r| r.has_signal()).count();
                    info!(instruments = reports.len(), signals, "스캔 종료");
                }
                Err(e) => {
                    error!("Scan failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Strategies => print_available_strategies(),
    }

    Ok(())
}

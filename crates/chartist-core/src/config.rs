//! 실행 설정 관리.
//!
//! 설정 파일(TOML/YAML/JSON)은 `config` 크레이트로 로드하며, `CHARTIST__`
//! 접두사 환경 변수로 개별 값을 덮어쓸 수 있습니다
//! (예: `CHARTIST__BACKTEST__INITIAL_CASH=5000000`).
//!
//! 범위를 벗어난 값은 시뮬레이션이 시작되기 전에 [`ChartistError::Config`]로
//! 즉시 실패합니다.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Instrument, InstrumentType, DEFAULT_LOT_SIZE};
use crate::error::{ChartistError, ChartistResult};

/// 스캔 시 날짜 필터 이전에 확보할 여유 봉 수.
const SCAN_WARMUP_DAYS: usize = 200;

/// 전체 실행 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// 백테스트 설정
    #[serde(default)]
    pub backtest: BacktestSection,
    /// 전략 설정
    #[serde(default)]
    pub strategy: StrategySection,
}

/// `[backtest]` 섹션.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktestSection {
    /// 로드할 최근 봉 수
    #[serde(default = "default_days")]
    pub days: usize,
    /// 시작일 (포함)
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// 종료일 (포함)
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// 초기 현금
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// 진입 시 사용할 현금 비율 (0, 1]
    #[serde(default = "default_position_pct")]
    pub position_pct: f64,
    /// 슬리피지 (bp)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: f64,
    /// 수수료 (bp)
    #[serde(default = "default_commission_bps")]
    pub commission_bps: f64,
    /// 주식 매매 단위
    #[serde(default = "default_stock_lot_size")]
    pub stock_lot_size: i64,
    /// 선물 계약 승수
    #[serde(default = "default_futures_multiplier")]
    pub futures_multiplier: f64,
    /// 선물 증거금률 (0, 1]
    #[serde(default = "default_futures_margin_rate")]
    pub futures_margin_rate: f64,
    /// 대상 종목
    #[serde(default)]
    pub instruments: InstrumentLists,
}

/// 유형별 종목 코드 목록.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentLists {
    /// 주식 코드
    #[serde(default)]
    pub stocks: Vec<String>,
    /// 선물 코드
    #[serde(default)]
    pub futures: Vec<String>,
}

/// `[strategy]` 섹션.
///
/// 매개변수 검증은 전략 생성 시점에 수행됩니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategySection {
    /// 전략 유형 (`support_resistance`, `patterns`)
    #[serde(rename = "type", default = "default_strategy_type")]
    pub strategy_type: String,
    /// 전략 매개변수
    #[serde(default)]
    pub params: serde_json::Value,
}

// 설정 기본값 함수들 (serde default용)
fn default_days() -> usize {
    5000
}
fn default_initial_cash() -> f64 {
    1_000_000.0
}
fn default_position_pct() -> f64 {
    1.0
}
fn default_slippage_bps() -> f64 {
    5.0
}
fn default_commission_bps() -> f64 {
    1.0
}
fn default_stock_lot_size() -> i64 {
    DEFAULT_LOT_SIZE
}
fn default_futures_multiplier() -> f64 {
    1.0
}
fn default_futures_margin_rate() -> f64 {
    1.0
}
fn default_strategy_type() -> String {
    "support_resistance".to_string()
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            days: default_days(),
            start: None,
            end: None,
            initial_cash: default_initial_cash(),
            position_pct: default_position_pct(),
            slippage_bps: default_slippage_bps(),
            commission_bps: default_commission_bps(),
            stock_lot_size: default_stock_lot_size(),
            futures_multiplier: default_futures_multiplier(),
            futures_margin_rate: default_futures_margin_rate(),
            instruments: InstrumentLists::default(),
        }
    }
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            strategy_type: default_strategy_type(),
            params: serde_json::Value::Null,
        }
    }
}

impl RunConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일 형식은 확장자(`.toml`, `.yaml`, `.yml`, `.json`)로 판단합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> ChartistResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChartistError::Config(format!(
                "설정 파일을 찾을 수 없습니다: {}",
                path.display()
            )));
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("CHARTIST")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 로드합니다.
    pub fn from_toml_str(content: &str) -> ChartistResult<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `[backtest]` 섹션의 범위를 검증합니다.
    pub fn validate(&self) -> ChartistResult<()> {
        let b = &self.backtest;

        check(b.days > 0 && b.days <= 50_000, "backtest.days", "(0, 50000]", b.days)?;
        check(b.initial_cash > 0.0, "backtest.initial_cash", "> 0", b.initial_cash)?;
        check(
            b.position_pct > 0.0 && b.position_pct <= 1.0,
            "backtest.position_pct",
            "(0, 1]",
            b.position_pct,
        )?;
        check(
            (0.0..=500.0).contains(&b.slippage_bps),
            "backtest.slippage_bps",
            "[0, 500]",
            b.slippage_bps,
        )?;
        check(
            (0.0..=500.0).contains(&b.commission_bps),
            "backtest.commission_bps",
            "[0, 500]",
            b.commission_bps,
        )?;
        check(b.stock_lot_size > 0, "backtest.stock_lot_size", "> 0", b.stock_lot_size)?;
        check(
            b.futures_multiplier > 0.0 && b.futures_multiplier <= 100_000.0,
            "backtest.futures_multiplier",
            "(0, 100000]",
            b.futures_multiplier,
        )?;
        check(
            b.futures_margin_rate > 0.0 && b.futures_margin_rate <= 1.0,
            "backtest.futures_margin_rate",
            "(0, 1]",
            b.futures_margin_rate,
        )?;

        if let (Some(start), Some(end)) = (b.start, b.end) {
            if end < start {
                return Err(ChartistError::Config(format!(
                    "backtest.end({end})가 backtest.start({start})보다 앞섭니다"
                )));
            }
        }

        if self.instruments().is_empty() {
            return Err(ChartistError::Config(
                "backtest.instruments가 비어 있습니다".to_string(),
            ));
        }

        Ok(())
    }

    /// 설정된 종목 목록을 생성합니다.
    ///
    /// 선물 코드는 정규화되고, (유형, 코드) 기준으로 중복이 제거되며
    /// 유형 → 코드 순으로 정렬됩니다.
    pub fn instruments(&self) -> Vec<Instrument> {
        let b = &self.backtest;
        merge_instruments(&[], &b.instruments.stocks, &b.instruments.futures)
            .into_iter()
            .map(|mut inst| {
                match inst.instrument_type {
                    InstrumentType::Stock => inst.lot_size = b.stock_lot_size,
                    InstrumentType::Futures => inst.multiplier = b.futures_multiplier,
                }
                inst
            })
            .collect()
    }

    /// 최근 N일 스캔 구간을 적용합니다.
    ///
    /// 종료일은 `today`, 시작일은 `today - scan_days`이며, 휴장일을 감안해
    /// 로드할 봉 수를 최소 `scan_days + 200`으로 늘립니다.
    pub fn apply_scan_days(&mut self, scan_days: usize, today: NaiveDate) {
        if scan_days == 0 {
            return;
        }
        let start = today - Duration::days(scan_days as i64);
        self.backtest.start = Some(start);
        self.backtest.end = Some(today);
        self.backtest.days = self.backtest.days.max(scan_days + SCAN_WARMUP_DAYS);
    }
}

fn check(ok: bool, field: &str, expect: &str, value: impl std::fmt::Display) -> ChartistResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ChartistError::Config(format!(
            "{field}={value} 값이 허용 범위 {expect}를 벗어났습니다"
        )))
    }
}

/// 선물 코드를 `nf_<영문 대문자><숫자>` 형식으로 정규화합니다.
///
/// `pp2605` → `nf_PP2605`, `NF_au0` → `nf_AU0`. 형식에 맞지 않는 코드는
/// 앞뒤 공백만 제거하여 그대로 반환합니다.
pub fn normalize_futures_code(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }

    let prefixed = code
        .get(..3)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("nf_"));
    if prefixed {
        let rest = code[3..].trim();
        return match split_short_code(rest) {
            Some((letters, digits)) => format!("nf_{}{}", letters.to_ascii_uppercase(), digits),
            None => format!("nf_{rest}"),
        };
    }

    match split_short_code(code) {
        Some((letters, digits)) => format!("nf_{}{}", letters.to_ascii_uppercase(), digits),
        None => code.to_string(),
    }
}

fn split_short_code(code: &str) -> Option<(&str, &str)> {
    let split = code.find(|c: char| !c.is_ascii_alphabetic())?;
    if split == 0 {
        return None;
    }
    let (letters, digits) = code.split_at(split);
    if digits.chars().all(|c| c.is_ascii_digit()) {
        Some((letters, digits))
    } else {
        None
    }
}

/// 기존 종목 목록에 주식/선물 코드를 병합합니다.
///
/// 새로 추가되는 주식의 매매 단위와 선물의 승수는 기존 목록에서 처음 발견된
/// 양수 값을 따르고, 없으면 100 / 1을 사용합니다. 이미 있는 (유형, 코드)는
/// 덮어쓰지 않습니다.
pub fn merge_instruments(
    existing: &[Instrument],
    stocks: &[String],
    futures: &[String],
) -> Vec<Instrument> {
    let stock_lot = existing
        .iter()
        .find(|i| i.instrument_type == InstrumentType::Stock && i.lot_size > 0)
        .map_or(DEFAULT_LOT_SIZE, |i| i.lot_size);
    let futures_mult = existing
        .iter()
        .find(|i| i.instrument_type == InstrumentType::Futures && i.multiplier > 0.0)
        .map_or(1.0, |i| i.multiplier);

    let mut merged: BTreeMap<(InstrumentType, String), Instrument> = existing
        .iter()
        .map(|i| ((i.instrument_type, i.symbol.clone()), i.clone()))
        .collect();

    for symbol in stocks.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        merged
            .entry((InstrumentType::Stock, symbol.to_string()))
            .or_insert_with(|| Instrument::stock(symbol).with_lot_size(stock_lot));
    }
    for symbol in futures
        .iter()
        .map(|s| normalize_futures_code(s))
        .filter(|s| !s.is_empty())
    {
        merged
            .entry((InstrumentType::Futures, symbol.clone()))
            .or_insert_with(|| Instrument::futures(symbol, futures_mult));
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
days = 800
start = "2023-01-01"
end = "2024-06-30"
initial_cash = 2000000
slippage_bps = 3
futures_multiplier = 100
futures_margin_rate = 0.12

[backtest.instruments]
stocks = ["600519", "000001", "600519"]
futures = ["i2605", "nf_MA0"]

[strategy]
type = "patterns"

[strategy.params]
lookback = 120
"#;

    #[test]
    fn test_load_from_toml() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.backtest.days, 800);
        assert_eq!(config.backtest.initial_cash, 2_000_000.0);
        assert_eq!(config.backtest.position_pct, 1.0);
        assert_eq!(config.backtest.commission_bps, 1.0);
        assert_eq!(
            config.backtest.start,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(config.strategy.strategy_type, "patterns");
        assert_eq!(config.strategy.params["lookback"], 120);
    }

    #[test]
    fn test_instruments_are_merged_and_sorted() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();
        let instruments = config.instruments();

        let symbols: Vec<&str> = instruments.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["000001", "600519", "nf_I2605", "nf_MA0"]);
        assert_eq!(instruments[0].lot_size, 100);
        assert_eq!(instruments[2].multiplier, 100.0);
        assert!(instruments[2].allow_short);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = RunConfig::from_toml_str(SAMPLE).unwrap();
        config.backtest.position_pct = 1.5;
        assert!(config.validate().is_err());

        let mut config = RunConfig::from_toml_str(SAMPLE).unwrap();
        config.backtest.slippage_bps = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = RunConfig::from_toml_str(SAMPLE).unwrap();
        config.backtest.end = NaiveDate::from_ymd_opt(2022, 1, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_instruments_is_config_error() {
        let err = RunConfig::from_toml_str("[backtest]\ndays = 100\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_normalize_futures_code() {
        assert_eq!(normalize_futures_code("pp2605"), "nf_PP2605");
        assert_eq!(normalize_futures_code(" NF_au0 "), "nf_AU0");
        assert_eq!(normalize_futures_code("nf_"), "nf_");
        assert_eq!(normalize_futures_code("600519"), "600519");
        assert_eq!(normalize_futures_code(""), "");
    }

    #[test]
    fn test_merge_keeps_existing_entries() {
        let existing = vec![Instrument::futures("nf_I0", 100.0).with_allow_short(false)];
        let merged = merge_instruments(&existing, &[], &["I0".to_string(), "rb0".to_string()]);

        assert_eq!(merged.len(), 2);
        assert!(!merged[0].allow_short);
        assert_eq!(merged[1].symbol, "nf_RB0");
        assert_eq!(merged[1].multiplier, 100.0);
    }

    #[test]
    fn test_apply_scan_days() {
        let mut config = RunConfig::from_toml_str(SAMPLE).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        config.apply_scan_days(30, today);

        assert_eq!(config.backtest.end, Some(today));
        assert_eq!(config.backtest.start, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(config.backtest.days, 800);

        config.apply_scan_days(1000, today);
        assert_eq!(config.backtest.days, 1200);
    }
}

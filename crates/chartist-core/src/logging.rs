//! tracing 기반 로깅.
//!
//! 바이너리는 시작 시 [`init_logging`]을 한 번 호출합니다. 결과(JSON, 표)는
//! stdout으로 나가므로 로그는 항상 stderr에 씁니다.
//!
//! 환경 변수:
//! - `RUST_LOG`: 필터 지시어 (기본 `info`)
//! - `LOG_FORMAT`: `pretty` | `json` | `compact` (기본 `compact`)
//! - `CHARTIST_TRACE_STRATEGY`: 설정되면 전략 상태 전이를 debug로 출력

use std::str::FromStr;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{ChartistError, ChartistResult};

/// 전략 상태 전이 로그 대상.
const STRATEGY_TARGET: &str = "chartist_strategy";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 터미널용 여러 줄 형식
    Pretty,
    /// 로그 수집용 JSON
    Json,
    /// 종목이 많을 때 쓰는 한 줄 형식
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = ChartistError;

    fn from_str(s: &str) -> ChartistResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(ChartistError::InvalidInput(format!("알 수 없는 로그 형식: {s}"))),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 필터 지시어 (예: `info`, `chartist_analytics=debug`)
    pub filter: String,
    pub format: LogFormat,
    /// 전략 크레이트를 debug로 올림
    pub trace_strategy: bool,
    /// 백테스트/스캔 span의 시작과 종료 기록
    pub span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
            trace_strategy: false,
            span_events: false,
        }
    }
}

impl LogConfig {
    /// 필터 지시어로 설정을 생성합니다.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_trace_strategy(mut self, enabled: bool) -> Self {
        self.trace_strategy = enabled;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// 환경 변수에서 설정을 읽습니다. 형식 값이 잘못되면 기본 형식을 씁니다.
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let trace_strategy = std::env::var_os("CHARTIST_TRACE_STRATEGY").is_some();

        Self {
            filter,
            format,
            trace_strategy,
            ..Default::default()
        }
    }

    /// 최종 필터 지시어.
    pub fn directives(&self) -> String {
        if self.trace_strategy {
            format!("{},{}=debug", self.filter, STRATEGY_TARGET)
        } else {
            self.filter.clone()
        }
    }
}

/// 로깅을 초기화합니다. 두 번째 호출은 설정 에러입니다.
///
/// ```no_run
/// use chartist_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> ChartistResult<()> {
    let env_filter = EnvFilter::try_new(config.directives())
        .map_err(|e| ChartistError::Config(format!("로그 필터 오류: {e}")))?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
    };
    result.map_err(|e| ChartistError::Config(format!("로깅 초기화 실패: {e}")))?;

    tracing::debug!(format = ?config.format, filter = %config.directives(), "로깅 초기화 완료");
    Ok(())
}

/// `RUST_LOG`, `LOG_FORMAT`, `CHARTIST_TRACE_STRATEGY`로 로깅을 초기화합니다.
pub fn init_logging_from_env() -> ChartistResult<()> {
    init_logging(LogConfig::from_env())
}

/// 종목/전략 필드가 붙은 span.
///
/// ```rust,ignore
/// let _guard = chartist_core::backtest_span!("backtest", "600519", "patterns").entered();
/// ```
#[macro_export]
macro_rules! backtest_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $strategy:expr) => {
        tracing::info_span!($name, symbol = %$symbol, strategy = %$strategy)
    };
}

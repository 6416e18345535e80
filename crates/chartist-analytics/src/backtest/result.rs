//! 종목별 백테스트/스캔 결과 레코드.

use std::fmt::Display;

use chartist_core::{EquityPoint, Instrument, InstrumentType, Side, SignalAction, Trade};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 종목 하나의 백테스트 결과.
///
/// 데이터 부족이나 로드 실패는 `errors`에 기록되며, 이 경우 나머지 필드는
/// 비어 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 종목 코드
    pub symbol: String,
    /// 종목 유형
    #[serde(rename = "instrument")]
    pub instrument_type: InstrumentType,
    /// 청산 완료 거래 (강제 청산 포함)
    pub trades: Vec<Trade>,
    /// 최종 자산 (강제 청산 직전 마지막 평가 자산)
    pub final_equity: f64,
    /// 최대 낙폭 (%)
    pub max_drawdown_pct: f64,
    /// 승률 (%)
    pub win_rate_pct: f64,
    /// 총 거래 수
    pub total_trades: usize,
    /// 봉별 평가 자산
    pub equity_curve: Vec<EquityPoint>,
    /// 에러 메시지
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl BacktestReport {
    /// 빈 결과를 생성합니다.
    pub fn empty(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            instrument_type: instrument.instrument_type,
            trades: Vec::new(),
            final_equity: 0.0,
            max_drawdown_pct: 0.0,
            win_rate_pct: 0.0,
            total_trades: 0,
            equity_curve: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// 에러 하나를 담은 결과를 생성합니다.
    pub fn failed(instrument: &Instrument, error: impl Display) -> Self {
        let mut report = Self::empty(instrument);
        report.errors.push(error.to_string());
        report
    }

    /// 에러 없이 완료되었는지 확인합니다.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// 전체 거래 순손익 합계.
    pub fn net_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.net_pnl).sum()
    }

    /// 텍스트 요약.
    pub fn summary(&self) -> String {
        if !self.is_ok() {
            return format!(
                "{} ({}) 실패: {}",
                self.symbol,
                self.instrument_type,
                self.errors.join("; ")
            );
        }

        let period = match (self.equity_curve.first(), self.equity_curve.last()) {
            (Some(first), Some(last)) => format!(
                "{} → {}",
                first.time.format("%Y-%m-%d"),
                last.time.format("%Y-%m-%d")
            ),
            _ => "-".to_string(),
        };

        format!(
            "{} ({}) 백테스트 결과\n\
             ═══════════════════════════════════════\n\
             기간: {} ({} 봉)\n\
             ───────────────────────────────────────\n\
             최종 자산: {:.2}\n\
             순손익 합계: {:.2}\n\
             ───────────────────────────────────────\n\
             총 거래: {}\n\
             승률: {:.2}%\n\
             최대 낙폭: {:.2}%\n\
             ═══════════════════════════════════════",
            self.symbol,
            self.instrument_type,
            period,
            self.equity_curve.len(),
            self.final_equity,
            self.net_pnl(),
            self.total_trades,
            self.win_rate_pct,
            self.max_drawdown_pct,
        )
    }
}

/// 순손익이 양수인 거래 비율 (%). 거래가 없으면 0.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// 마지막 봉 기준 스캔 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// 종목 코드
    pub symbol: String,
    /// 종목 유형
    #[serde(rename = "instrument")]
    pub instrument_type: InstrumentType,
    /// 마지막 봉 날짜
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    /// 마지막 종가
    pub last_close: f64,
    /// 지지선
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<f64>,
    /// 저항선
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f64>,
    /// 현재 포지션 방향
    pub position_side: Side,
    /// 현재 보유 수량
    pub position_qty: f64,
    /// 진입일
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<NaiveDate>,
    /// 진입가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    /// 마지막 봉에서 생성된 신호 (다음 봉 시가에 체결 예정)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<SignalAction>,
    /// 신호 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 제안 손절가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_stop: Option<f64>,
    /// 제안 목표가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_target: Option<f64>,
    /// 에러 메시지
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ScanReport {
    /// 빈 스냅샷을 생성합니다.
    pub fn empty(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            instrument_type: instrument.instrument_type,
            last_date: None,
            last_close: 0.0,
            support: None,
            resistance: None,
            position_side: Side::Flat,
            position_qty: 0.0,
            entry_date: None,
            entry_price: None,
            next_action: None,
            reason: None,
            suggested_stop: None,
            suggested_target: None,
            errors: Vec::new(),
        }
    }

    /// 에러 하나를 담은 스냅샷을 생성합니다.
    pub fn failed(instrument: &Instrument, error: impl Display) -> Self {
        let mut report = Self::empty(instrument);
        report.errors.push(error.to_string());
        report
    }

    /// 에러 없이 완료되었는지 확인합니다.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// 다음 봉에 체결될 신호가 있는지 확인합니다.
    pub fn has_signal(&self) -> bool {
        self.next_action.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartist_core::Position;
    use chrono::{TimeZone, Utc};

    fn trade(net: f64) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let pos = Position::open(Side::Long, 1.0, t, 100.0, 0.0, 0.0);
        Trade::close("AAA", &pos, t, 100.0 + net, 0.0, 1.0, "in", "out")
    }

    #[test]
    fn test_win_rate() {
        assert_eq!(win_rate_pct(&[]), 0.0);
        let trades = vec![trade(5.0), trade(-3.0), trade(0.0), trade(1.0)];
        assert!((win_rate_pct(&trades) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_report_serialization() {
        let report = BacktestReport::failed(&Instrument::stock("AAA"), "not enough bars: 20");
        assert!(!report.is_ok());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["instrument"], "stock");
        assert_eq!(json["errors"][0], "not enough bars: 20");
        assert!(report.summary().contains("not enough bars: 20"));
    }

    #[test]
    fn test_errors_omitted_when_empty() {
        let report = BacktestReport::empty(&Instrument::futures("nf_AU0", 1000.0));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["instrument"], "futures");
    }

    #[test]
    fn test_scan_optional_fields_omitted() {
        let report = ScanReport::empty(&Instrument::stock("AAA"));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("next_action").is_none());
        assert!(json.get("support").is_none());
        assert_eq!(json["position_side"], "flat");
        assert!(!report.has_signal());
    }
}

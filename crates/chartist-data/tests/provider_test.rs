//! 파일 Provider 통합 테스트.

use std::path::PathBuf;

use chartist_core::Instrument;
use chartist_data::{load_bars, BarProvider, CsvBarProvider, DataError, DateWindow, JsonBarProvider};
use chrono::NaiveDate;

/// 테스트별 임시 디렉터리
fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chartist-data-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn csv_rows(count: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut out = String::from("date,open,high,low,close,volume\n");
    // 역순으로 기록하여 정렬 확인
    for i in (0..count).rev() {
        let date = start + chrono::Duration::days(i as i64);
        let px = 10.0 + (i % 7) as f64;
        out.push_str(&format!("{},{},{},{},{},{}\n", date, px, px + 1.0, px - 1.0, px, 100 + i));
    }
    out
}

#[tokio::test]
async fn test_csv_provider_loads_sorted_window() {
    let dir = fixture_dir("csv");
    std::fs::write(dir.join("600000.csv"), csv_rows(120)).unwrap();

    let provider = CsvBarProvider::new(&dir);
    let instrument = Instrument::stock("600000");
    let window = DateWindow::new(80);

    let bars = load_bars(&provider, &instrument, &window).await.unwrap();
    assert_eq!(bars.len(), 80);
    assert!(bars.windows(2).all(|w| w[0].time < w[1].time));
    assert_eq!(
        bars.last().unwrap().time.date_naive(),
        NaiveDate::from_ymd_opt(2023, 4, 30).unwrap()
    );
}

#[tokio::test]
async fn test_csv_provider_missing_file() {
    let provider = CsvBarProvider::new(fixture_dir("missing"));
    let err = provider
        .fetch_bars(&Instrument::stock("NOPE"), &DateWindow::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
}

#[tokio::test]
async fn test_json_provider_short_series() {
    let dir = fixture_dir("json");
    let records: Vec<serde_json::Value> = (1..=20)
        .map(|d| {
            serde_json::json!({
                "date": format!("2024-02-{d:02}"),
                "open": 5.0, "close": 5.5, "high": 6.0, "low": 4.5, "volume": 10
            })
        })
        .collect();
    std::fs::write(dir.join("nf_PP2605.json"), serde_json::to_vec(&records).unwrap()).unwrap();

    let provider = JsonBarProvider::new(&dir);
    let instrument = Instrument::futures("nf_PP2605", 5.0);

    let raw = provider.fetch_bars(&instrument, &DateWindow::default()).await.unwrap();
    assert_eq!(raw.len(), 20);

    let err = load_bars(&provider, &instrument, &DateWindow::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "not enough bars: 20");
}

//! 명령어 공통: 데이터 소스 선택과 결과 출력.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chartist_data::{BarProvider, CsvBarProvider, JsonBarProvider};
use tracing::info;

/// 봉 데이터 파일 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    /// `<dir>/<symbol>.csv`
    #[default]
    Csv,
    /// `<dir>/<symbol>.json`
    Json,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("Invalid data source: {}. Use: csv, json", s)),
        }
    }
}

impl DataSource {
    /// 데이터 디렉터리에 대한 Provider를 생성합니다.
    pub fn provider(&self, dir: impl Into<PathBuf>) -> Arc<dyn BarProvider> {
        match self {
            DataSource::Csv => Arc::new(CsvBarProvider::new(dir)),
            DataSource::Json => Arc::new(JsonBarProvider::new(dir)),
        }
    }
}

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(anyhow!("Invalid format: {}. Use: json, text", s)),
        }
    }
}

/// 파일 또는 stdout에 출력합니다. 파일의 상위 디렉터리는 필요하면 생성합니다.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        println!("{}", content);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    info!("Output written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_and_format() {
        assert_eq!("CSV".parse::<DataSource>().unwrap(), DataSource::Csv);
        assert_eq!(" json ".parse::<DataSource>().unwrap(), DataSource::Json);
        assert!("parquet".parse::<DataSource>().is_err());

        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(DataSource::Csv.provider("data").name(), "csv");
        assert_eq!(DataSource::Json.provider("data").name(), "json");
    }

    #[test]
    fn test_write_output_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("chartist-cli-out-{}", std::process::id()));
        let path = dir.join("nested").join("out.json");
        write_output("[]", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        std::fs::remove_dir_all(&dir).ok();
    }
}

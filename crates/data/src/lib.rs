pub mod csv_loader;
pub mod fundamentals;

pub use fundamentals::JsonFundamentalsSource;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use techscan_core::{BarSource, DataError, Lookback, PriceHistory};

/// A bar source backed by a directory of `<TICKER>.csv` files.
pub struct CsvBarSource {
    pub directory: PathBuf,
}

impl CsvBarSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// Find `<ticker>.<extension>` in `directory`, accepting upper-, lower- or
/// as-given case.
pub(crate) fn ticker_file(directory: &Path, ticker: &str, extension: &str) -> Option<PathBuf> {
    [ticker.to_uppercase(), ticker.to_lowercase(), ticker.to_string()]
        .iter()
        .map(|name| directory.join(format!("{}.{}", name, extension)))
        .find(|path| path.exists())
}

#[async_trait]
impl BarSource for CsvBarSource {
    async fn load_bars(&self, ticker: &str, lookback: Lookback) -> Result<PriceHistory, DataError> {
        let file_path = ticker_file(&self.directory, ticker, "csv").ok_or_else(|| {
            DataError::NotFound(format!(
                "No CSV file for {} in {}",
                ticker,
                self.directory.display()
            ))
        })?;

        let raw = tokio::fs::read(&file_path).await?;
        let history = csv_loader::parse_bars(raw.as_slice(), ticker)?;
        let trimmed = history.trailing(lookback);

        tracing::info!(
            ticker = %trimmed.ticker(),
            file = %file_path.display(),
            period = %lookback,
            loaded = history.len(),
            kept = trimmed.len(),
            "Loaded bars"
        );
        Ok(trimmed)
    }

    async fn available_tickers(&self) -> Result<Vec<String>, DataError> {
        let mut tickers = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_csv(&path) {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_uppercase());
                }
            }
        }
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::fmt::Write as _;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("techscan-data-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_daily_csv(dir: &Path, file: &str, days: i64) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
        for i in 0..days {
            let date = start + Duration::days(i);
            let close = 100 + i;
            writeln!(csv, "{},{},{},{},{},1000", date, close, close + 1, close - 1, close).unwrap();
        }
        std::fs::write(dir.join(file), csv).unwrap();
    }

    #[tokio::test]
    async fn test_load_bars_trims_to_lookback() {
        let dir = temp_dir("lookback");
        write_daily_csv(&dir, "AAPL.csv", 400);
        let source = CsvBarSource::new(&dir);

        let all = source.load_bars("aapl", Lookback::Max).await.unwrap();
        assert_eq!(all.len(), 400);
        assert_eq!(all.ticker(), "AAPL");

        let six_months = source.load_bars("AAPL", Lookback::Months(6)).await.unwrap();
        let last = six_months.last_date().unwrap();
        let first = six_months.first_date().unwrap();
        assert_eq!(last, all.last_date().unwrap());
        assert!(first >= Lookback::Months(6).start_from(last).unwrap());
        assert!(six_months.len() > 150 && six_months.len() < 200);

        let week = source.load_bars("AAPL", Lookback::Days(5)).await.unwrap();
        assert_eq!(week.len(), 5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_ticker() {
        let dir = temp_dir("missing");
        let source = CsvBarSource::new(&dir);
        assert!(matches!(
            source.load_bars("NOPE", Lookback::default()).await,
            Err(DataError::NotFound(_))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_available_tickers() {
        let dir = temp_dir("tickers");
        write_daily_csv(&dir, "msft.csv", 3);
        write_daily_csv(&dir, "AAPL.csv", 3);
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = CsvBarSource::new(&dir);
        assert_eq!(source.available_tickers().await.unwrap(), vec!["AAPL", "MSFT"]);
        std::fs::remove_dir_all(&dir).ok();
    }
}

use async_trait::async_trait;
use std::path::PathBuf;
use techscan_core::{DataError, Fundamentals, FundamentalsSource};

use crate::ticker_file;

/// A fundamentals source backed by a directory of `<TICKER>.json` files,
/// each holding one quote-summary object.
pub struct JsonFundamentalsSource {
    pub directory: PathBuf,
}

impl JsonFundamentalsSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// Parse a quote-summary object. The ticker falls back to `ticker` when the
/// object does not name one, and is always uppercased.
pub fn parse_fundamentals(raw: &[u8], ticker: &str) -> Result<Fundamentals, DataError> {
    let mut fundamentals: Fundamentals = serde_json::from_slice(raw)
        .map_err(|e| DataError::ParseError(format!("Invalid fundamentals for {}: {}", ticker, e)))?;
    if fundamentals.ticker.trim().is_empty() {
        fundamentals.ticker = ticker.to_string();
    }
    fundamentals.ticker = fundamentals.ticker.trim().to_uppercase();
    Ok(fundamentals)
}

#[async_trait]
impl FundamentalsSource for JsonFundamentalsSource {
    async fn load_fundamentals(&self, ticker: &str) -> Result<Fundamentals, DataError> {
        let file_path = ticker_file(&self.directory, ticker, "json").ok_or_else(|| {
            DataError::NotFound(format!(
                "No fundamentals file for {} in {}",
                ticker,
                self.directory.display()
            ))
        })?;

        let raw = tokio::fs::read(&file_path).await?;
        let fundamentals = parse_fundamentals(&raw, ticker)?;

        tracing::info!(
            ticker = %fundamentals.ticker,
            file = %file_path.display(),
            known = fundamentals.known_count(),
            "Loaded fundamentals"
        );
        Ok(fundamentals)
    }
}

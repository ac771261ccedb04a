use crate::bundle::IndicatorBundle;
use crate::fundamentals::Fundamentals;
use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Indicator Engine
// ---------------------------------------------------------------------------

/// Errors surfaced by indicator computation.
///
/// All of these are local to one computation: a caller analyzing many
/// tickers can skip the offending one and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Insufficient data: required {required} bars, got {got}")]
    InsufficientData { required: usize, got: usize },
    #[error("Series index mismatch: {left} vs {right} positions")]
    IndexMismatch { left: usize, right: usize },
}

impl IndicatorError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Turns a bar sequence into a full indicator bundle.
///
/// Implementations are pure: no I/O, no state shared across calls.
pub trait IndicatorEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn compute(&self, history: &PriceHistory) -> Result<IndicatorBundle, IndicatorError>;
}

// ---------------------------------------------------------------------------
// Bar Source Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while loading bars or fundamentals.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid history: {0}")]
    InvalidHistory(#[from] HistoryError),
}

/// Provides daily bars for a ticker.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Load the bars covering `lookback`, ending at the most recent bar available.
    async fn load_bars(&self, ticker: &str, lookback: Lookback) -> Result<PriceHistory, DataError>;

    /// List tickers this source can serve.
    async fn available_tickers(&self) -> Result<Vec<String>, DataError>;
}

/// Provides company fundamentals for a ticker.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn load_fundamentals(&self, ticker: &str) -> Result<Fundamentals, DataError>;
}

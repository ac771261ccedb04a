use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::series::Series;
use crate::traits::IndicatorError;

/// The raw series an engine assembles before they are checked for alignment.
#[derive(Debug, Clone)]
pub struct BundleParts {
    pub close: Series,
    pub sma_short: Series,
    pub sma_long: Series,
    pub rsi: Series,
    pub macd: Series,
    pub macd_signal: Series,
    pub bollinger_upper: Series,
    pub bollinger_lower: Series,
    pub stoch_k: Series,
    pub stoch_d: Series,
}

/// Every derived series for one bar sequence, all sharing its date index.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorBundle {
    close: Series,
    sma_short: Series,
    sma_long: Series,
    rsi: Series,
    macd: Series,
    macd_signal: Series,
    bollinger_upper: Series,
    bollinger_lower: Series,
    stoch_k: Series,
    stoch_d: Series,
}

impl IndicatorBundle {
    /// Assemble a bundle, rejecting any series not indexed like `close`.
    pub fn try_from_parts(parts: BundleParts) -> Result<Self, IndicatorError> {
        let bundle = Self {
            close: parts.close,
            sma_short: parts.sma_short,
            sma_long: parts.sma_long,
            rsi: parts.rsi,
            macd: parts.macd,
            macd_signal: parts.macd_signal,
            bollinger_upper: parts.bollinger_upper,
            bollinger_lower: parts.bollinger_lower,
            stoch_k: parts.stoch_k,
            stoch_d: parts.stoch_d,
        };

        for (_, series) in bundle.named_series() {
            if !series.shares_index(&bundle.close) {
                return Err(IndicatorError::IndexMismatch {
                    left: bundle.close.len(),
                    right: series.len(),
                });
            }
        }
        Ok(bundle)
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn close(&self) -> &Series {
        &self.close
    }

    pub fn sma_short(&self) -> &Series {
        &self.sma_short
    }

    pub fn sma_long(&self) -> &Series {
        &self.sma_long
    }

    pub fn rsi(&self) -> &Series {
        &self.rsi
    }

    pub fn macd(&self) -> &Series {
        &self.macd
    }

    pub fn macd_signal(&self) -> &Series {
        &self.macd_signal
    }

    pub fn bollinger_upper(&self) -> &Series {
        &self.bollinger_upper
    }

    pub fn bollinger_lower(&self) -> &Series {
        &self.bollinger_lower
    }

    pub fn stoch_k(&self) -> &Series {
        &self.stoch_k
    }

    pub fn stoch_d(&self) -> &Series {
        &self.stoch_d
    }

    /// All series with their stable names, in display order.
    pub fn named_series(&self) -> [(&'static str, &Series); 10] {
        [
            ("sma_short", &self.sma_short),
            ("sma_long", &self.sma_long),
            ("rsi", &self.rsi),
            ("macd", &self.macd),
            ("macd_signal", &self.macd_signal),
            ("bollinger_upper", &self.bollinger_upper),
            ("bollinger_lower", &self.bollinger_lower),
            ("stoch_k", &self.stoch_k),
            ("stoch_d", &self.stoch_d),
            ("close", &self.close),
        ]
    }

    /// The values a consumer reads: the most recent position of every series.
    /// `None` for an empty bundle.
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        let date = *self.close.dates().last()?;
        Some(IndicatorSnapshot {
            date,
            close: self.close.last_value(),
            sma_short: self.sma_short.last_value(),
            sma_long: self.sma_long.last_value(),
            rsi: self.rsi.last_value(),
            macd: self.macd.last_value(),
            macd_signal: self.macd_signal.last_value(),
            bollinger_upper: self.bollinger_upper.last_value(),
            bollinger_lower: self.bollinger_lower.last_value(),
            stoch_k: self.stoch_k.last_value(),
            stoch_d: self.stoch_d.last_value(),
        })
    }
}

/// The latest value of every indicator on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: Option<Decimal>,
    pub sma_short: Option<Decimal>,
    pub sma_long: Option<Decimal>,
    pub rsi: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub bollinger_upper: Option<Decimal>,
    pub bollinger_lower: Option<Decimal>,
    pub stoch_k: Option<Decimal>,
    pub stoch_d: Option<Decimal>,
}

impl IndicatorSnapshot {
    /// Names of the indicators that are undefined on this date.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("close", self.close),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("rsi", self.rsi),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("bollinger_upper", self.bollinger_upper),
            ("bollinger_lower", self.bollinger_lower),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

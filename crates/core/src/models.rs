use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::series::Series;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// Largest price a bar may carry. Keeps every rolling sum and squared
/// deviation the indicators compute well inside `Decimal`'s range.
pub const MAX_PRICE: Decimal = dec!(1000000000);

/// A single daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Bar {
    /// Create a bar, rejecting negative prices and inconsistent ranges.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Result<Self, HistoryError> {
        let bar = Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Check price sanity: within `[0, MAX_PRICE]`, and open/close inside [low, high].
    pub fn validate(&self) -> Result<(), HistoryError> {
        let invalid = |reason: &str| HistoryError::InvalidBar {
            date: self.date,
            reason: reason.to_string(),
        };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| *p < Decimal::ZERO) {
            return Err(invalid("negative price"));
        }
        if prices.iter().any(|p| *p > MAX_PRICE) {
            return Err(invalid("price above MAX_PRICE"));
        }
        if self.low > self.high {
            return Err(invalid("low is above high"));
        }
        if self.open < self.low || self.open > self.high {
            return Err(invalid("open outside the low/high range"));
        }
        if self.close < self.low || self.close > self.high {
            return Err(invalid("close outside the low/high range"));
        }
        Ok(())
    }
}

/// Errors raised while building a bar sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },
    #[error("Bars out of order: {previous} is followed by {next}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },
    #[error("Duplicate bar for {0}")]
    Duplicate(NaiveDate),
}

/// An ordered, validated daily bar sequence for one ticker.
///
/// Dates are strictly increasing. The date index is built once and shared by
/// every [`Series`] derived from this history, so derived series stay aligned.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    ticker: String,
    bars: Vec<Bar>,
    index: Arc<[NaiveDate]>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, HistoryError> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            let (previous, next) = (pair[0].date, pair[1].date);
            if previous == next {
                return Err(HistoryError::Duplicate(next));
            }
            if previous > next {
                return Err(HistoryError::OutOfOrder { previous, next });
            }
        }

        let index: Arc<[NaiveDate]> = bars.iter().map(|b| b.date).collect();
        Ok(Self {
            ticker: ticker.into().to_uppercase(),
            bars,
            index,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The shared date index.
    pub fn index(&self) -> Arc<[NaiveDate]> {
        Arc::clone(&self.index)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn closes(&self) -> Series {
        self.column(|b| b.close)
    }

    pub fn highs(&self) -> Series {
        self.column(|b| b.high)
    }

    pub fn lows(&self) -> Series {
        self.column(|b| b.low)
    }

    fn column(&self, f: impl Fn(&Bar) -> Decimal) -> Series {
        Series::from_parts(
            self.index(),
            self.bars.iter().map(|b| Some(f(b))).collect(),
        )
    }

    /// Keep only the bars inside `lookback`, measured back from the last bar.
    pub fn trailing(&self, lookback: Lookback) -> Self {
        let Some(last) = self.last_date() else {
            return self.clone();
        };

        let bars: Vec<Bar> = match lookback {
            Lookback::Days(n) => {
                let skip = self.bars.len().saturating_sub(n as usize);
                self.bars[skip..].to_vec()
            }
            _ => match lookback.start_from(last) {
                Some(start) => self
                    .bars
                    .iter()
                    .filter(|b| b.date >= start)
                    .cloned()
                    .collect(),
                None => self.bars.clone(),
            },
        };

        let index: Arc<[NaiveDate]> = bars.iter().map(|b| b.date).collect();
        Self {
            ticker: self.ticker.clone(),
            bars,
            index,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookback period
// ---------------------------------------------------------------------------

/// How much history to request for a ticker (`1d`, `5d`, `1mo`, `6mo`, `1y`, `ytd`, `max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback {
    /// The last N trading days (bars).
    Days(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl Default for Lookback {
    fn default() -> Self {
        Lookback::Months(6)
    }
}

impl Lookback {
    /// Earliest calendar date covered when the window ends on `end`.
    /// `None` means unbounded. Day lookbacks count bars, not calendar days,
    /// so they have no calendar start either.
    pub fn start_from(&self, end: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Lookback::Days(_) | Lookback::Max => None,
            Lookback::Months(n) => end.checked_sub_months(Months::new(n)),
            Lookback::Years(n) => end.checked_sub_months(Months::new(n.saturating_mul(12))),
            Lookback::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "{n}d"),
            Lookback::Months(n) => write!(f, "{n}mo"),
            Lookback::Years(n) => write!(f, "{n}y"),
            Lookback::YearToDate => write!(f, "ytd"),
            Lookback::Max => write!(f, "max"),
        }
    }
}

impl Serialize for Lookback {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Lookback {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "ytd" => return Ok(Lookback::YearToDate),
            "max" => return Ok(Lookback::Max),
            _ => {}
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("Missing unit in period '{s}'"))?;
        let (count, unit) = s.split_at(split);
        let count: u32 = count
            .parse()
            .map_err(|_| format!("Invalid count in period '{s}'"))?;
        if count == 0 {
            return Err(format!("Period '{s}' must be positive"));
        }

        match unit {
            "d" => Ok(Lookback::Days(count)),
            "mo" => Ok(Lookback::Months(count)),
            "y" => Ok(Lookback::Years(count)),
            _ => Err(format!("Unknown period unit '{unit}' (expected d, mo, y)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn flat_bar(date: NaiveDate, price: Decimal) -> Bar {
        Bar::new(date, price, price, price, price, 100).unwrap()
    }

    #[test]
    fn test_bar_rejects_bad_ranges() {
        assert!(Bar::new(day(1), dec!(10), dec!(9), dec!(11), dec!(10), 0).is_err());
        assert!(Bar::new(day(1), dec!(12), dec!(11), dec!(9), dec!(10), 0).is_err());
        assert!(Bar::new(day(1), dec!(-1), dec!(11), dec!(-2), dec!(10), 0).is_err());
        assert!(Bar::new(day(1), dec!(10), dec!(11), dec!(9), dec!(10.5), 0).is_ok());

        let huge = MAX_PRICE + Decimal::ONE;
        assert!(matches!(
            Bar::new(day(1), huge, huge, huge, huge, 0),
            Err(HistoryError::InvalidBar { .. })
        ));
        assert!(Bar::new(day(1), MAX_PRICE, MAX_PRICE, MAX_PRICE, MAX_PRICE, 0).is_ok());
    }

    #[test]
    fn test_history_requires_increasing_dates() {
        let dup = vec![flat_bar(day(1), dec!(1)), flat_bar(day(1), dec!(2))];
        assert_eq!(
            PriceHistory::new("aapl", dup).unwrap_err(),
            HistoryError::Duplicate(day(1))
        );

        let unordered = vec![flat_bar(day(2), dec!(1)), flat_bar(day(1), dec!(2))];
        assert!(matches!(
            PriceHistory::new("aapl", unordered),
            Err(HistoryError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_history_columns_share_index() {
        let bars = (1..=3).map(|d| flat_bar(day(d), Decimal::from(d))).collect();
        let history = PriceHistory::new("aapl", bars).unwrap();
        assert_eq!(history.ticker(), "AAPL");

        let closes = history.closes();
        let highs = history.highs();
        assert!(closes.shares_index(&highs));
        assert_eq!(closes.values(), &[Some(dec!(1)), Some(dec!(2)), Some(dec!(3))]);
    }

    #[test]
    fn test_lookback_parse_and_display() {
        assert_eq!("6mo".parse::<Lookback>().unwrap(), Lookback::Months(6));
        assert_eq!("5d".parse::<Lookback>().unwrap(), Lookback::Days(5));
        assert_eq!("10Y".parse::<Lookback>().unwrap(), Lookback::Years(10));
        assert_eq!("ytd".parse::<Lookback>().unwrap(), Lookback::YearToDate);
        assert!("0mo".parse::<Lookback>().is_err());
        assert!("6w".parse::<Lookback>().is_err());
        assert!("mo".parse::<Lookback>().is_err());
        assert_eq!(Lookback::Months(6).to_string(), "6mo");

        let json = serde_json::to_string(&Lookback::Years(2)).unwrap();
        assert_eq!(json, "\"2y\"");
        assert_eq!(serde_json::from_str::<Lookback>("\"ytd\"").unwrap(), Lookback::YearToDate);
    }

    #[test]
    fn test_trailing_window() {
        let bars: Vec<Bar> = (1..=31).map(|d| flat_bar(day(d), dec!(1))).collect();
        let history = PriceHistory::new("msft", bars).unwrap();

        let last_five = history.trailing(Lookback::Days(5));
        assert_eq!(last_five.len(), 5);
        assert_eq!(last_five.first_date(), Some(day(27)));

        assert_eq!(history.trailing(Lookback::Months(1)).len(), 31);
        assert_eq!(history.trailing(Lookback::Max).len(), 31);
        assert_eq!(
            Lookback::YearToDate.start_from(day(15)),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }
}

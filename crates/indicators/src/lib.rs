pub mod bollinger;
pub mod engine;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use engine::{compute_bundle, IndicatorConfig, StandardEngine};

use rust_decimal::Decimal;
use techscan_core::{IndicatorError, Series, MAX_PRICE};

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: Decimal) -> Option<Decimal>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Batch helpers shared by the series functions
// ---------------------------------------------------------------------------

/// Reject a window of zero or one longer than the series.
pub(crate) fn check_window(name: &str, window: usize, len: usize) -> Result<(), IndicatorError> {
    check_positive(name, window)?;
    if window > len {
        return Err(IndicatorError::invalid(
            name,
            format!("window {window} exceeds series length {len}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(name: &str, window: usize) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::invalid(name, "window must be > 0"));
    }
    Ok(())
}

/// Reject a series holding a value beyond `MAX_PRICE` in magnitude.
pub(crate) fn check_values(name: &str, series: &Series) -> Result<(), IndicatorError> {
    let too_large = series
        .iter()
        .find_map(|(date, value)| value.filter(|v| v.abs() > MAX_PRICE).map(|v| (date, v)));
    match too_large {
        Some((date, v)) => Err(IndicatorError::invalid(
            name,
            format!("value {v} on {date} exceeds {MAX_PRICE} in magnitude"),
        )),
        None => Ok(()),
    }
}

/// Feed every value of a series through a streaming indicator.
///
/// An undefined input resets the indicator and yields an undefined output, so
/// any rolling window that would span the gap stays undefined.
pub(crate) fn feed<I, T>(
    values: &[Option<Decimal>],
    indicator: &mut I,
    mut step: impl FnMut(&mut I, Decimal) -> Option<T>,
) -> Vec<Option<T>>
where
    I: Indicator,
{
    values
        .iter()
        .map(|value| match value {
            Some(v) => step(indicator, *v),
            None => {
                indicator.reset();
                None
            }
        })
        .collect()
}

/// Run a single-output indicator over `series`, keeping its index.
pub(crate) fn drive<I: Indicator>(series: &Series, indicator: &mut I) -> Result<Series, IndicatorError> {
    let values = feed(series.values(), indicator, |ind, v| ind.next(v));
    series.with_values(values)
}

/// Pull one field out of a composite indicator's outputs.
pub(crate) fn project<T>(
    series: &Series,
    outputs: &[Option<T>],
    field: impl Fn(&T) -> Decimal,
) -> Result<Series, IndicatorError> {
    series.with_values(outputs.iter().map(|o| o.as_ref().map(&field)).collect())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use techscan_core::{Bar, PriceHistory, Series};

    pub fn index(n: usize) -> Arc<[NaiveDate]> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    pub fn series(values: &[Decimal]) -> Series {
        Series::defined(index(values.len()), values.to_vec()).unwrap()
    }

    pub fn series_from_ints(values: &[i64]) -> Series {
        series(&values.iter().map(|v| Decimal::from(*v)).collect::<Vec<_>>())
    }

    /// Bars whose high/low sit `spread` around the close.
    pub fn history(closes: &[Decimal], spread: Decimal) -> PriceHistory {
        let dates = index(closes.len());
        let bars = closes
            .iter()
            .zip(dates.iter())
            .map(|(c, d)| Bar::new(*d, *c, *c + spread, *c - spread, *c, 1_000).unwrap())
            .collect();
        PriceHistory::new("TEST", bars).unwrap()
    }
}

use crate::ema::Ema;
use crate::{check_positive, check_values, feed, project, Indicator};
use rust_decimal::Decimal;
use techscan_core::{IndicatorError, Series};

/// MACD (Moving Average Convergence Divergence).
///
/// Composed of three EMAs:
/// - Fast EMA (default 12)
/// - Slow EMA (default 26)
/// - Signal EMA (default 9), applied to the MACD line itself
///
/// All three seed at their first input, so every input produces a full output.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
    output: Option<MacdOutput>,
}

/// MACD output with all three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdOutput {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self, IndicatorError> {
        check_positive("macd_fast", fast_period)?;
        check_positive("macd_slow", slow_period)?;
        check_positive("macd_signal", signal_period)?;
        if fast_period >= slow_period {
            return Err(IndicatorError::invalid(
                "macd_fast",
                format!("fast period {fast_period} must be less than slow period {slow_period}"),
            ));
        }
        Ok(Self {
            fast_ema: Ema::new(fast_period)?,
            slow_ema: Ema::new(slow_period)?,
            signal_ema: Ema::new(signal_period)?,
            output: None,
        })
    }

    /// Returns the full MACD output (macd, signal, histogram) if ready.
    pub fn output(&self) -> Option<MacdOutput> {
        self.output
    }

    /// Process next value and return full output if ready.
    pub fn next_output(&mut self, value: Decimal) -> Option<MacdOutput> {
        let fast = self.fast_ema.next(value);
        let slow = self.slow_ema.next(value);

        if let (Some(f), Some(s)) = (fast, slow) {
            let macd = f - s;
            if let Some(signal) = self.signal_ema.next(macd) {
                self.output = Some(MacdOutput {
                    macd,
                    signal,
                    histogram: macd - signal,
                });
            }
        }

        self.output
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.macd)
    }

    fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
        self.output = None;
    }

    fn period(&self) -> usize {
        self.slow_ema.period()
    }

    fn is_ready(&self) -> bool {
        self.output.is_some()
    }
}

/// MACD line, signal line and histogram, aligned to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// `EMA(fast) - EMA(slow)` and its `EMA(signal)`.
pub fn macd(series: &Series, fast: usize, slow: usize, signal: usize) -> Result<MacdSeries, IndicatorError> {
    let mut indicator = Macd::new(fast, slow, signal)?;
    check_values("macd", series)?;
    let outputs = feed(series.values(), &mut indicator, |m, v| m.next_output(v));
    Ok(MacdSeries {
        macd: project(series, &outputs, |o| o.macd)?,
        signal: project(series, &outputs, |o| o.signal)?,
        histogram: project(series, &outputs, |o| o.histogram)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ema::ema;
    use crate::test_support::series_from_ints;
    use rust_decimal_macros::dec;

    fn sample() -> Series {
        series_from_ints(&[
            22, 24, 23, 25, 27, 26, 28, 30, 29, 31, 33, 32, 30, 29, 31, 34, 36, 35, 37, 38, 36, 39,
            41, 40, 42, 44, 43, 45, 47, 46,
        ])
    }

    #[test]
    fn test_macd_defined_from_first_value() {
        let mut macd = Macd::new(3, 5, 3).unwrap();
        let first = macd.next_output(dec!(10)).unwrap();
        assert_eq!(first.macd, Decimal::ZERO);
        assert_eq!(first.signal, Decimal::ZERO);
        assert!(macd.next_output(dec!(12)).is_some());
    }

    #[test]
    fn test_macd_matches_ema_difference() {
        let closes = sample();
        let out = macd(&closes, 12, 26, 9).unwrap();
        let expected = ema(&closes, 12)
            .unwrap()
            .zip_with(&ema(&closes, 26).unwrap(), |f, s| f - s)
            .unwrap();

        assert_eq!(out.macd, expected);
        assert_eq!(out.signal, ema(&expected, 9).unwrap());
        assert_eq!(out.macd.defined_count(), closes.len());
        assert_eq!(out.signal.defined_count(), closes.len());
    }

    #[test]
    fn test_macd_is_deterministic() {
        let closes = sample();
        assert_eq!(
            macd(&closes, 12, 26, 9).unwrap(),
            macd(&closes, 12, 26, 9).unwrap()
        );
    }

    #[test]
    fn test_macd_rising_trend_is_positive() {
        let out = macd(&sample(), 12, 26, 9).unwrap();
        assert!(out.macd.last_value().unwrap() > Decimal::ZERO);
        let last = out.histogram.last_value().unwrap();
        assert_eq!(
            last,
            out.macd.last_value().unwrap() - out.signal.last_value().unwrap()
        );
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        assert!(Macd::new(26, 12, 9).is_err());
        assert!(Macd::new(12, 12, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
        assert!(Macd::new(0, 26, 9).is_err());
    }
}

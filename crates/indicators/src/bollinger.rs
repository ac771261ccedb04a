use crate::sma::Sma;
use crate::{check_values, check_window, feed, project, Indicator};
use rust_decimal::Decimal;
use techscan_core::{IndicatorError, Series};

/// Bollinger Bands.
///
/// Middle band is the SMA; the bands sit `num_std` population standard
/// deviations above and below it.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: Decimal,
    sma: Sma,
    output: Option<BollingerOutput>,
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    pub bandwidth: Decimal,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: Decimal) -> Result<Self, IndicatorError> {
        if num_std_dev < Decimal::ZERO {
            return Err(IndicatorError::invalid(
                "bollinger_std_dev",
                "band width multiplier must be >= 0",
            ));
        }
        Ok(Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period)?,
            output: None,
        })
    }

    /// Population standard deviation of the current window around `mean`.
    /// `None` if the squared deviations overflow.
    fn std_dev(&self, mean: Decimal) -> Option<Decimal> {
        let window = self.sma.window();
        if window.len() < 2 {
            return Some(Decimal::ZERO);
        }
        let squares = window.iter().try_fold(Decimal::ZERO, |acc, v| {
            let diff = v.checked_sub(mean)?;
            acc.checked_add(diff.checked_mul(diff)?)
        })?;
        let variance = squares.checked_div(Decimal::from(window.len()))?;
        Some(decimal_sqrt(variance))
    }

    pub fn output(&self) -> Option<BollingerOutput> {
        self.output
    }

    pub fn next_output(&mut self, value: Decimal) -> Option<BollingerOutput> {
        self.output = self.sma.next(value).and_then(|mid| {
            let offset = self.num_std.checked_mul(self.std_dev(mid)?)?;
            let upper = mid.checked_add(offset)?;
            let lower = mid.checked_sub(offset)?;
            Some(BollingerOutput {
                upper,
                middle: mid,
                lower,
                bandwidth: upper.checked_sub(lower)?,
            })
        });
        self.output
    }
}

impl Indicator for BollingerBands {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.middle)
    }

    fn reset(&mut self) {
        self.sma.reset();
        self.output = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.output.is_some()
    }
}

/// Newton's method square root for Decimal.
pub fn decimal_sqrt(value: Decimal) -> Decimal {
    if value.is_zero() || value < Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = value / Decimal::TWO;
    if guess.is_zero() {
        guess = value;
    }
    let epsilon = Decimal::new(1, 10); // 0.0000000001
    for _ in 0..100 {
        let next_guess = (guess + value / guess) / Decimal::TWO;
        let diff = (next_guess - guess).abs();
        guess = next_guess;
        if diff < epsilon {
            break;
        }
    }
    guess
}

/// Upper, middle and lower bands aligned to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Bollinger Bands over `window` positions, `num_std` deviations wide.
/// Undefined wherever the SMA of the same window is undefined.
pub fn bollinger(series: &Series, window: usize, num_std: Decimal) -> Result<BollingerSeries, IndicatorError> {
    check_window("bollinger", window, series.len())?;
    check_values("bollinger", series)?;
    let mut bands = BollingerBands::new(window, num_std)?;
    let outputs = feed(series.values(), &mut bands, |b, v| b.next_output(v));
    Ok(BollingerSeries {
        upper: project(series, &outputs, |o| o.upper)?,
        middle: project(series, &outputs, |o| o.middle)?,
        lower: project(series, &outputs, |o| o.lower)?,
    })
}

use crate::sma::Sma;
use crate::{check_values, check_window, Indicator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use techscan_core::{IndicatorError, PriceHistory, Series};

/// %K when the high-low range of the window is zero.
pub const STOCH_FLAT_RANGE: Decimal = dec!(50);

/// Stochastic Oscillator (%K and %D).
///
/// %K = (Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA(%K, d_period)
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    highs: VecDeque<Decimal>,
    lows: VecDeque<Decimal>,
    d_sma: Sma,
    current: Option<StochasticOutput>,
}

/// %K is available once `k_period` bars are in; %D trails it by `d_period - 1` more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticOutput {
    pub k: Decimal,
    pub d: Option<Decimal>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Result<Self, IndicatorError> {
        crate::check_positive("stoch_k", k_period)?;
        crate::check_positive("stoch_d", d_period)?;
        Ok(Self {
            k_period,
            d_period,
            highs: VecDeque::with_capacity(k_period),
            lows: VecDeque::with_capacity(k_period),
            d_sma: Sma::new(d_period)?,
            current: None,
        })
    }

    pub fn next_hlc(&mut self, high: Decimal, low: Decimal, close: Decimal) -> Option<StochasticOutput> {
        self.highs.push_back(high);
        self.lows.push_back(low);

        if self.highs.len() > self.k_period {
            self.highs.pop_front();
            self.lows.pop_front();
        }

        if self.highs.len() < self.k_period {
            return None;
        }

        let highest = self.highs.iter().max().copied()?;
        let lowest = self.lows.iter().min().copied()?;

        let range = highest.checked_sub(lowest)?;
        let k = if range.is_zero() {
            STOCH_FLAT_RANGE
        } else {
            // Only overflows when close sits far outside the window's range.
            close
                .checked_sub(lowest)
                .and_then(|above| above.checked_div(range))
                .and_then(|ratio| ratio.checked_mul(dec!(100)))?
        };

        let d = self.d_sma.next(k);
        self.current = Some(StochasticOutput { k, d });
        self.current
    }

    pub fn output(&self) -> Option<StochasticOutput> {
        self.current
    }

    /// Clear both windows. Stochastic needs a full bar, so it is not an
    /// [`Indicator`](crate::Indicator) over single values.
    pub fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.d_sma.reset();
        self.current = None;
    }

    /// Bars needed before %D is defined.
    pub fn period(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some_and(|o| o.d.is_some())
    }
}

/// %K and %D lines aligned to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

/// Stochastic oscillator over aligned high, low and close series.
///
/// A bar with any undefined component restarts both windows.
pub fn stochastic(
    high: &Series,
    low: &Series,
    close: &Series,
    k_window: usize,
    d_window: usize,
) -> Result<StochasticSeries, IndicatorError> {
    for other in [high, low] {
        if !other.shares_index(close) {
            return Err(IndicatorError::IndexMismatch {
                left: close.len(),
                right: other.len(),
            });
        }
    }
    check_window("stoch_k", k_window, close.len())?;
    check_window("stoch_d", d_window, close.len())?;
    for series in [high, low, close] {
        check_values("stoch", series)?;
    }
    for (i, date) in close.dates().iter().enumerate() {
        if let (Some(h), Some(l), Some(c)) = (high.get(i), low.get(i), close.get(i)) {
            if l > h || c < l || c > h {
                return Err(IndicatorError::invalid(
                    "stoch",
                    format!("close {c} outside low/high range [{l}, {h}] on {date}"),
                ));
            }
        }
    }

    let mut stoch = Stochastic::new(k_window, d_window)?;
    let mut k = Vec::with_capacity(close.len());
    let mut d = Vec::with_capacity(close.len());
    for i in 0..close.len() {
        let out = match (high.get(i), low.get(i), close.get(i)) {
            (Some(h), Some(l), Some(c)) => stoch.next_hlc(h, l, c),
            _ => {
                stoch.reset();
                None
            }
        };
        k.push(out.map(|o| o.k));
        d.push(out.and_then(|o| o.d));
    }

    Ok(StochasticSeries {
        k: close.with_values(k)?,
        d: close.with_values(d)?,
    })
}

/// Stochastic oscillator over a bar history.
pub fn stochastic_bars(history: &PriceHistory, k_window: usize, d_window: usize) -> Result<StochasticSeries, IndicatorError> {
    stochastic(&history.highs(), &history.lows(), &history.closes(), k_window, d_window)
}

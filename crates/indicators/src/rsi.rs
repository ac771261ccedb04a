use crate::{check_values, check_window, drive, Indicator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use techscan_core::{IndicatorError, Series};

/// RSI when the window saw gains but no losses.
pub const RSI_NO_LOSS: Decimal = dec!(100);
/// RSI when the window saw neither gains nor losses.
pub const RSI_FLAT: Decimal = dec!(50);

/// Relative Strength Index (RSI).
///
/// Average gain/loss are simple rolling means of the last `period` price
/// changes, so the first value needs `period + 1` inputs. A change or sum
/// that would overflow restarts the window.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<Decimal>,
    gains: VecDeque<Decimal>,
    losses: VecDeque<Decimal>,
    gain_sum: Decimal,
    loss_sum: Decimal,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        crate::check_positive("rsi", period)?;
        Ok(Self {
            len: period,
            prev_value: None,
            gains: VecDeque::with_capacity(period),
            losses: VecDeque::with_capacity(period),
            gain_sum: Decimal::ZERO,
            loss_sum: Decimal::ZERO,
        })
    }

    /// Average gain and average loss over the current window, once full.
    pub fn averages(&self) -> Option<(Decimal, Decimal)> {
        if self.gains.len() < self.len {
            return None;
        }
        let period_dec = Decimal::from(self.len);
        Some((self.gain_sum / period_dec, self.loss_sum / period_dec))
    }

    pub fn value(&self) -> Option<Decimal> {
        self.averages().map(|(ag, al)| rsi_from_averages(ag, al))
    }
}

/// `100 - 100 / (1 + avg_gain / avg_loss)`, with fixed values where the
/// ratio is undefined. A ratio too large for `Decimal` counts as no loss.
pub fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            RSI_FLAT
        } else {
            RSI_NO_LOSS
        }
    } else {
        match avg_gain
            .checked_div(avg_loss)
            .and_then(|rs| rs.checked_add(Decimal::ONE))
        {
            Some(denominator) => dec!(100) - (dec!(100) / denominator),
            None => RSI_NO_LOSS,
        }
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        if let Some(prev) = self.prev_value {
            let Some(change) = value.checked_sub(prev) else {
                self.reset();
                self.prev_value = Some(value);
                return None;
            };
            let gain = change.max(Decimal::ZERO);
            let loss = (-change).max(Decimal::ZERO);
            let (Some(gain_sum), Some(loss_sum)) =
                (self.gain_sum.checked_add(gain), self.loss_sum.checked_add(loss))
            else {
                self.reset();
                self.prev_value = Some(value);
                return None;
            };

            self.gains.push_back(gain);
            self.losses.push_back(loss);
            self.gain_sum = gain_sum;
            self.loss_sum = loss_sum;

            if self.gains.len() > self.len {
                if let (Some(g), Some(l)) = (self.gains.pop_front(), self.losses.pop_front()) {
                    self.gain_sum -= g;
                    self.loss_sum -= l;
                }
            }
        }

        self.prev_value = Some(value);
        self.value()
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.gains.clear();
        self.losses.clear();
        self.gain_sum = Decimal::ZERO;
        self.loss_sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len + 1 // need one extra data point for the first change
    }

    fn is_ready(&self) -> bool {
        self.gains.len() == self.len
    }
}

/// RSI series over `window` price changes.
///
/// Index 0 has no change, so the first defined value is at index `window`.
pub fn rsi(series: &Series, window: usize) -> Result<Series, IndicatorError> {
    check_window("rsi", window, series.len())?;
    check_values("rsi", series)?;
    drive(series, &mut Rsi::new(window)?)
}

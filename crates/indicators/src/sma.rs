use crate::{check_values, check_window, drive, Indicator};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use techscan_core::{IndicatorError, Series};

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        crate::check_positive("sma", period)?;
        Ok(Self {
            len: period,
            buffer: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        })
    }

    /// Get the current SMA value without feeding new data.
    pub fn value(&self) -> Option<Decimal> {
        if self.buffer.len() == self.len {
            Some(self.sum / Decimal::from(self.len))
        } else {
            None
        }
    }

    /// The values currently inside the window, oldest first.
    pub fn window(&self) -> &VecDeque<Decimal> {
        &self.buffer
    }
}

impl Indicator for Sma {
    /// A sum that would overflow restarts the window.
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        let Some(sum) = self.sum.checked_add(value) else {
            self.reset();
            return None;
        };
        self.sum = sum;
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                self.sum -= removed;
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}

/// Trailing arithmetic mean over `window` positions.
///
/// Defined from index `window - 1` onward. Fails if `window` is zero or
/// longer than the series.
pub fn sma(series: &Series, window: usize) -> Result<Series, IndicatorError> {
    check_window("sma", window, series.len())?;
    check_values("sma", series)?;
    drive(series, &mut Sma::new(window)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{series, series_from_ints};
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_basic() {
        let mut sma = Sma::new(3).unwrap();
        assert_eq!(sma.next(dec!(1)), None);
        assert_eq!(sma.next(dec!(2)), None);
        assert_eq!(sma.next(dec!(3)), Some(dec!(2)));
        assert_eq!(sma.next(dec!(4)), Some(dec!(3)));
        assert_eq!(sma.next(dec!(5)), Some(dec!(4)));
    }

    #[test]
    fn test_sma_reset() {
        let mut sma = Sma::new(2).unwrap();
        sma.next(dec!(10));
        sma.next(dec!(20));
        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.next(dec!(5)), None);
        assert_eq!(sma.next(dec!(15)), Some(dec!(10)));
    }

    #[test]
    fn test_sma_series_warm_up() {
        let closes = series_from_ints(&[10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20]);
        let out = sma(&closes, 5).unwrap();

        assert_eq!(out.len(), closes.len());
        assert!(out.values()[..4].iter().all(Option::is_none));
        assert_eq!(out.get(4), Some(dec!(12)));
        assert_eq!(out.get(10), Some(dec!(18)));
        assert_eq!(out.first_defined_index(), Some(4));
        assert_eq!(out.defined_count(), 7);
        assert!(out.shares_index(&closes));
    }

    #[test]
    fn test_sma_defined_range_for_every_window() {
        let closes = series_from_ints(&[3, 1, 4, 1, 5, 9, 2, 6, 5, 3]);
        for w in 1..=closes.len() {
            let out = sma(&closes, w).unwrap();
            for (i, v) in out.values().iter().enumerate() {
                assert_eq!(v.is_some(), i + 1 >= w, "window {w}, index {i}");
            }
        }
    }

    #[test]
    fn test_sma_rejects_bad_window() {
        let closes = series(&[dec!(1), dec!(2), dec!(3)]);
        assert!(matches!(
            sma(&closes, 0),
            Err(IndicatorError::InvalidParameter { .. })
        ));
        assert!(matches!(
            sma(&closes, 4),
            Err(IndicatorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_sma_rejects_oversized_values() {
        let closes = series(&[dec!(30000000000000000000000000000); 3]);
        assert!(matches!(
            sma(&closes, 3),
            Err(IndicatorError::InvalidParameter { ref name, .. }) if name == "sma"
        ));
    }

    #[test]
    fn test_streaming_sum_overflow_restarts_window() {
        let huge = dec!(30000000000000000000000000000);
        let mut sma = Sma::new(3).unwrap();
        assert_eq!(sma.next(huge), None);
        assert_eq!(sma.next(huge), None);
        assert_eq!(sma.next(huge), None);
        assert!(!sma.is_ready());
        assert_eq!(sma.next(dec!(1)), None);
    }

    #[test]
    fn test_sma_gap_breaks_window() {
        let closes = series(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        let gapped = closes
            .with_values(vec![Some(dec!(1)), Some(dec!(2)), None, Some(dec!(4)), Some(dec!(6))])
            .unwrap();
        let out = sma(&gapped, 2).unwrap();
        assert_eq!(out.values(), &[None, Some(dec!(1.5)), None, None, Some(dec!(5))]);
    }
}

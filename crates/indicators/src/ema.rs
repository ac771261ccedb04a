use crate::{check_positive, check_values, drive, Indicator};
use rust_decimal::Decimal;
use techscan_core::{IndicatorError, Series};

/// Exponential Moving Average (EMA).
///
/// Smoothing factor `α = 2 / (period + 1)`. The first value seeds the
/// average directly (`EMA[0] = x[0]`), so the EMA is ready from the first
/// input onward; there is no SMA warm-up.
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: Decimal,
    current: Option<Decimal>,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_positive("ema", period)?;
        let multiplier = Decimal::TWO / (Decimal::from(period) + Decimal::ONE);
        Ok(Self {
            len: period,
            multiplier,
            current: None,
        })
    }

    pub fn value(&self) -> Option<Decimal> {
        self.current
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        let ema = match self.current {
            None => value,
            Some(prev) => self.multiplier * value + (Decimal::ONE - self.multiplier) * prev,
        };
        self.current = Some(ema);
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

/// Exponential moving average seeded at the first value.
///
/// Every defined input position yields a defined output. After an undefined
/// position the average re-seeds at the next defined value.
pub fn ema(series: &Series, window: usize) -> Result<Series, IndicatorError> {
    check_positive("ema", window)?;
    check_values("ema", series)?;
    drive(series, &mut Ema::new(window)?)
}

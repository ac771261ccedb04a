use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use techscan_core::{BundleParts, IndicatorBundle, IndicatorEngine, IndicatorError, PriceHistory};

use crate::bollinger::bollinger;
use crate::macd::macd;
use crate::rsi::rsi;
use crate::sma::sma;
use crate::stochastic::stochastic_bars;

/// Band width of the Bollinger envelope, in standard deviations.
pub const BOLLINGER_STD_DEVS: Decimal = Decimal::TWO;

/// Window sizes for every indicator in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger: 20,
            stoch_k: 14,
            stoch_d: 3,
        }
    }
}

impl IndicatorConfig {
    /// Reject zero windows and a MACD fast period that is not below the slow one.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let windows = [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("rsi", self.rsi),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("bollinger", self.bollinger),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
        ];
        for (name, window) in windows {
            crate::check_positive(name, window)?;
        }
        if self.macd_fast >= self.macd_slow {
            return Err(IndicatorError::invalid(
                "macd_fast",
                format!(
                    "fast period {} must be less than slow period {}",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }
        Ok(())
    }

    /// Bars needed for the last position of every series to be defined.
    ///
    /// MACD and its signal are EMA-based and defined from the first bar, so
    /// they do not contribute.
    pub fn required_bars(&self) -> usize {
        [
            self.sma_short,
            self.sma_long,
            self.rsi + 1,
            self.bollinger,
            self.stoch_k + self.stoch_d - 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

/// Compute every indicator for `history` with the windows in `config`.
///
/// Fails with [`IndicatorError::InsufficientData`] when the history is too
/// short for the latest value of every series to be defined.
pub fn compute_bundle(history: &PriceHistory, config: &IndicatorConfig) -> Result<IndicatorBundle, IndicatorError> {
    config.validate()?;

    let required = config.required_bars();
    if history.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            got: history.len(),
        });
    }

    let close = history.closes();
    let macd_lines = macd(&close, config.macd_fast, config.macd_slow, config.macd_signal)?;
    let bands = bollinger(&close, config.bollinger, BOLLINGER_STD_DEVS)?;
    let stoch = stochastic_bars(history, config.stoch_k, config.stoch_d)?;

    let bundle = IndicatorBundle::try_from_parts(BundleParts {
        sma_short: sma(&close, config.sma_short)?,
        sma_long: sma(&close, config.sma_long)?,
        rsi: rsi(&close, config.rsi)?,
        macd: macd_lines.macd,
        macd_signal: macd_lines.signal,
        bollinger_upper: bands.upper,
        bollinger_lower: bands.lower,
        stoch_k: stoch.k,
        stoch_d: stoch.d,
        close,
    })?;

    tracing::debug!(
        ticker = history.ticker(),
        bars = history.len(),
        required,
        "Computed indicator bundle"
    );
    Ok(bundle)
}

/// The standard engine: the fixed indicator set with configurable windows.
#[derive(Debug, Clone, Default)]
pub struct StandardEngine {
    config: IndicatorConfig,
}

impl StandardEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }
}

impl IndicatorEngine for StandardEngine {
    fn name(&self) -> &str {
        "standard"
    }

    fn compute(&self, history: &PriceHistory) -> Result<IndicatorBundle, IndicatorError> {
        compute_bundle(history, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::history;
    use rust_decimal_macros::dec;
    use std::thread;

    /// A gently oscillating uptrend.
    fn closes(n: usize) -> Vec<Decimal> {
        (0..n)
            .map(|i| {
                let wave = [0, 2, 3, 1, -1, -2, 0, 1][i % 8];
                Decimal::from(100 + i as i64 / 2 + wave)
            })
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = IndicatorConfig::default();
        assert_eq!(config.sma_short, 20);
        assert_eq!(config.sma_long, 50);
        assert_eq!(config.stoch_d, 3);
        assert_eq!(config.required_bars(), 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bundle_is_complete_and_aligned() {
        let bars = history(&closes(126), dec!(1));
        let bundle = compute_bundle(&bars, &IndicatorConfig::default()).unwrap();

        assert_eq!(bundle.len(), 126);
        for (name, series) in bundle.named_series() {
            assert_eq!(series.len(), 126, "{name} length");
            assert!(series.shares_index(bundle.close()), "{name} index");
        }

        let snapshot = bundle.latest().unwrap();
        assert!(snapshot.is_complete(), "missing: {:?}", snapshot.missing());
        assert_eq!(snapshot.close, Some(closes(126)[125]));
        assert_eq!(snapshot.date, bars.last_date().unwrap());

        assert_eq!(bundle.sma_long().first_defined_index(), Some(49));
        assert_eq!(bundle.rsi().first_defined_index(), Some(14));
        assert_eq!(bundle.stoch_d().first_defined_index(), Some(15));
        assert_eq!(bundle.macd().defined_count(), 126);
        assert_eq!(bundle.macd_signal().defined_count(), 126);
    }

    #[test]
    fn test_insufficient_data() {
        let bars = history(&closes(49), dec!(1));
        assert_eq!(
            compute_bundle(&bars, &IndicatorConfig::default()).unwrap_err(),
            IndicatorError::InsufficientData { required: 50, got: 49 }
        );
        assert!(compute_bundle(&history(&closes(50), dec!(1)), &IndicatorConfig::default()).is_ok());
    }

    #[test]
    fn test_rsi_window_sets_minimum() {
        let config = IndicatorConfig {
            sma_short: 3,
            sma_long: 5,
            rsi: 8,
            bollinger: 4,
            stoch_k: 4,
            stoch_d: 2,
            ..Default::default()
        };
        assert_eq!(config.required_bars(), 9);
        let bars = history(&closes(9), dec!(1));
        let bundle = compute_bundle(&bars, &config).unwrap();
        assert!(bundle.latest().unwrap().is_complete());
    }

    #[test]
    fn test_invalid_config() {
        let bars = history(&closes(60), dec!(1));
        let zero = IndicatorConfig {
            rsi: 0,
            ..Default::default()
        };
        assert!(matches!(
            compute_bundle(&bars, &zero),
            Err(IndicatorError::InvalidParameter { ref name, .. }) if name == "rsi"
        ));

        let inverted = IndicatorConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_engine_trait_and_threads() {
        let engine = StandardEngine::default();
        assert_eq!(engine.name(), "standard");

        let bars = history(&closes(80), dec!(1));
        let expected = engine.compute(&bars).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                let bars = bars.clone();
                thread::spawn(move || engine.compute(&bars).unwrap().latest())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected.latest());
        }
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: IndicatorConfig = toml::from_str("sma_short = 10\nrsi = 7\n").unwrap();
        assert_eq!(config.sma_short, 10);
        assert_eq!(config.rsi, 7);
        assert_eq!(config.sma_long, 50);
    }
}

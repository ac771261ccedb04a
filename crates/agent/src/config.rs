use serde::{Deserialize, Serialize};
use std::path::Path;
use techscan_core::Lookback;
use techscan_indicators::IndicatorConfig;

use crate::error::AgentError;

/// File-level configuration: indicator windows plus agent settings.
///
/// ```toml
/// [indicators]
/// sma_short = 20
/// rsi = 14
///
/// [agent]
/// period = "6mo"
/// model = "o4-mini"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub indicators: IndicatorConfig,
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// History requested per ticker.
    pub period: Lookback,
    pub model: String,
    pub base_url: String,
    pub reasoning_effort: String,
    pub timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            period: Lookback::default(),
            model: "o4-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            reasoning_effort: "low".to_string(),
            timeout_secs: 120,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, AgentError> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| AgentError::Config(e.to_string()))?;
        config.indicators.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml(&self) -> Result<String, AgentError> {
        toml::to_string_pretty(self).map_err(|e| AgentError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [indicators]
            sma_long = 100

            [agent]
            period = "1y"
            "#,
        )
        .unwrap();
        assert_eq!(config.indicators.sma_long, 100);
        assert_eq!(config.indicators.sma_short, 20);
        assert_eq!(config.agent.period, Lookback::Years(1));
        assert_eq!(config.agent.model, "o4-mini");
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let err = AppConfig::from_toml_str("[indicators]\nstoch_k = 0\n").unwrap_err();
        assert!(matches!(err, AgentError::Indicator(_)));

        let err = AppConfig::from_toml_str("[agent]\nperiod = \"6w\"\n").unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_defaults_round_trip() {
        let config = AppConfig::default();
        let raw = config.to_toml().unwrap();
        assert!(raw.contains("sma_short = 20"));
        assert_eq!(AppConfig::from_toml_str(&raw).unwrap(), config);
    }
}

use techscan_core::{DataError, IndicatorError};

/// Errors from running an analysis agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Reasoning service error: {0}")]
    Reasoning(String),
    #[error("Latest indicators undefined: {}", .0.join(", "))]
    IncompleteIndicators(Vec<String>),
    #[error("Config error: {0}")]
    Config(String),
}

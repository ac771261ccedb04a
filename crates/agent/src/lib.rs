pub mod agent;
pub mod config;
pub mod error;
pub mod prompt;
pub mod reasoning;
pub mod valuation;

pub use agent::{Agent, AgentReport, Findings, TechnicalAgent, Team, TECHNICAL_FALLBACK};
pub use config::{AgentSettings, AppConfig};
pub use error::AgentError;
pub use reasoning::{OpenAiResponses, ReasoningService};
pub use valuation::{ValuationAgent, VALUATION_FALLBACK};

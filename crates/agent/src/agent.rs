use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use techscan_core::{BarSource, Fundamentals, IndicatorEngine, IndicatorSnapshot, Lookback};
use techscan_indicators::{IndicatorConfig, StandardEngine};

use crate::error::AgentError;
use crate::prompt::{extract_recommendation, technical_prompt};
use crate::reasoning::ReasoningService;

/// Shown in place of an empty answer from the technical analysis.
pub const TECHNICAL_FALLBACK: &str = "No response from technical agent.";

/// The evidence an agent built its prompt from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Findings {
    Indicators {
        period: Lookback,
        snapshot: IndicatorSnapshot,
    },
    Fundamentals(Fundamentals),
}

/// What one agent produced for one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub agent: String,
    pub ticker: String,
    pub findings: Findings,
    pub prompt: String,
    /// The reasoning service's answer; `None` when the agent runs prompt-only.
    pub answer: Option<String>,
    /// The verdict picked out of the answer, from the choices the prompt offered.
    pub recommendation: Option<String>,
}

/// An independent analysis capability that can be run on a ticker.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ticker: &str) -> Result<AgentReport, AgentError>;
}

/// Ask `service` and substitute `fallback` for an empty answer.
pub(crate) async fn ask(
    service: &dyn ReasoningService,
    prompt: &str,
    fallback: &str,
) -> Result<String, AgentError> {
    let answer = service.complete(prompt).await?;
    if answer.trim().is_empty() {
        Ok(fallback.to_string())
    } else {
        Ok(answer)
    }
}

// ---------------------------------------------------------------------------
// Technical agent
// ---------------------------------------------------------------------------

/// Loads bars, computes the indicator bundle, and asks the reasoning
/// service about the latest values.
pub struct TechnicalAgent {
    source: Arc<dyn BarSource>,
    engine: Arc<dyn IndicatorEngine>,
    windows: IndicatorConfig,
    reasoning: Option<Arc<dyn ReasoningService>>,
    period: Lookback,
}

impl TechnicalAgent {
    pub fn new(source: Arc<dyn BarSource>, windows: IndicatorConfig) -> Self {
        Self {
            source,
            engine: Arc::new(StandardEngine::new(windows)),
            windows,
            reasoning: None,
            period: Lookback::default(),
        }
    }

    /// Swap in another engine. `windows` are still used for prompt labels.
    pub fn with_engine(mut self, engine: Arc<dyn IndicatorEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_reasoning(mut self, reasoning: Arc<dyn ReasoningService>) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_period(mut self, period: Lookback) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Lookback {
        self.period
    }
}

#[async_trait]
impl Agent for TechnicalAgent {
    fn name(&self) -> &str {
        "TechnicalAgent"
    }

    async fn run(&self, ticker: &str) -> Result<AgentReport, AgentError> {
        let history = self.source.load_bars(ticker, self.period).await?;
        let bundle = self.engine.compute(&history)?;
        let snapshot = bundle
            .latest()
            .ok_or_else(|| AgentError::IncompleteIndicators(vec!["close".to_string()]))?;

        tracing::info!(
            ticker = %history.ticker(),
            engine = self.engine.name(),
            bars = history.len(),
            date = %snapshot.date,
            "Computed indicators"
        );

        let prompt = technical_prompt(history.ticker(), self.period, &self.windows, &snapshot);

        let answer = match &self.reasoning {
            Some(service) => {
                let missing = snapshot.missing();
                if !missing.is_empty() {
                    return Err(AgentError::IncompleteIndicators(
                        missing.into_iter().map(String::from).collect(),
                    ));
                }
                tracing::info!(ticker = %history.ticker(), model = service.model(), "Requesting analysis");
                Some(ask(service.as_ref(), &prompt, TECHNICAL_FALLBACK).await?)
            }
            None => None,
        };
        let recommendation = answer
            .as_deref()
            .and_then(extract_recommendation)
            .map(String::from);

        Ok(AgentReport {
            agent: self.name().to_string(),
            ticker: history.ticker().to_string(),
            findings: Findings::Indicators {
                period: self.period,
                snapshot,
            },
            prompt,
            answer,
            recommendation,
        })
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Runs several agents on the same ticker, one after another.
#[derive(Default)]
pub struct Team {
    agents: Vec<Box<dyn Agent>>,
}

impl Team {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent: Box<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run every agent. A failing agent is logged and reported; it does not
    /// stop the others.
    pub async fn run(&self, ticker: &str) -> Vec<(String, Result<AgentReport, AgentError>)> {
        tracing::info!(ticker, agents = self.agents.len(), "Running agent team");
        let mut results = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let result = agent.run(ticker).await;
            if let Err(e) = &result {
                tracing::warn!(agent = agent.name(), ticker, error = %e, "Agent failed");
            }
            results.push((agent.name().to_string(), result));
        }
        results
    }
}

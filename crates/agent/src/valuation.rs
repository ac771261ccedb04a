use async_trait::async_trait;
use std::sync::Arc;
use techscan_core::FundamentalsSource;

use crate::agent::{ask, Agent, AgentReport, Findings};
use crate::error::AgentError;
use crate::prompt::{extract_valuation, valuation_prompt};
use crate::reasoning::ReasoningService;

/// Shown in place of an empty answer from the valuation analysis.
pub const VALUATION_FALLBACK: &str = "No response from valuation agent.";

/// Loads company fundamentals and asks whether the stock is under- or
/// overvalued.
pub struct ValuationAgent {
    source: Arc<dyn FundamentalsSource>,
    reasoning: Option<Arc<dyn ReasoningService>>,
}

impl ValuationAgent {
    pub fn new(source: Arc<dyn FundamentalsSource>) -> Self {
        Self {
            source,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: Arc<dyn ReasoningService>) -> Self {
        self.reasoning = Some(reasoning);
        self
    }
}

#[async_trait]
impl Agent for ValuationAgent {
    fn name(&self) -> &str {
        "ValuationAgent"
    }

    async fn run(&self, ticker: &str) -> Result<AgentReport, AgentError> {
        let fundamentals = self.source.load_fundamentals(ticker).await?;
        let prompt = valuation_prompt(&fundamentals);

        let answer = match &self.reasoning {
            Some(service) => {
                tracing::info!(
                    ticker = %fundamentals.ticker,
                    model = service.model(),
                    known = fundamentals.known_count(),
                    "Requesting valuation"
                );
                Some(ask(service.as_ref(), &prompt, VALUATION_FALLBACK).await?)
            }
            None => None,
        };
        let recommendation = answer
            .as_deref()
            .and_then(extract_valuation)
            .map(String::from);

        Ok(AgentReport {
            agent: self.name().to_string(),
            ticker: fundamentals.ticker.clone(),
            findings: Findings::Fundamentals(fundamentals),
            prompt,
            answer,
            recommendation,
        })
    }
}

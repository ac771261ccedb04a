use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AgentSettings;
use crate::error::AgentError;

/// A text-in, text-out reasoning service.
///
/// An empty answer is returned as an empty string; callers decide what to
/// show in its place.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Model or backend identifier, for logs.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}

// ---------------------------------------------------------------------------
// OpenAI Responses API
// ---------------------------------------------------------------------------

/// Client for the OpenAI Responses API (`POST {base_url}/responses`).
pub struct OpenAiResponses {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    effort: String,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    reasoning: Reasoning<'a>,
    input: Vec<InputMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsesReply {
    output_text: Option<String>,
    output: Vec<OutputItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl ResponsesReply {
    /// `output_text` when present, else the concatenated text parts of all
    /// message items.
    fn text(&self) -> String {
        if let Some(text) = &self.output_text {
            return text.clone();
        }
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| &item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

impl OpenAiResponses {
    pub fn new(api_key: impl Into<String>, settings: &AgentSettings) -> Result<Self, AgentError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::Config("OpenAI API key is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            effort: settings.reasoning_effort.clone(),
        })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ResponsesRequest<'a> {
        ResponsesRequest {
            model: &self.model,
            reasoning: Reasoning {
                effort: &self.effort,
            },
            input: vec![InputMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[async_trait]
impl ReasoningService for OpenAiResponses {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let url = format!("{}/responses", self.base_url);
        tracing::debug!(model = %self.model, url = %url, "Sending prompt");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Reasoning(format!("{}: {}", status, body)));
        }

        let reply: ResponsesReply = response.json().await?;
        let text = reply.text().trim().to_string();
        if text.is_empty() {
            tracing::warn!(model = %self.model, "Reasoning service returned no text");
        }
        Ok(text)
    }
}

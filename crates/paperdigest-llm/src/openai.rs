//! OpenAI-compatible chat-completions provider.
//!
//! Works against the standard OpenAI API and any compatible endpoint
//! (OpenRouter, self-hosted gateways) via `OPENAI_BASE_URL`.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::json;

use crate::{LlmError, LlmProvider, SummaryResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str =
    "You are a research assistant who analyzes and summarizes academic papers.";

#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Build a provider from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and
    /// `OPENAI_MODEL`. A missing key makes the provider unavailable rather
    /// than failing here; availability is checked at summarizer startup.
    pub fn from_env(temperature: f32, max_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature,
            max_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn summarize<'a>(
        &'a self,
        title: &'a str,
        abstract_text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SummaryResult, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or_else(|| {
                LlmError::Unavailable("OPENAI_API_KEY is not set".to_string())
            })?;

            let body = json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": build_prompt(title, abstract_text)},
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
                "response_format": {"type": "json_object"},
            });

            let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
            tracing::debug!(model = %self.model, %url, "requesting summary");

            let resp = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(LlmError::Api {
                    provider: "openai".to_string(),
                    message: format!("HTTP {}", resp.status()),
                });
            }

            let parsed: ChatResponse = resp.json().await?;
            let content = parsed
                .choices
                .first()
                .and_then(|c| c.message.content.as_deref())
                .ok_or_else(|| LlmError::Api {
                    provider: "openai".to_string(),
                    message: "response contained no message content".to_string(),
                })?;

            parse_summary(content)
        })
    }
}

fn build_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        r#"Summarize the following academic paper.

Title: {title}
Abstract: {abstract_text}

Respond with JSON in exactly this shape:
{{
    "summary": "one-sentence summary of the core contribution",
    "background": "research background, two sentences at most",
    "method": "core method, two sentences at most",
    "results": "main results, two sentences at most"
}}

Output only the JSON object, nothing else."#
    )
}

/// Parse the JSON object the model was instructed to return.
/// Missing fields degrade to empty strings; malformed JSON is an error.
fn parse_summary(content: &str) -> Result<SummaryResult, LlmError> {
    #[derive(Deserialize)]
    struct Fields {
        #[serde(default)]
        summary: String,
        #[serde(default)]
        background: String,
        #[serde(default)]
        method: String,
        #[serde(default)]
        results: String,
    }

    let fields: Fields =
        serde_json::from_str(content).map_err(|e| LlmError::Parse(e.to_string()))?;

    Ok(SummaryResult {
        summary: fields.summary,
        background: fields.background,
        method: fields.method,
        results: fields.results,
        relevance_score: None,
    })
}

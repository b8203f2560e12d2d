//! LLM provider trait and implementations for paper summarization.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Structured summary produced by a provider for one paper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    /// One-sentence summary of the core contribution.
    pub summary: String,
    pub background: String,
    pub method: String,
    pub results: String,
    /// Relevance score 1-10. Not populated by the current providers.
    pub relevance_score: Option<f32>,
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },
    #[error("failed to parse summary response: {0}")]
    Parse(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("unknown LLM provider '{0}'")]
    UnknownProvider(String),
}

/// A language-model backend that can summarize papers.
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// The canonical name of this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Whether the provider is configured and usable. Callers check this
    /// once at startup; `summarize` on an unavailable provider is an error.
    fn is_available(&self) -> bool;

    /// Summarize a paper from its title and abstract.
    fn summarize<'a>(
        &'a self,
        title: &'a str,
        abstract_text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SummaryResult, LlmError>> + Send + 'a>>;
}

/// Resolve a provider by its configured name.
pub fn provider_for(
    name: &str,
    temperature: f32,
    max_tokens: u32,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match name {
        "openai" => Ok(Box::new(OpenAiProvider::from_env(temperature, max_tokens))),
        "gemini" => Ok(Box::new(GeminiProvider::from_env())),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_for_rejects_unknown_name() {
        let err = provider_for("claude", 0.3, 1000).unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(ref n) if n == "claude"));
    }

    #[test]
    fn provider_for_resolves_known_names() {
        assert_eq!(provider_for("openai", 0.3, 1000).unwrap().name(), "openai");
        assert_eq!(provider_for("gemini", 0.3, 1000).unwrap().name(), "gemini");
    }
}

//! Google Gemini provider.
//!
//! Declared capability only: the provider can be selected and reports
//! availability from `GEMINI_API_KEY`, but summarization is not wired up.

use std::future::Future;
use std::pin::Pin;

use crate::{LlmError, LlmProvider, SummaryResult};

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn summarize<'a>(
        &'a self,
        _title: &'a str,
        _abstract_text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SummaryResult, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            Err(LlmError::Unavailable(
                "the gemini provider is not implemented; set llm.provider = \"openai\""
                    .to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn summarize_reports_unavailable() {
        let provider = GeminiProvider { api_key: None };
        let err = provider.summarize("t", "a").await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }
}

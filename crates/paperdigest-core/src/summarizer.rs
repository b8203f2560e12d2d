//! Fetch-and-summarize orchestration.

use paperdigest_llm::LlmProvider;
use thiserror::Error;

use crate::DigestPaper;
use crate::fetch::HtmlFetcher;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("LLM provider '{0}' is not available; check its API key configuration")]
    ProviderUnavailable(String),
}

/// Pairs the page fetcher with an LLM provider and processes URL batches.
pub struct Summarizer {
    fetcher: HtmlFetcher,
    provider: Box<dyn LlmProvider>,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer").finish_non_exhaustive()
    }
}

impl Summarizer {
    /// Fails when the provider is missing its configuration, so the
    /// problem surfaces before any mail or network work happens.
    pub fn new(
        fetcher: HtmlFetcher,
        provider: Box<dyn LlmProvider>,
    ) -> Result<Self, SummarizerError> {
        if !provider.is_available() {
            return Err(SummarizerError::ProviderUnavailable(
                provider.name().to_string(),
            ));
        }
        Ok(Self { fetcher, provider })
    }

    /// Fetch one paper and summarize it. Failures are logged and folded to
    /// `None`; one bad paper never aborts the batch.
    pub async fn process_url(&self, url: &str) -> Option<DigestPaper> {
        tracing::info!(%url, "processing paper");

        let info = match self.fetcher.fetch(url).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(%url, error = %e, "failed to fetch paper");
                return None;
            }
        };

        let summary = match self
            .provider
            .summarize(&info.title, &info.abstract_text)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(%url, error = %e, "failed to summarize paper");
                return None;
            }
        };

        Some(DigestPaper { info, summary })
    }

    /// Process a batch sequentially. `progress` is invoked before each
    /// paper with (index, total, url); the CLI uses it to drive its bar.
    pub async fn process_urls(
        &self,
        urls: &[String],
        mut progress: impl FnMut(usize, usize, &str),
    ) -> Vec<DigestPaper> {
        let mut papers = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            progress(i, urls.len(), url);
            if let Some(paper) = self.process_url(url).await {
                papers.push(paper);
            }
        }
        tracing::info!(
            processed = papers.len(),
            total = urls.len(),
            "finished paper batch"
        );
        papers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigFile;
    use crate::config_file::Settings;
    use paperdigest_llm::{LlmError, SummaryResult};
    use std::future::Future;
    use std::pin::Pin;

    #[derive(Debug)]
    struct StubProvider {
        available: bool,
    }

    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn summarize<'a>(
            &'a self,
            _title: &'a str,
            _abstract_text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<SummaryResult, LlmError>> + Send + 'a>> {
            Box::pin(async { Ok(SummaryResult::default()) })
        }
    }

    fn fetcher() -> HtmlFetcher {
        HtmlFetcher::new(&Settings::resolve(ConfigFile::default()).unwrap().fetcher)
    }

    #[test]
    fn construction_fails_for_unavailable_provider() {
        let err = Summarizer::new(fetcher(), Box::new(StubProvider { available: false }))
            .unwrap_err();
        assert!(matches!(err, SummarizerError::ProviderUnavailable(ref n) if n == "stub"));
    }

    #[test]
    fn construction_succeeds_for_available_provider() {
        assert!(Summarizer::new(fetcher(), Box::new(StubProvider { available: true })).is_ok());
    }

    #[tokio::test]
    async fn unsupported_url_is_skipped_not_fatal() {
        let summarizer =
            Summarizer::new(fetcher(), Box::new(StubProvider { available: true })).unwrap();
        let urls = vec!["https://example.com/not-a-paper".to_string()];
        let papers = summarizer.process_urls(&urls, |_, _, _| {}).await;
        assert!(papers.is_empty());
    }
}

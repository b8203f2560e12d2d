//! Core pipeline for the weekly paper digest: link extraction from alert
//! mail, URL normalization, paper-page fetching, and LLM summarization.

pub mod config_file;
pub mod fetch;
pub mod link_extract;
pub mod link_filter;
pub mod summarizer;
pub mod url_processors;

// Re-export for convenience
pub use config_file::{ConfigFile, Settings};
pub use fetch::{FetchError, FetcherKind, HtmlFetcher, build_fetcher};
pub use link_extract::{LinkExtractor, extract_paper_links, unique_paper_links};
pub use link_filter::PaperLinkFilter;
pub use summarizer::{Summarizer, SummarizerError};
pub use url_processors::{ProcessorChain, UrlProcessor, process_url};

/// Metadata scraped from a paper page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    /// The (normalized) URL the metadata was fetched from.
    pub url: String,
    pub year: String,
    pub venue: String,
}

/// One digest entry: scraped metadata plus its LLM summary.
#[derive(Debug, Clone)]
pub struct DigestPaper {
    pub info: PaperInfo,
    pub summary: paperdigest_llm::SummaryResult,
}

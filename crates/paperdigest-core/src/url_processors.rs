//! URL normalization for paper links.
//!
//! Unwraps Google Scholar redirect links and rewrites arXiv document URLs
//! to the canonical abstract page, so that different raw forms of the same
//! paper compare equal downstream.

use once_cell::sync::Lazy;
use regex::Regex;

/// New-style arXiv identifier: 4 digits, a dot, 4-5 digits. A trailing
/// version suffix (`v2`) falls outside the capture and is discarded.
static ARXIV_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4}\.\d{4,5})").unwrap());

/// A single URL rewrite rule. The set is closed; chains are built from
/// these variants at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlProcessor {
    /// Extract the destination of a `scholar.google.com/scholar_url` redirect.
    ScholarRedirect,
    /// Rewrite any arXiv URL to `https://arxiv.org/abs/<id>`.
    ArxivCanonical,
}

impl UrlProcessor {
    /// Whether this rule applies to the given URL.
    pub fn applies(&self, url: &str) -> bool {
        match self {
            UrlProcessor::ScholarRedirect => url.contains("scholar.google.com/scholar_url"),
            UrlProcessor::ArxivCanonical => url.to_lowercase().contains("arxiv.org"),
        }
    }

    /// Rewrite the URL. Always falls back to the input on failure.
    pub fn transform(&self, url: &str) -> String {
        match self {
            UrlProcessor::ScholarRedirect => unwrap_scholar_redirect(url),
            UrlProcessor::ArxivCanonical => canonicalize_arxiv(url),
        }
    }
}

fn unwrap_scholar_redirect(url: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, %url, "failed to parse scholar redirect URL");
            return url.to_string();
        }
    };

    // query_pairs percent-decodes the destination for us.
    match parsed.query_pairs().find(|(key, _)| key == "url") {
        Some((_, dest)) => {
            let dest = dest.into_owned();
            tracing::debug!(%dest, "unwrapped scholar redirect");
            dest
        }
        None => url.to_string(),
    }
}

fn canonicalize_arxiv(url: &str) -> String {
    let Some(caps) = ARXIV_ID_RE.captures(url) else {
        // Legacy identifiers (e.g. cs/0112001) don't match; left as-is.
        tracing::debug!(%url, "no arXiv id found in URL");
        return url.to_string();
    };
    let abs_url = format!("https://arxiv.org/abs/{}", &caps[1]);
    if url.contains("/pdf/") {
        tracing::debug!(from = %url, to = %abs_url, "rewrote arXiv pdf link to abstract");
    }
    abs_url
}

/// An ordered list of processors, each applied conditionally.
///
/// Every processor sees the output of the ones before it, so a redirect can
/// be unwrapped and the destination canonicalized in one pass. A processor
/// that fails internally degrades to passing the URL through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProcessorChain {
    processors: Vec<UrlProcessor>,
}

impl ProcessorChain {
    pub fn new(processors: Vec<UrlProcessor>) -> Self {
        Self { processors }
    }

    /// The chain used everywhere: unwrap redirects, then canonicalize.
    /// The order is load-bearing.
    pub fn default_chain() -> Self {
        Self::new(vec![
            UrlProcessor::ScholarRedirect,
            UrlProcessor::ArxivCanonical,
        ])
    }

    /// Append a processor to the end of the chain.
    pub fn push(&mut self, processor: UrlProcessor) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Run the URL through the chain.
    pub fn process(&self, url: &str) -> String {
        let mut current = url.to_string();
        for processor in &self.processors {
            if processor.applies(&current) {
                current = processor.transform(&current);
            }
        }
        current
    }
}

static DEFAULT_CHAIN: Lazy<ProcessorChain> = Lazy::new(ProcessorChain::default_chain);

/// Normalize one paper URL through the default chain.
pub fn process_url(url: &str) -> String {
    DEFAULT_CHAIN.process(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scholar_redirect_applies_only_to_redirect_urls() {
        let p = UrlProcessor::ScholarRedirect;
        assert!(p.applies("https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/1234"));
        assert!(p.applies("https://scholar.google.com/scholar_url?hl=en&url=https://example.com"));
        assert!(!p.applies("https://arxiv.org/abs/1234"));
        assert!(!p.applies("https://example.com"));
    }

    #[test]
    fn scholar_redirect_extracts_url_parameter() {
        let p = UrlProcessor::ScholarRedirect;
        let url = "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345";
        assert_eq!(p.transform(url), "https://arxiv.org/pdf/2401.12345");
    }

    #[test]
    fn scholar_redirect_handles_extra_parameters() {
        let p = UrlProcessor::ScholarRedirect;
        let url = "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2602.09302&hl=en&sa=X&d=14589868630261160684";
        assert_eq!(p.transform(url), "https://arxiv.org/pdf/2602.09302");
    }

    #[test]
    fn scholar_redirect_percent_decodes_destination() {
        let p = UrlProcessor::ScholarRedirect;
        let url = "https://scholar.google.com/scholar_url?url=https%3A%2F%2Farxiv.org%2Fpdf%2F2401.12345";
        assert_eq!(p.transform(url), "https://arxiv.org/pdf/2401.12345");
    }

    #[test]
    fn scholar_redirect_without_url_parameter_is_passthrough() {
        let p = UrlProcessor::ScholarRedirect;
        let url = "https://scholar.google.com/scholar_url?hl=en";
        assert_eq!(p.transform(url), url);
    }

    #[test]
    fn arxiv_applies_case_insensitively() {
        let p = UrlProcessor::ArxivCanonical;
        assert!(p.applies("https://arxiv.org/abs/2401.12345"));
        assert!(p.applies("https://ArXiv.org/pdf/2401.12345.pdf"));
        assert!(!p.applies("https://scholar.google.com/scholar_url?url=x"));
        assert!(!p.applies("https://ieee.org/document/12345"));
    }

    #[test]
    fn arxiv_rewrites_pdf_to_abstract() {
        let p = UrlProcessor::ArxivCanonical;
        assert_eq!(
            p.transform("https://arxiv.org/pdf/2401.12345.pdf"),
            "https://arxiv.org/abs/2401.12345"
        );
        assert_eq!(
            p.transform("https://arxiv.org/pdf/2401.12345"),
            "https://arxiv.org/abs/2401.12345"
        );
    }

    #[test]
    fn arxiv_abstract_is_unchanged() {
        let p = UrlProcessor::ArxivCanonical;
        assert_eq!(
            p.transform("https://arxiv.org/abs/2401.12345"),
            "https://arxiv.org/abs/2401.12345"
        );
    }

    #[test]
    fn arxiv_version_suffix_is_stripped() {
        let p = UrlProcessor::ArxivCanonical;
        assert_eq!(
            p.transform("https://arxiv.org/pdf/2401.12345v2.pdf"),
            "https://arxiv.org/abs/2401.12345"
        );
    }

    #[test]
    fn arxiv_legacy_id_is_passthrough() {
        let p = UrlProcessor::ArxivCanonical;
        let url = "https://arxiv.org/pdf/cs/0112001";
        assert_eq!(p.transform(url), url);
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = ProcessorChain::default();
        assert_eq!(chain.process("https://example.com"), "https://example.com");
    }

    #[test]
    fn single_processor_chain() {
        let chain = ProcessorChain::new(vec![UrlProcessor::ScholarRedirect]);
        let url = "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345";
        assert_eq!(chain.process(url), "https://arxiv.org/pdf/2401.12345");
    }

    #[test]
    fn chain_composes_redirect_then_canonical() {
        // The second processor must see the unwrapped destination.
        let chain = ProcessorChain::default_chain();
        let url = "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345";
        assert_eq!(chain.process(url), "https://arxiv.org/abs/2401.12345");
    }

    #[test]
    fn chain_push_builds_the_same_chain() {
        let mut chain = ProcessorChain::default();
        chain
            .push(UrlProcessor::ScholarRedirect)
            .push(UrlProcessor::ArxivCanonical);
        let url = "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345";
        assert_eq!(chain.process(url), "https://arxiv.org/abs/2401.12345");
    }

    #[test]
    fn process_url_full_composition() {
        let url =
            "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345.pdf";
        assert_eq!(process_url(url), "https://arxiv.org/abs/2401.12345");
    }

    #[test]
    fn process_url_noop_on_unrecognized_domain() {
        assert_eq!(process_url("https://example.com/x"), "https://example.com/x");
        assert_eq!(
            process_url("https://example.com/paper.pdf"),
            "https://example.com/paper.pdf"
        );
    }

    #[test]
    fn process_url_is_idempotent() {
        let urls = [
            "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345.pdf",
            "https://arxiv.org/pdf/2401.12345v2.pdf",
            "https://arxiv.org/abs/2401.12345",
            "https://arxiv.org/pdf/cs/0112001",
            "https://example.com/x",
        ];
        for url in urls {
            let once = process_url(url);
            assert_eq!(process_url(&once), once, "not idempotent for {url}");
        }
    }
}

//! Extraction of candidate paper links from free text.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::link_filter::PaperLinkFilter;
use crate::url_processors::process_url;

/// General URL shape: a scheme plus a body free of whitespace and brackets.
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

/// Punctuation that alert-mail text tends to glue onto the end of a link.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Finds URLs in text and keeps the ones every filter accepts.
pub struct LinkExtractor {
    filters: Vec<PaperLinkFilter>,
}

impl LinkExtractor {
    pub fn new(filters: Vec<PaperLinkFilter>) -> Self {
        Self { filters }
    }

    /// Find, clean, deduplicate, and filter links in a block of text.
    ///
    /// Duplicates are dropped on exact string match and first-seen order is
    /// preserved, so callers can rely on stable ordering. A URL survives
    /// only if every filter keeps it.
    pub fn extract_links(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        let mut found = 0usize;

        for m in URL_RE.find_iter(text) {
            found += 1;
            let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if url.is_empty() || !seen.insert(url.to_string()) {
                continue;
            }
            if self.filters.iter().all(|f| f.should_keep(url)) {
                kept.push(url.to_string());
            } else {
                tracing::debug!(%url, "link filtered out");
            }
        }

        tracing::info!(found, kept = kept.len(), "extracted links from text");
        kept
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(vec![PaperLinkFilter::new()])
    }
}

static DEFAULT_EXTRACTOR: Lazy<LinkExtractor> = Lazy::new(LinkExtractor::default);

/// Extract paper links from text with the default filter set.
pub fn extract_paper_links(text: &str) -> Vec<String> {
    DEFAULT_EXTRACTOR.extract_links(text)
}

/// Collapse per-email link lists into one ordered, deduplicated list.
///
/// Each link is normalized through the default processor chain FIRST so
/// that different raw forms of the same paper (redirect-wrapped, direct
/// PDF) collapse to a single canonical entry. First appearance wins.
pub fn unique_paper_links(per_email_links: &[Vec<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for links in per_email_links {
        for link in links {
            let processed = process_url(link);
            if seen.insert(processed.clone()) {
                unique.push(processed);
            }
        }
    }

    unique
}

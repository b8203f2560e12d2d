//! Default-deny classification of URLs as paper links.

use regex::{Regex, RegexBuilder};

/// Markers of non-paper links: Scholar account actions, settings, citation
/// management, and search-result pages. Checked before the inclusion list;
/// any match rejects.
const NON_PAPER_PATTERNS: &[&str] = &[
    r"scholar\.google\.com/citations",
    r"update_op=",
    r"citsig=",
    r"info=",
    r"scholar\.google\.com/schol[?&]",
    r"scholar\.google\.com/scholar_settings",
    r"scholar\.google\.com/citations\?",
];

/// Markers a paper link must carry: the Scholar redirect wrapper, or an
/// arXiv abstract/document path.
const PAPER_INDICATORS: &[&str] = &[r"scholar_url", r"arxiv\.org/(abs|pdf)/"];

/// Classifies a URL as a paper link or not. Matching is case-insensitive
/// and exclusion always wins; a URL matching neither list is rejected.
pub struct PaperLinkFilter {
    exclude: Vec<Regex>,
    include: Vec<Regex>,
}

impl PaperLinkFilter {
    /// Filter with the built-in rule set.
    pub fn new() -> Self {
        Self::with_patterns(NON_PAPER_PATTERNS, PAPER_INDICATORS)
            .expect("built-in patterns compile")
    }

    /// Filter with custom pattern lists. An invalid pattern is a
    /// construction error, never a per-URL one.
    pub fn with_patterns(exclude: &[&str], include: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            exclude: compile_all(exclude)?,
            include: compile_all(include)?,
        })
    }

    /// Whether the URL should be kept as a paper link.
    pub fn should_keep(&self, url: &str) -> bool {
        for re in &self.exclude {
            if re.is_match(url) {
                tracing::debug!(%url, pattern = re.as_str(), "rejected non-paper link");
                return false;
            }
        }
        for re in &self.include {
            if re.is_match(url) {
                return true;
            }
        }
        tracing::debug!(%url, "rejected unrecognized link");
        false
    }
}

impl Default for PaperLinkFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, regex::Error> {
    patterns
        .iter()
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_scholar_redirect_links() {
        let filter = PaperLinkFilter::new();
        assert!(filter.should_keep(
            "https://scholar.google.com/scholar_url?url=https://arxiv.org/pdf/2401.12345"
        ));
    }

    #[test]
    fn keeps_arxiv_article_links() {
        let filter = PaperLinkFilter::new();
        assert!(filter.should_keep("https://arxiv.org/abs/2401.12345"));
        assert!(filter.should_keep("https://arxiv.org/pdf/2401.12345.pdf"));
    }

    #[test]
    fn rejects_citation_management_links() {
        let filter = PaperLinkFilter::new();
        assert!(!filter.should_keep("https://scholar.google.com/citations?user=abc123"));
        assert!(!filter.should_keep("https://scholar.google.com/scholar?update_op=email_library_add"));
    }

    #[test]
    fn rejects_settings_pages() {
        let filter = PaperLinkFilter::new();
        assert!(!filter.should_keep("https://scholar.google.com/scholar_settings?hl=en"));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        // Carries the scholar_url indicator but also a citsig marker.
        let filter = PaperLinkFilter::new();
        assert!(!filter.should_keep(
            "https://scholar.google.com/scholar_url?url=https://arxiv.org/abs/1&citsig=XYZ"
        ));
    }

    #[test]
    fn default_deny_for_unmatched_urls() {
        let filter = PaperLinkFilter::new();
        assert!(!filter.should_keep("https://example.com/paper.pdf"));
        assert!(!filter.should_keep("https://ieee.org/document/12345"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filter = PaperLinkFilter::new();
        assert!(filter.should_keep("https://ARXIV.ORG/ABS/2401.12345"));
        assert!(!filter.should_keep("https://scholar.google.com/CITATIONS?user=x"));
    }

    #[test]
    fn invalid_custom_pattern_fails_at_construction() {
        assert!(PaperLinkFilter::with_patterns(&["(unclosed"], &[]).is_err());
        assert!(PaperLinkFilter::with_patterns(&[], &["[bad"]).is_err());
    }

    #[test]
    fn custom_patterns_are_honored() {
        let filter = PaperLinkFilter::with_patterns(&[r"draft"], &[r"papers\.example\.org"])
            .unwrap();
        assert!(filter.should_keep("https://papers.example.org/p/42"));
        assert!(!filter.should_keep("https://papers.example.org/p/42?draft=1"));
        assert!(!filter.should_keep("https://other.example.org/p/42"));
    }
}

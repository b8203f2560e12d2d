//! Fetching and parsing of paper pages.
//!
//! Supports Google Scholar result pages and arXiv abstract pages. URLs are
//! run through the processor chain before fetching so document-view links
//! land on the abstract page.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::PaperInfo;
use crate::config_file::FetcherSettings;
use crate::url_processors::ProcessorChain;

/// Bracketed tags Scholar prepends to result titles ([PDF], [HTML], ...).
static BRACKET_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());

/// First 4-digit run in an arXiv dateline ("Submitted on 18 Jan 2024").
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out after {attempts} attempts: {url}")]
    TimedOut { url: String, attempts: u32 },
    #[error("failed to parse paper page: {0}")]
    Parse(String),
    #[error("the '{0}' fetcher backend is not available")]
    UnavailableBackend(&'static str),
    #[error("{0}")]
    Other(String),
}

/// Which fetcher backend to use. `Document` (an external document
/// converter) is a declared capability only and resolves to an error at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherKind {
    SimpleHtml,
    Document,
}

impl std::str::FromStr for FetcherKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple_html" => Ok(FetcherKind::SimpleHtml),
            "document" => Ok(FetcherKind::Document),
            _ => Err(()),
        }
    }
}

/// Resolve the configured backend once, at startup.
pub fn build_fetcher(settings: &FetcherSettings) -> Result<HtmlFetcher, FetchError> {
    match settings.kind {
        FetcherKind::SimpleHtml => Ok(HtmlFetcher::new(settings)),
        FetcherKind::Document => Err(FetchError::UnavailableBackend("document")),
    }
}

/// Scraper-based fetcher for Scholar and arXiv pages.
pub struct HtmlFetcher {
    client: reqwest::Client,
    timeout: Duration,
    retry_times: u32,
    user_agent: String,
    chain: ProcessorChain,
}

impl HtmlFetcher {
    pub fn new(settings: &FetcherSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(settings.timeout_secs),
            retry_times: settings.retry_times.max(1),
            user_agent: settings.user_agent.clone(),
            chain: ProcessorChain::default_chain(),
        }
    }

    /// Whether this fetcher can handle the URL at all.
    pub fn can_fetch(&self, url: &str) -> bool {
        url.contains("scholar.google.com") || url.contains("arxiv.org")
    }

    /// Fetch and parse one paper page.
    ///
    /// Timeouts are retried with a linearly growing sleep; any other
    /// transport or HTTP error fails immediately.
    pub async fn fetch(&self, url: &str) -> Result<PaperInfo, FetchError> {
        if !self.can_fetch(url) {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        let processed = self.chain.process(url);
        if processed != url {
            tracing::info!(from = %url, to = %processed, "URL normalized before fetch");
        }
        tracing::debug!(url = %processed, "fetching paper page");

        for attempt in 0..self.retry_times {
            let resp = match self
                .client
                .get(&processed)
                .header("User-Agent", &self.user_agent)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() => {
                    tracing::warn!(
                        url = %processed,
                        attempt = attempt + 1,
                        retries = self.retry_times,
                        "request timed out"
                    );
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt) + 1)).await;
                    continue;
                }
                Err(e) => return Err(FetchError::Http(e)),
            };

            let body = resp.error_for_status()?.text().await?;
            let page_url = processed.clone();
            // Parse in spawn_blocking to avoid !Send scraper types
            return tokio::task::spawn_blocking(move || parse_paper_page(&body, &page_url))
                .await
                .map_err(|e| FetchError::Other(e.to_string()))?;
        }

        Err(FetchError::TimedOut {
            url: processed,
            attempts: self.retry_times,
        })
    }
}

/// Route to the page parser for the URL's host. Pure; exercised directly
/// by tests.
fn parse_paper_page(html: &str, url: &str) -> Result<PaperInfo, FetchError> {
    if url.contains("scholar.google.com") {
        parse_scholar_page(html, url)
    } else if url.contains("arxiv.org") {
        parse_arxiv_page(html, url)
    } else {
        Err(FetchError::UnsupportedUrl(url.to_string()))
    }
}

fn select_first_text(document: &scraper::Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let selector = scraper::Selector::parse(sel).expect("selector parses");
        if let Some(el) = document.select(&selector).next() {
            let text: String = el.text().collect();
            let text = text.trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn parse_scholar_page(html: &str, url: &str) -> Result<PaperInfo, FetchError> {
    let document = scraper::Html::parse_document(html);

    let title = select_first_text(&document, &["h3.gs_rt", "#gsc_vcd_title", "h1"])
        .map(|t| BRACKET_TAG_RE.replace_all(&t, "").trim().to_string())
        .unwrap_or_default();

    // Author line looks like "A One, B Two - Venue, 2024 - host"; only the
    // part before the first dash holds names.
    let mut authors = Vec::new();
    if let Some(line) = select_first_text(&document, &[".gs_a", ".gsc_vcd_value"]) {
        if let Some((names, _)) = line.split_once(" - ") {
            authors = names
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
        }
    }

    let abstract_text =
        select_first_text(&document, &[".gs_rs", ".gsc_vcd_value div"]).unwrap_or_default();

    if title.is_empty() {
        return Err(FetchError::Parse(format!(
            "no title found in Scholar page: {url}"
        )));
    }

    Ok(PaperInfo {
        title,
        authors,
        abstract_text,
        url: url.to_string(),
        year: String::new(),
        venue: String::new(),
    })
}

fn parse_arxiv_page(html: &str, url: &str) -> Result<PaperInfo, FetchError> {
    let document = scraper::Html::parse_document(html);

    let title = select_first_text(&document, &["h1.title.mathjax"])
        .map(|t| t.trim_start_matches("Title:").trim().to_string())
        .unwrap_or_default();

    let author_sel = scraper::Selector::parse("div.authors a").expect("selector parses");
    let authors: Vec<String> = document
        .select(&author_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    let abstract_text = select_first_text(&document, &["blockquote.abstract.mathjax"])
        .map(|t| t.trim_start_matches("Abstract:").trim().to_string())
        .unwrap_or_default();

    let year = select_first_text(&document, &["div.dateline"])
        .and_then(|line| YEAR_RE.captures(&line).map(|c| c[1].to_string()))
        .unwrap_or_default();

    if title.is_empty() {
        return Err(FetchError::Parse(format!(
            "no title found in arXiv page: {url}"
        )));
    }

    Ok(PaperInfo {
        title,
        authors,
        abstract_text,
        url: url.to_string(),
        year,
        venue: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::Settings;

    fn settings() -> FetcherSettings {
        Settings::resolve(crate::ConfigFile::default()).unwrap().fetcher
    }

    #[test]
    fn can_fetch_known_hosts_only() {
        let fetcher = HtmlFetcher::new(&settings());
        assert!(fetcher.can_fetch("https://arxiv.org/abs/2401.12345"));
        assert!(fetcher.can_fetch("https://scholar.google.com/scholar_url?url=x"));
        assert!(!fetcher.can_fetch("https://example.com/paper.pdf"));
    }

    #[test]
    fn document_backend_is_unavailable() {
        let mut cfg = settings();
        cfg.kind = FetcherKind::Document;
        assert!(matches!(
            build_fetcher(&cfg),
            Err(FetchError::UnavailableBackend("document"))
        ));
    }

    #[test]
    fn simple_html_backend_builds() {
        assert!(build_fetcher(&settings()).is_ok());
    }

    const ARXIV_HTML: &str = r##"
        <html><body>
        <h1 class="title mathjax"><span class="descriptor">Title:</span>Sparse Attention at Scale</h1>
        <div class="authors"><a href="#">Ada Lovelace</a>, <a href="#">Alan Turing</a></div>
        <blockquote class="abstract mathjax"><span class="descriptor">Abstract:</span>
        We study sparse attention.
        </blockquote>
        <div class="dateline">(Submitted on 18 Jan 2024)</div>
        </body></html>"##;

    #[test]
    fn parses_arxiv_abstract_page() {
        let info = parse_arxiv_page(ARXIV_HTML, "https://arxiv.org/abs/2401.12345").unwrap();
        assert_eq!(info.title, "Sparse Attention at Scale");
        assert_eq!(info.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(info.abstract_text, "We study sparse attention.");
        assert_eq!(info.year, "2024");
        assert_eq!(info.url, "https://arxiv.org/abs/2401.12345");
    }

    #[test]
    fn arxiv_page_without_title_is_a_parse_error() {
        let err = parse_arxiv_page("<html><body></body></html>", "https://arxiv.org/abs/1")
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    const SCHOLAR_HTML: &str = r#"
        <html><body>
        <h3 class="gs_rt"><span>[PDF]</span> Neural Scaling Laws Revisited</h3>
        <div class="gs_a">J Smith, L Chen - NeurIPS, 2023 - arxiv.org</div>
        <div class="gs_rs">We revisit scaling laws for neural networks.</div>
        </body></html>"#;

    #[test]
    fn parses_scholar_result_page() {
        let info = parse_scholar_page(SCHOLAR_HTML, "https://scholar.google.com/x").unwrap();
        assert_eq!(info.title, "Neural Scaling Laws Revisited");
        assert_eq!(info.authors, vec!["J Smith", "L Chen"]);
        assert_eq!(info.abstract_text, "We revisit scaling laws for neural networks.");
    }

    #[test]
    fn routes_by_host() {
        assert!(parse_paper_page(ARXIV_HTML, "https://arxiv.org/abs/2401.12345").is_ok());
        assert!(matches!(
            parse_paper_page(ARXIV_HTML, "https://example.com/x"),
            Err(FetchError::UnsupportedUrl(_))
        ));
    }
}

//! Rendering of the weekly digest in Markdown or HTML.

use paperdigest_core::DigestPaper;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Html,
}

#[derive(Error, Debug)]
#[error("unknown report format '{0}' (expected \"markdown\" or \"html\")")]
pub struct UnknownFormat(String);

impl std::str::FromStr for ReportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Today's date as it appears in report titles and subjects.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Substitute `{date}` in the configured subject template.
pub fn subject(template: &str, date: &str) -> String {
    template.replace("{date}", date)
}

/// Render the digest for a set of papers.
pub fn render(
    papers: &[DigestPaper],
    format: ReportFormat,
    include_metadata: bool,
    date: &str,
) -> String {
    match format {
        ReportFormat::Markdown => render_markdown(papers, include_metadata, date),
        ReportFormat::Html => render_html(papers, include_metadata, date),
    }
}

pub fn render_markdown(papers: &[DigestPaper], include_metadata: bool, date: &str) -> String {
    if papers.is_empty() {
        return format!(
            "# Weekly paper digest - {date}\n\n\
             No new papers this week.\n\n\
             ---\n\n\
             *Generated automatically by paperdigest*\n"
        );
    }

    let mut lines = Vec::new();
    lines.push(format!("# Weekly paper digest - {date}"));
    lines.push(String::new());
    lines.push(format!("Processed **{}** papers this week", papers.len()));
    lines.push(String::new());
    lines.push("## Papers".to_string());
    lines.push(String::new());

    for (i, paper) in papers.iter().enumerate() {
        lines.push(format_paper_markdown(i + 1, paper, include_metadata));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_paper_markdown(index: usize, paper: &DigestPaper, include_metadata: bool) -> String {
    let info = &paper.info;
    let summary = &paper.summary;
    let mut lines = Vec::new();

    lines.push(format!("### {}. [{}]({})", index, info.title, info.url));
    lines.push(String::new());

    if !info.authors.is_empty() {
        lines.push(format!("**Authors**: {}", info.authors.join(", ")));
        lines.push(String::new());
    }

    if include_metadata {
        let mut meta = Vec::new();
        if !info.year.is_empty() {
            meta.push(format!("Year: {}", info.year));
        }
        if !info.venue.is_empty() {
            meta.push(format!("Venue: {}", info.venue));
        }
        if !meta.is_empty() {
            lines.push(format!("**{}**", meta.join(", ")));
            lines.push(String::new());
        }
    }

    for (label, value) in [
        ("Summary", &summary.summary),
        ("Background", &summary.background),
        ("Method", &summary.method),
        ("Results", &summary.results),
    ] {
        if !value.is_empty() {
            lines.push(format!("**{label}**: {value}"));
            lines.push(String::new());
        }
    }

    if let Some(score) = summary.relevance_score {
        lines.push(format!("**Relevance**: {score}/10"));
        lines.push(String::new());
    }

    // Drop the trailing blank; the caller inserts separators.
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

pub fn render_html(papers: &[DigestPaper], include_metadata: bool, date: &str) -> String {
    let mut parts = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "<meta charset=\"UTF-8\">".to_string(),
        format!("<title>Weekly paper digest - {}</title>", escape_html(date)),
        HTML_STYLES.to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("<h1>Weekly paper digest - {}</h1>", escape_html(date)),
    ];

    if papers.is_empty() {
        parts.push("<p class=\"summary\">No new papers this week.</p>".to_string());
        parts.push("<hr>".to_string());
        parts.push(
            "<p class=\"footer\">Generated automatically by paperdigest</p>".to_string(),
        );
    } else {
        parts.push(format!(
            "<p class=\"summary\">Processed <strong>{}</strong> papers this week</p>",
            papers.len()
        ));
        parts.push("<div class=\"papers\">".to_string());
        for (i, paper) in papers.iter().enumerate() {
            parts.push(format_paper_html(i + 1, paper, include_metadata));
        }
        parts.push("</div>".to_string());
    }

    parts.push("</body>".to_string());
    parts.push("</html>".to_string());
    parts.join("\n")
}

fn format_paper_html(index: usize, paper: &DigestPaper, include_metadata: bool) -> String {
    let info = &paper.info;
    let summary = &paper.summary;

    let mut parts = vec![
        "<div class=\"paper\">".to_string(),
        format!(
            "<h3>{}. <a href=\"{}\">{}</a></h3>",
            index,
            escape_html(&info.url),
            escape_html(&info.title)
        ),
    ];

    if !info.authors.is_empty() {
        parts.push(format!(
            "<p class=\"authors\"><strong>Authors:</strong> {}</p>",
            escape_html(&info.authors.join(", "))
        ));
    }

    if include_metadata {
        let mut meta = Vec::new();
        if !info.year.is_empty() {
            meta.push(format!("Year: {}", info.year));
        }
        if !info.venue.is_empty() {
            meta.push(format!("Venue: {}", info.venue));
        }
        if !meta.is_empty() {
            parts.push(format!(
                "<p class=\"meta\"><strong>{}</strong></p>",
                escape_html(&meta.join(", "))
            ));
        }
    }

    for (class, label, value) in [
        ("summary", "Summary", &summary.summary),
        ("background", "Background", &summary.background),
        ("method", "Method", &summary.method),
        ("results", "Results", &summary.results),
    ] {
        if !value.is_empty() {
            parts.push(format!(
                "<p class=\"{class}\"><strong>{label}:</strong> {}</p>",
                escape_html(value)
            ));
        }
    }

    if let Some(score) = summary.relevance_score {
        parts.push(format!(
            "<p class=\"score\"><strong>Relevance:</strong> {score}/10</p>"
        ));
    }

    parts.push("</div>".to_string());
    parts.join("\n")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const HTML_STYLES: &str = "<style>\n\
body {\n\
    font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, \"Helvetica Neue\", Arial, sans-serif;\n\
    line-height: 1.6;\n\
    max-width: 800px;\n\
    margin: 0 auto;\n\
    padding: 20px;\n\
    color: #333;\n\
}\n\
h1 {\n\
    color: #2c3e50;\n\
    border-bottom: 2px solid #3498db;\n\
    padding-bottom: 10px;\n\
}\n\
.paper {\n\
    background: #f8f9fa;\n\
    border-left: 4px solid #3498db;\n\
    padding: 15px;\n\
    margin: 20px 0;\n\
    border-radius: 4px;\n\
}\n\
.paper h3 { margin-top: 0; }\n\
.paper h3 a { color: #2980b9; text-decoration: none; }\n\
.paper h3 a:hover { text-decoration: underline; }\n\
.authors { color: #666; font-style: italic; }\n\
.meta { color: #888; font-size: 0.9em; }\n\
.score { color: #e74c3c; font-weight: bold; }\n\
.summary { font-size: 1.1em; margin: 20px 0; }\n\
.footer { color: #999; font-size: 0.9em; text-align: center; margin-top: 40px; }\n\
</style>";

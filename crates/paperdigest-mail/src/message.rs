//! Conversion of raw IMAP fetch results into [`MailMessage`]s.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::MailMessage;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Build a [`MailMessage`] from one FETCH response. Returns `None` when
/// the response is missing its UID or body; callers log and skip.
pub fn message_from_fetch(fetch: &imap::types::Fetch) -> Option<MailMessage> {
    let uid = fetch.uid?;
    let envelope = fetch.envelope();

    let subject = envelope
        .and_then(|e| e.subject.as_ref())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .unwrap_or_default();

    let sender = envelope
        .and_then(|e| e.from.as_ref())
        .and_then(|from| from.first())
        .map(|addr| {
            let mailbox = addr
                .mailbox
                .as_ref()
                .map(|m| String::from_utf8_lossy(m).into_owned())
                .unwrap_or_default();
            let host = addr
                .host
                .as_ref()
                .map(|h| String::from_utf8_lossy(h).into_owned())
                .unwrap_or_default();
            if host.is_empty() {
                mailbox
            } else {
                format!("{mailbox}@{host}")
            }
        })
        .unwrap_or_default();

    let raw = fetch.text()?;
    let body = extract_text(&String::from_utf8_lossy(raw));

    Some(MailMessage {
        uid,
        subject,
        sender,
        body,
    })
}

/// Best-effort extraction of readable text from a fetched message body.
///
/// Undoes quoted-printable encoding, strips HTML tags to whitespace, and
/// decodes the handful of entities that would otherwise corrupt embedded
/// URLs. Link extraction downstream only needs the URLs to survive intact.
pub fn extract_text(raw: &str) -> String {
    let decoded = decode_quoted_printable(raw);
    let stripped = TAG_RE.replace_all(&decoded, " ");
    decode_entities(&stripped)
}

/// Decode quoted-printable soft line breaks and `=XX` escapes. Invalid
/// escapes are kept verbatim.
fn decode_quoted_printable(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '=' {
            out.push(c);
            continue;
        }
        let rest = &input[i + 1..];
        // Soft line break: '=' at end of line continues the next line.
        if let Some(stripped) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix("\n")) {
            let skip = rest.len() - stripped.len();
            for _ in 0..skip {
                chars.next();
            }
            continue;
        }
        let hex: String = rest.chars().take(2).collect();
        if hex.len() == 2
            && let Ok(byte) = u8::from_str_radix(&hex, 16)
        {
            out.push(byte as char);
            chars.next();
            chars.next();
        } else {
            out.push('=');
        }
    }

    out
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_tags_to_whitespace() {
        let html = "<div><a href=\"https://arxiv.org/abs/2401.12345\">Paper</a></div>";
        let text = extract_text(html);
        assert!(text.contains("Paper"));
        assert!(!text.contains("<a"));
        assert!(!text.contains("</div>"));
    }

    #[test]
    fn decodes_quoted_printable_escapes() {
        assert_eq!(decode_quoted_printable("a=3Db"), "a=b");
        assert_eq!(decode_quoted_printable("caf=C3=A9"), "caf\u{c3}\u{a9}");
    }

    #[test]
    fn decodes_soft_line_breaks() {
        assert_eq!(
            decode_quoted_printable("https://arxiv.org/abs/24=\r\n01.12345"),
            "https://arxiv.org/abs/2401.12345"
        );
        assert_eq!(decode_quoted_printable("a=\nb"), "ab");
    }

    #[test]
    fn invalid_escape_is_kept() {
        assert_eq!(decode_quoted_printable("100=zz"), "100=zz");
        assert_eq!(decode_quoted_printable("100="), "100=");
    }

    #[test]
    fn entity_decode_repairs_query_separators() {
        let html = "<a href=\"https://scholar.google.com/scholar_url?url=x&amp;hl=en\">x</a>";
        let text = extract_text(html);
        assert!(text.contains("url=x&hl=en"));
    }
}

//! IMAP session handling and SMTP submission.

use std::net::TcpStream;

use chrono::{Local, NaiveDate};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use native_tls::{TlsConnector, TlsStream};

use crate::message::message_from_fetch;
use crate::{MailConfig, MailError, MailMessage};

type ImapSession = imap::Session<TlsStream<TcpStream>>;

pub struct MailClient {
    config: MailConfig,
}

impl MailClient {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<ImapSession, MailError> {
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect(
            (self.config.imap_host.as_str(), self.config.imap_port),
            &self.config.imap_host,
            &tls,
        )?;
        client
            .login(&self.config.username, &self.config.password)
            .map_err(|(e, _)| MailError::Imap(e))
    }

    /// Fetch messages from `folder`: unread (unless `unread_only` is off),
    /// received within the last `days_back` days, newest `max_emails` of
    /// them. Messages that fail to parse are logged and skipped.
    pub fn fetch_messages(
        &self,
        folder: &str,
        unread_only: bool,
        max_emails: usize,
        days_back: u32,
    ) -> Result<Vec<MailMessage>, MailError> {
        let mut session = self.connect()?;
        session.select(folder)?;

        let query = search_query(unread_only, days_back, Local::now().date_naive());
        tracing::debug!(%folder, %query, "searching mailbox");

        let mut uids: Vec<u32> = session.uid_search(&query)?.into_iter().collect();
        uids.sort_unstable_by(|a, b| b.cmp(a));
        uids.truncate(max_emails);

        if uids.is_empty() {
            let _ = session.logout();
            return Ok(Vec::new());
        }

        let sequence_set = uids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fetches = session.uid_fetch(&sequence_set, "(UID ENVELOPE BODY.PEEK[TEXT])")?;

        let mut messages = Vec::new();
        for fetch in fetches.iter() {
            match message_from_fetch(fetch) {
                Some(msg) => messages.push(msg),
                None => tracing::warn!("skipping message with missing UID or body"),
            }
        }
        let _ = session.logout();

        tracing::info!(
            count = messages.len(),
            %folder,
            days_back,
            "fetched alert messages"
        );
        Ok(messages)
    }

    /// Mark messages seen. Individual failures are logged; the batch
    /// continues.
    pub fn mark_as_read(&self, folder: &str, uids: &[u32]) -> Result<(), MailError> {
        if uids.is_empty() {
            return Ok(());
        }
        let mut session = self.connect()?;
        session.select(folder)?;
        for uid in uids {
            match session.uid_store(uid.to_string(), "+FLAGS (\\Seen)") {
                Ok(_) => tracing::debug!(uid, "marked message read"),
                Err(e) => tracing::error!(uid, error = %e, "failed to mark message read"),
            }
        }
        let _ = session.logout();
        Ok(())
    }

    /// Send the digest over SMTP submission (STARTTLS).
    pub fn send(&self, to: &str, subject: &str, body: String, html: bool) -> Result<(), MailError> {
        let content_type = if html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        let message = Message::builder()
            .from(self.config.username.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(content_type)
            .body(body)?;

        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );
        let mailer = SmtpTransport::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        let response = mailer.send(&message)?;
        tracing::info!(%to, code = %response.code(), "digest sent");
        Ok(())
    }
}

/// Build the IMAP SEARCH query for the configured window.
fn search_query(unread_only: bool, days_back: u32, today: NaiveDate) -> String {
    let base = if unread_only { "UNSEEN" } else { "ALL" };
    if days_back == 0 {
        return base.to_string();
    }
    let since = today - chrono::Days::new(u64::from(days_back));
    format!("{} SINCE {}", base, format_imap_date(since))
}

/// IMAP date-text: dd-Mon-yyyy.
fn format_imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn imap_date_format() {
        assert_eq!(format_imap_date(date(2026, 8, 6)), "06-Aug-2026");
        assert_eq!(format_imap_date(date(2026, 1, 15)), "15-Jan-2026");
    }

    #[test]
    fn search_query_with_window() {
        assert_eq!(
            search_query(true, 7, date(2026, 8, 8)),
            "UNSEEN SINCE 01-Aug-2026"
        );
    }

    #[test]
    fn search_query_without_window() {
        assert_eq!(search_query(true, 0, date(2026, 8, 8)), "UNSEEN");
        assert_eq!(search_query(false, 0, date(2026, 8, 8)), "ALL");
    }

    #[test]
    fn search_query_all_with_window() {
        assert_eq!(
            search_query(false, 1, date(2026, 3, 1)),
            "ALL SINCE 28-Feb-2026"
        );
    }
}

//! Blocking IMAP/SMTP mail access for the digest pipeline.
//!
//! Reads alert messages from a folder over IMAP-TLS and sends the finished
//! report over SMTP submission. Callers on an async runtime should wrap
//! these operations in `spawn_blocking`.

use thiserror::Error;

pub mod client;
pub mod message;

pub use client::MailClient;
pub use message::extract_text;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("IMAP error: {0}")]
    Imap(#[from] imap::error::Error),
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// One fetched alert message, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub uid: u32,
    pub subject: String,
    pub sender: String,
    /// Decoded body text with HTML tags stripped.
    pub body: String,
}

/// Mailbox endpoints and credentials, all environment-sourced.
#[derive(Clone)]
pub struct MailConfig {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl MailConfig {
    /// Read endpoints and credentials from the environment. Hosts default
    /// to Gmail's; username and password are required (use an app
    /// password for Gmail).
    pub fn from_env() -> Result<Self, MailError> {
        Ok(Self {
            imap_host: std::env::var("IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".to_string()),
            imap_port: env_port("IMAP_PORT", 993),
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env_port("SMTP_PORT", 587),
            username: std::env::var("MAIL_USERNAME")
                .map_err(|_| MailError::MissingEnv("MAIL_USERNAME"))?,
            password: std::env::var("MAIL_PASSWORD")
                .map_err(|_| MailError::MissingEnv("MAIL_PASSWORD"))?,
        })
    }
}

fn env_port(name: &str, default: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

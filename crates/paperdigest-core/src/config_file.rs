//! On-disk TOML configuration and its resolution into runtime settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetcherKind;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub mail: Option<MailSection>,
    pub fetcher: Option<FetcherSection>,
    pub llm: Option<LlmSection>,
    pub report: Option<ReportSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailSection {
    pub folder: Option<String>,
    pub unread_only: Option<bool>,
    pub mark_as_read: Option<bool>,
    pub max_emails: Option<usize>,
    pub days_back: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetcherSection {
    pub kind: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_times: Option<u32>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    pub provider: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSection {
    pub format: Option<String>,
    pub subject_template: Option<String>,
    pub include_metadata: Option<bool>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown fetcher kind '{0}' (expected \"simple_html\" or \"document\")")]
    UnknownFetcherKind(String),
}

/// Platform config directory path: `<config_dir>/paperdigest/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperdigest").join("config.toml"))
}

/// Load config by cascading CWD `.paperdigest.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".paperdigest.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        mail: Some(MailSection {
            folder: overlay
                .mail
                .as_ref()
                .and_then(|m| m.folder.clone())
                .or_else(|| base.mail.as_ref().and_then(|m| m.folder.clone())),
            unread_only: overlay
                .mail
                .as_ref()
                .and_then(|m| m.unread_only)
                .or_else(|| base.mail.as_ref().and_then(|m| m.unread_only)),
            mark_as_read: overlay
                .mail
                .as_ref()
                .and_then(|m| m.mark_as_read)
                .or_else(|| base.mail.as_ref().and_then(|m| m.mark_as_read)),
            max_emails: overlay
                .mail
                .as_ref()
                .and_then(|m| m.max_emails)
                .or_else(|| base.mail.as_ref().and_then(|m| m.max_emails)),
            days_back: overlay
                .mail
                .as_ref()
                .and_then(|m| m.days_back)
                .or_else(|| base.mail.as_ref().and_then(|m| m.days_back)),
        }),
        fetcher: Some(FetcherSection {
            kind: overlay
                .fetcher
                .as_ref()
                .and_then(|f| f.kind.clone())
                .or_else(|| base.fetcher.as_ref().and_then(|f| f.kind.clone())),
            timeout_secs: overlay
                .fetcher
                .as_ref()
                .and_then(|f| f.timeout_secs)
                .or_else(|| base.fetcher.as_ref().and_then(|f| f.timeout_secs)),
            retry_times: overlay
                .fetcher
                .as_ref()
                .and_then(|f| f.retry_times)
                .or_else(|| base.fetcher.as_ref().and_then(|f| f.retry_times)),
            user_agent: overlay
                .fetcher
                .as_ref()
                .and_then(|f| f.user_agent.clone())
                .or_else(|| base.fetcher.as_ref().and_then(|f| f.user_agent.clone())),
        }),
        llm: Some(LlmSection {
            provider: overlay
                .llm
                .as_ref()
                .and_then(|l| l.provider.clone())
                .or_else(|| base.llm.as_ref().and_then(|l| l.provider.clone())),
            temperature: overlay
                .llm
                .as_ref()
                .and_then(|l| l.temperature)
                .or_else(|| base.llm.as_ref().and_then(|l| l.temperature)),
            max_tokens: overlay
                .llm
                .as_ref()
                .and_then(|l| l.max_tokens)
                .or_else(|| base.llm.as_ref().and_then(|l| l.max_tokens)),
        }),
        report: Some(ReportSection {
            format: overlay
                .report
                .as_ref()
                .and_then(|r| r.format.clone())
                .or_else(|| base.report.as_ref().and_then(|r| r.format.clone())),
            subject_template: overlay
                .report
                .as_ref()
                .and_then(|r| r.subject_template.clone())
                .or_else(|| base.report.as_ref().and_then(|r| r.subject_template.clone())),
            include_metadata: overlay
                .report
                .as_ref()
                .and_then(|r| r.include_metadata)
                .or_else(|| base.report.as_ref().and_then(|r| r.include_metadata)),
        }),
    }
}

/// Runtime mail-reading settings (credentials live in the environment,
/// not here).
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub folder: String,
    pub unread_only: bool,
    pub mark_as_read: bool,
    pub max_emails: usize,
    pub days_back: u32,
}

#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub kind: FetcherKind,
    pub timeout_secs: u64,
    pub retry_times: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub format: String,
    pub subject_template: String,
    pub include_metadata: bool,
}

/// Fully resolved runtime settings with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mail: MailSettings,
    pub fetcher: FetcherSettings,
    pub llm: LlmSettings,
    pub report: ReportSettings,
}

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

impl Settings {
    /// Apply defaults over a (possibly partial) config file.
    pub fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        let mail = file.mail.unwrap_or_default();
        let fetcher = file.fetcher.unwrap_or_default();
        let llm = file.llm.unwrap_or_default();
        let report = file.report.unwrap_or_default();

        let kind = match fetcher.kind.as_deref() {
            None => FetcherKind::SimpleHtml,
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::UnknownFetcherKind(s.to_string()))?,
        };

        Ok(Self {
            mail: MailSettings {
                folder: mail.folder.unwrap_or_else(|| "scholar".to_string()),
                unread_only: mail.unread_only.unwrap_or(true),
                mark_as_read: mail.mark_as_read.unwrap_or(true),
                max_emails: mail.max_emails.unwrap_or(50),
                days_back: mail.days_back.unwrap_or(7),
            },
            fetcher: FetcherSettings {
                kind,
                timeout_secs: fetcher.timeout_secs.unwrap_or(30),
                retry_times: fetcher.retry_times.unwrap_or(3),
                user_agent: fetcher
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            },
            llm: LlmSettings {
                provider: llm.provider.unwrap_or_else(|| "openai".to_string()),
                temperature: llm.temperature.unwrap_or(0.3),
                max_tokens: llm.max_tokens.unwrap_or(1000),
            },
            report: ReportSettings {
                format: report.format.unwrap_or_else(|| "markdown".to_string()),
                subject_template: report
                    .subject_template
                    .unwrap_or_else(|| "Weekly paper digest - {date}".to_string()),
                include_metadata: report.include_metadata.unwrap_or(true),
            },
        })
    }

    /// Override file values from the environment. Unparsable values are
    /// ignored rather than fatal.
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("MAIL_FOLDER") {
            self.mail.folder = v;
        }
        if let Some(v) = env_parse::<usize>("MAIL_MAX_EMAILS") {
            self.mail.max_emails = v;
        }
        if let Some(v) = env_parse::<u32>("MAIL_DAYS_BACK") {
            self.mail.days_back = v;
        }
        if let Some(v) = env_parse::<u64>("FETCHER_TIMEOUT") {
            self.fetcher.timeout_secs = v;
        }
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = env_parse::<f32>("LLM_TEMPERATURE") {
            self.llm.temperature = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use paperdigest_core::config_file::{self, Settings};
use paperdigest_core::{Summarizer, build_fetcher, extract_paper_links, unique_paper_links};
use paperdigest_llm::provider_for;
use paperdigest_mail::{MailClient, MailConfig};
use paperdigest_reporting::{self as reporting, ReportFormat};

mod output;

use output::ColorMode;

/// Weekly paper digest - turn scholar alert mail into a summarized report
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (skips the default lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report instead of emailing it
    #[arg(long)]
    dry_run: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable debug-level logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let color = ColorMode(!cli.no_color);
    run(cli, color).await
}

async fn run(cli: Cli, color: ColorMode) -> anyhow::Result<()> {
    // Resolve configuration: explicit path > cascade; env vars on top.
    let file = match &cli.config {
        Some(path) => config_file::load_from_path(path).ok_or_else(|| {
            anyhow::anyhow!("failed to read config file {}", path.display())
        })?,
        None => config_file::load_config(),
    };
    let settings = Settings::resolve(file)?.apply_env();
    let format: ReportFormat = settings.report.format.parse()?;

    // Fail on delivery config before any network work happens.
    let recipient = if cli.dry_run {
        None
    } else {
        Some(std::env::var("RECIPIENT_EMAIL").map_err(|_| {
            anyhow::anyhow!(
                "RECIPIENT_EMAIL is not set (use --dry-run to print the report instead)"
            )
        })?)
    };

    // The summarizer also fails fast on a missing API key.
    let fetcher = build_fetcher(&settings.fetcher)?;
    let provider = provider_for(
        &settings.llm.provider,
        settings.llm.temperature,
        settings.llm.max_tokens,
    )?;
    let summarizer = Summarizer::new(fetcher, provider)?;

    let client = Arc::new(MailClient::new(MailConfig::from_env()?));

    tracing::info!(
        folder = %settings.mail.folder,
        days_back = settings.mail.days_back,
        "fetching alert mail"
    );
    let mail = settings.mail.clone();
    let fetch_client = client.clone();
    let emails = tokio::task::spawn_blocking(move || {
        fetch_client.fetch_messages(
            &mail.folder,
            mail.unread_only,
            mail.max_emails,
            mail.days_back,
        )
    })
    .await??;

    if emails.is_empty() {
        output::print_no_mail(color);
        return Ok(());
    }

    let per_email_links: Vec<Vec<String>> = emails
        .iter()
        .map(|m| extract_paper_links(&m.body))
        .collect();
    let links = unique_paper_links(&per_email_links);
    output::print_link_summary(emails.len(), links.len(), color);

    if links.is_empty() {
        return Ok(());
    }

    let bar = ProgressBar::new(links.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .expect("progress template parses"),
    );
    let papers = summarizer
        .process_urls(&links, |i, _, url| {
            bar.set_position(i as u64);
            bar.set_message(url.to_string());
        })
        .await;
    bar.finish_and_clear();

    if papers.is_empty() {
        output::print_no_papers(color);
        return Ok(());
    }

    let date = reporting::today();
    let report = reporting::render(&papers, format, settings.report.include_metadata, &date);

    let Some(recipient) = recipient else {
        output::print_report_preview(&report);
        return Ok(());
    };

    let subject = reporting::subject(&settings.report.subject_template, &date);
    let html = format == ReportFormat::Html;
    let send_client = client.clone();
    let body = report.clone();
    let to = recipient.clone();
    tokio::task::spawn_blocking(move || send_client.send(&to, &subject, body, html)).await??;

    if settings.mail.mark_as_read {
        let uids: Vec<u32> = emails.iter().map(|m| m.uid).collect();
        let folder = settings.mail.folder.clone();
        let mark_client = client.clone();
        tokio::task::spawn_blocking(move || mark_client.mark_as_read(&folder, &uids)).await??;
    }

    output::print_sent(&recipient, papers.len(), color);
    Ok(())
}

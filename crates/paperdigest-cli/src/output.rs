use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub fn print_no_mail(color: ColorMode) {
    let msg = "No unread alert mail to process.";
    if color.enabled() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

pub fn print_link_summary(emails: usize, links: usize, color: ColorMode) {
    let msg = format!("{} emails -> {} unique paper links", emails, links);
    if color.enabled() {
        println!("{}", msg.bold());
    } else {
        println!("{}", msg);
    }
    if links == 0 {
        println!("Nothing to summarize.");
    }
}

pub fn print_no_papers(color: ColorMode) {
    let msg = "No papers could be processed; nothing to report.";
    if color.enabled() {
        println!("{}", msg.yellow());
    } else {
        println!("{}", msg);
    }
}

pub fn print_report_preview(report: &str) {
    let rule = "=".repeat(80);
    println!("{}", rule);
    println!("Dry run - report preview:");
    println!("{}", rule);
    println!("{}", report);
    println!("{}", rule);
}

pub fn print_sent(recipient: &str, papers: usize, color: ColorMode) {
    let msg = format!("Digest with {} papers sent to {}", papers, recipient);
    if color.enabled() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

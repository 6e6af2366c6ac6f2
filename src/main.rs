//! Main entry point for the tmplsan CLI application.
//!
//! With no arguments, reads `src/templates/template.odt` and writes the
//! placeholder template to `src/templates/template_clean.odt`.

use anyhow::Result;
use clap::Parser;

use tmplsan::{Cli, RuleSet, SanitizeReport, TemplateSanitizer, logging};

/// Application entry point.
///
/// Everything runs on one thread; errors are returned to the runtime,
/// which prints the cause chain and exits with status 1.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.quiet);

    let sanitizer = TemplateSanitizer::new(RuleSet::invoice())
        .with_target(cli.target.clone())
        .strict(cli.strict);

    if cli.dry_run {
        let report = sanitizer.preview(&cli.source).await?;
        print_report(&report);
        return Ok(());
    }

    let report = sanitizer.sanitize_file(&cli.source, &cli.dest).await?;

    if !cli.is_quiet() {
        print_report(&report);
    }
    if !cli.is_very_quiet() {
        println!("Template sanitized.");
        println!("  written: {}", cli.dest.display());
    }

    Ok(())
}

/// Print one line per rule with its match count.
fn print_report(report: &SanitizeReport) {
    println!("{:>7}  {:<16}  Rule", "Matches", "Group");
    println!("{}", "-".repeat(50));
    for outcome in &report.outcomes {
        let marker = if outcome.is_missed() { "  (missed)" } else { "" };
        println!(
            "{:>7}  {:<16}  {}{}",
            outcome.matches, outcome.group, outcome.label, marker
        );
    }
    println!("{}", "-".repeat(50));
    println!(
        "{} entries, {} rewritten, {} of {} rules missed",
        report.entries,
        report.transformed,
        report.missed().len(),
        report.outcomes.len()
    );
}

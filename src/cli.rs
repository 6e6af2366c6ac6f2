use clap::Parser;
use std::path::PathBuf;

use crate::sanitizer::TARGET_ENTRY;

/// Template shipped with the invoice generator
pub const DEFAULT_SOURCE: &str = "src/templates/template.odt";
/// Where the placeholder template is written
pub const DEFAULT_DEST: &str = "src/templates/template_clean.odt";

#[derive(Parser, Debug)]
#[command(name = "tmplsan")]
#[command(version)]
#[command(about = "Replace invoice data in an OpenDocument template with {{PLACEHOLDER}} tokens", long_about = None)]
#[command(after_help = "Examples:\n  \
  tmplsan                             sanitize src/templates/template.odt\n  \
  tmplsan in.odt out.odt --strict     fail if any rule matched nothing\n  \
  tmplsan in.odt --dry-run            report rule matches, write nothing")]
pub struct Cli {
    /// Filled-in template to read
    #[arg(value_name = "SOURCE", default_value = DEFAULT_SOURCE)]
    pub source: PathBuf,

    /// Placeholder template to write
    #[arg(value_name = "DEST", default_value = DEFAULT_DEST)]
    pub dest: PathBuf,

    /// Archive entry to rewrite
    #[arg(short = 't', long = "target", value_name = "ENTRY", default_value = TARGET_ENTRY)]
    pub target: String,

    /// Fail when a replacement rule matches nothing
    #[arg(long)]
    pub strict: bool,

    /// Report rule matches without writing DEST
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}

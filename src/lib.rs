//! # tmplsan
//!
//! Turns a filled-in OpenDocument invoice into a reusable template.
//!
//! The invoice's `content.xml` is run through an ordered list of literal
//! replacement rules that swap the concrete invoice data (number, dates,
//! variable symbol, customer, description, amount) for `{{NAME}}`
//! placeholder tokens. Every other archive entry is copied byte for byte,
//! compressed stream included.
//!
//! ## Features
//!
//! - Self-contained ZIP reader and writer (STORED and DEFLATE)
//! - Raw passthrough of untouched entries, order and metadata preserved
//! - Per-rule match counts; rules that match nothing are reported
//! - Strict mode turning missed rules into an error
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use tmplsan::TemplateSanitizer;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let report = TemplateSanitizer::default()
//!         .sanitize_file(Path::new("template.odt"), Path::new("template_clean.odt"))
//!         .await?;
//!
//!     for rule in report.missed() {
//!         println!("no match for {}", rule.label);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod logging;
pub mod rules;
pub mod sanitizer;
pub mod zip;

pub use cli::Cli;
pub use error::SanitizeError;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use rules::{INVOICE_RULES, ReplacementRule, RuleOutcome, RuleSet};
pub use sanitizer::{SanitizeReport, TARGET_ENTRY, TemplateSanitizer};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};

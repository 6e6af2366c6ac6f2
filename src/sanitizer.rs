//! The template sanitizer: copies an archive, rewriting one entry.
//!
//! Every entry except the target is copied with its compressed bytes
//! untouched. The target is inflated, decoded as UTF-8, run through the
//! [`RuleSet`] and written back under its original name and metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWrite, BufWriter};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SanitizeError};
use crate::io::{LocalFileReader, MemoryReader, ReadAt};
use crate::rules::{RuleOutcome, RuleSet};
use crate::zip::{CompressionMethod, ZipExtractor, ZipWriter};

/// Entry holding the text of an OpenDocument file
pub const TARGET_ENTRY: &str = "content.xml";

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Entries written to the output
    pub entries: usize,
    /// Entries that went through the rules
    pub transformed: usize,
    /// Per-rule matches, summed over transformed entries
    pub outcomes: Vec<RuleOutcome>,
}

impl SanitizeReport {
    /// Rules whose search literal was never found
    pub fn missed(&self) -> Vec<&RuleOutcome> {
        self.outcomes.iter().filter(|o| o.is_missed()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| !o.is_missed())
    }
}

/// Rewrites the target entry of an archive with a [`RuleSet`]
#[derive(Debug, Clone)]
pub struct TemplateSanitizer {
    target: String,
    rules: RuleSet,
    strict: bool,
}

impl Default for TemplateSanitizer {
    fn default() -> Self {
        Self::new(RuleSet::invoice())
    }
}

impl TemplateSanitizer {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            target: TARGET_ENTRY.to_string(),
            rules,
            strict: false,
        }
    }

    /// Name of the entry to rewrite
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Fail with [`SanitizeError::MissedRules`] when a rule matches nothing
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Sanitize `source` into `dest`, creating or truncating `dest`.
    ///
    /// The source is opened before the destination is touched. A failure
    /// halfway may leave a partial destination file behind.
    pub async fn sanitize_file(&self, source: &Path, dest: &Path) -> Result<SanitizeReport> {
        if same_file(source, dest) {
            return Err(SanitizeError::SameFile {
                path: dest.to_path_buf(),
            });
        }

        let reader = LocalFileReader::new(source).map_err(|e| SanitizeError::read(source, e))?;

        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| SanitizeError::write(dest, e.into()))?;

        let (sink, report) = self
            .sanitize_archive(Arc::new(reader), source, BufWriter::new(file), dest)
            .await?;

        sink.into_inner()
            .sync_all()
            .await
            .map_err(|e| SanitizeError::write(dest, e.into()))?;

        info!(
            source = %source.display(),
            dest = %dest.display(),
            entries = report.entries,
            "template sanitized"
        );
        self.enforce(report)
    }

    /// Run the rules over `source` without writing anything
    pub async fn preview(&self, source: &Path) -> Result<SanitizeReport> {
        let reader = LocalFileReader::new(source).map_err(|e| SanitizeError::read(source, e))?;
        let (_, report) = self
            .sanitize_archive(Arc::new(reader), source, tokio::io::sink(), Path::new("<dry-run>"))
            .await?;
        self.enforce(report)
    }

    /// Sanitize an archive held in memory, returning the new archive's bytes
    pub async fn sanitize_bytes(&self, archive: Vec<u8>) -> Result<(Vec<u8>, SanitizeReport)> {
        let reader = Arc::new(MemoryReader::new(archive));
        let (bytes, report) = self
            .sanitize_archive(reader, Path::new("<memory>"), Vec::new(), Path::new("<memory>"))
            .await?;
        Ok((bytes, self.enforce(report)?))
    }

    async fn sanitize_archive<R, W>(
        &self,
        reader: Arc<R>,
        source: &Path,
        sink: W,
        dest: &Path,
    ) -> Result<(W, SanitizeReport)>
    where
        R: ReadAt,
        W: AsyncWrite + Unpin,
    {
        let extractor = ZipExtractor::new(reader);
        let cd = extractor
            .central_directory()
            .await
            .map_err(|e| SanitizeError::read(source, e))?;

        let mut outcomes: Vec<RuleOutcome> = self
            .rules
            .rules()
            .iter()
            .map(|r| RuleOutcome {
                group: r.group,
                label: r.label,
                matches: 0,
            })
            .collect();

        let mut writer = ZipWriter::new(sink);
        let mut transformed = 0;

        for entry in &cd.entries {
            if entry.file_name != self.target {
                let raw = extractor
                    .read_raw(entry)
                    .await
                    .map_err(|e| SanitizeError::read(source, e))?;
                writer
                    .copy_raw(entry, &raw)
                    .await
                    .map_err(|e| SanitizeError::write(dest, e))?;
                trace!(entry = %entry.file_name, bytes = raw.data.len(), "copied");
                continue;
            }

            if transformed > 0 {
                warn!(entry = %entry.file_name, "archive holds the target entry more than once");
            }

            let content = extractor
                .extract_to_memory(entry)
                .await
                .map_err(|e| SanitizeError::read(source, e))?;
            let text = String::from_utf8(content).map_err(|source| SanitizeError::Encoding {
                entry: entry.file_name.clone(),
                source,
            })?;

            let applied = self.rules.apply(&text);
            for (total, outcome) in outcomes.iter_mut().zip(&applied.outcomes) {
                total.matches += outcome.matches;
            }

            let method = match entry.compression_method {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflate,
            };
            writer
                .add_entry(entry, applied.text.as_bytes(), method)
                .await
                .map_err(|e| SanitizeError::write(dest, e))?;
            transformed += 1;

            debug!(
                entry = %entry.file_name,
                before = text.len(),
                after = applied.text.len(),
                "rewrote target entry"
            );
        }

        if transformed == 0 {
            warn!(entry = %self.target, "target entry not found, archive copied unchanged");
        }
        for missed in outcomes.iter().filter(|o| o.is_missed()) {
            warn!(group = missed.group, rule = missed.label, "replacement rule matched nothing");
        }

        let entries = writer.len();
        let sink = writer
            .finish(&cd.comment)
            .await
            .map_err(|e| SanitizeError::write(dest, e))?;

        Ok((
            sink,
            SanitizeReport {
                entries,
                transformed,
                outcomes,
            },
        ))
    }

    fn enforce(&self, report: SanitizeReport) -> Result<SanitizeReport> {
        if self.strict && !report.is_complete() {
            return Err(SanitizeError::MissedRules {
                labels: report
                    .missed()
                    .iter()
                    .map(|o| o.label.to_string())
                    .collect(),
            });
        }
        Ok(report)
    }
}

/// Whether both paths name the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| -> Option<PathBuf> { p.canonicalize().ok() };
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ReplacementRule;

    async fn archive(entries: &[(&str, &str, CompressionMethod)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Vec::new());
        for (name, data, method) in entries {
            writer.add_file(name, data.as_bytes(), *method).await.unwrap();
        }
        writer.finish(b"").await.unwrap()
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            ReplacementRule::new("amount", "amount", "90 000,00 Kč", "{{AMOUNT}}"),
            ReplacementRule::new("vs", "variable symbol", "30062025", "{{VS}}"),
        ])
    }

    async fn entry_text(bytes: Vec<u8>, name: &str) -> String {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(bytes)));
        let cd = extractor.central_directory().await.unwrap();
        let entry = cd.entries.iter().find(|e| e.file_name == name).unwrap();
        String::from_utf8(extractor.extract_to_memory(entry).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn rewrites_target_and_counts_matches() {
        let input = archive(&[
            ("mimetype", "application/vnd.oasis.opendocument.text", CompressionMethod::Stored),
            (
                "content.xml",
                "<p>90 000,00 Kč</p><p>90 000,00 Kč</p>",
                CompressionMethod::Deflate,
            ),
        ])
        .await;

        let (output, report) = TemplateSanitizer::new(rules())
            .sanitize_bytes(input)
            .await
            .unwrap();

        assert_eq!(report.entries, 2);
        assert_eq!(report.transformed, 1);
        assert_eq!(report.outcomes[0].matches, 2);
        assert_eq!(report.missed().len(), 1);
        assert_eq!(report.missed()[0].label, "variable symbol");
        assert_eq!(
            entry_text(output, "content.xml").await,
            "<p>{{AMOUNT}}</p><p>{{AMOUNT}}</p>"
        );
    }

    #[tokio::test]
    async fn strict_mode_fails_on_missed_rules() {
        let input = archive(&[("content.xml", "<p>30062025</p>", CompressionMethod::Deflate)]).await;

        let err = TemplateSanitizer::new(rules())
            .strict(true)
            .sanitize_bytes(input)
            .await
            .unwrap_err();

        match err {
            SanitizeError::MissedRules { labels } => assert_eq!(labels, ["amount"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_utf8_target_is_an_encoding_error() {
        let mut writer = ZipWriter::new(Vec::new());
        writer
            .add_file("content.xml", &[0x3C, 0xFF, 0xFE, 0x3E], CompressionMethod::Deflate)
            .await
            .unwrap();
        let input = writer.finish(b"").await.unwrap();

        let err = TemplateSanitizer::new(rules())
            .sanitize_bytes(input)
            .await
            .unwrap_err();
        assert!(matches!(err, SanitizeError::Encoding { ref entry, .. } if entry == "content.xml"));
    }

    #[tokio::test]
    async fn missing_target_copies_everything_and_misses_all_rules() {
        let input = archive(&[("styles.xml", "<styles/>", CompressionMethod::Deflate)]).await;

        let (output, report) = TemplateSanitizer::new(rules())
            .sanitize_bytes(input)
            .await
            .unwrap();
        assert_eq!(report.transformed, 0);
        assert_eq!(report.missed().len(), 2);
        assert_eq!(entry_text(output, "styles.xml").await, "<styles/>");
    }

    #[tokio::test]
    async fn custom_target_entry() {
        let input = archive(&[
            ("content.xml", "30062025", CompressionMethod::Deflate),
            ("word/document.xml", "30062025", CompressionMethod::Deflate),
        ])
        .await;

        let (output, _) = TemplateSanitizer::new(rules())
            .with_target("word/document.xml")
            .sanitize_bytes(input)
            .await
            .unwrap();
        assert_eq!(entry_text(output.clone(), "word/document.xml").await, "{{VS}}");
        assert_eq!(entry_text(output, "content.xml").await, "30062025");
    }

    #[tokio::test]
    async fn stored_target_stays_stored() {
        let input = archive(&[("content.xml", "30062025", CompressionMethod::Stored)]).await;

        let (output, _) = TemplateSanitizer::new(rules())
            .sanitize_bytes(input)
            .await
            .unwrap();
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(output)));
        let cd = extractor.central_directory().await.unwrap();
        assert_eq!(cd.entries[0].compression_method, CompressionMethod::Stored);
    }

    #[tokio::test]
    async fn garbage_is_an_archive_read_error() {
        let err = TemplateSanitizer::default()
            .sanitize_bytes(b"definitely not a zip file at all".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, SanitizeError::ArchiveRead { .. }));
    }
}

//! End-to-end runs over archives on disk.

use std::path::Path;
use std::sync::Arc;

use tmplsan::zip::CompressionMethod;
use tmplsan::{
    INVOICE_RULES, LocalFileReader, SanitizeError, TemplateSanitizer, ZipExtractor, ZipWriter,
};

const AMOUNT: &str = "90<text:s/>000,00 Kč";

fn invoice_content() -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content><office:body><office:text>"#);
    for rule in INVOICE_RULES.iter().filter(|r| r.label != "amount") {
        xml.push_str("<text:p>");
        xml.push_str(rule.search);
        xml.push_str("</text:p>");
    }
    xml.push_str(&format!("<text:p>{AMOUNT}</text:p><text:p>Celkem {AMOUNT}</text:p>"));
    xml.push_str("</office:text></office:body></office:document-content>");
    xml
}

/// Writes mimetype, `extra` filler entries and content.xml
async fn write_odt(path: &Path, content: &str, extra: usize) {
    let mut writer = ZipWriter::new(Vec::new());
    writer
        .add_file("mimetype", b"application/vnd.oasis.opendocument.text", CompressionMethod::Stored)
        .await
        .unwrap();
    for i in 0..extra {
        let body = format!("<entry n=\"{i}\">{}</entry>", "x".repeat(i * 37));
        let method = if i % 2 == 0 {
            CompressionMethod::Deflate
        } else {
            CompressionMethod::Stored
        };
        writer
            .add_file(&format!("Pictures/part{i}.xml"), body.as_bytes(), method)
            .await
            .unwrap();
    }
    writer
        .add_file("content.xml", content.as_bytes(), CompressionMethod::Deflate)
        .await
        .unwrap();
    let bytes = writer.finish(b"").await.unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn open(path: &Path) -> ZipExtractor<LocalFileReader> {
    ZipExtractor::new(Arc::new(LocalFileReader::new(path).unwrap()))
}

async fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    let zip = open(path);
    let cd = zip.central_directory().await.unwrap();
    let entry = cd.entries.iter().find(|e| e.file_name == name).unwrap();
    zip.extract_to_memory(entry).await.unwrap()
}

#[tokio::test]
async fn passthrough_entries_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    let dest = dir.path().join("template_clean.odt");
    write_odt(&source, &invoice_content(), 19).await;

    let report = TemplateSanitizer::default()
        .sanitize_file(&source, &dest)
        .await
        .unwrap();
    assert_eq!(report.entries, 21);
    assert_eq!(report.transformed, 1);

    let (src, out) = (open(&source), open(&dest));
    let src_cd = src.central_directory().await.unwrap();
    let out_cd = out.central_directory().await.unwrap();

    let src_names: Vec<_> = src_cd.entries.iter().map(|e| &e.file_name).collect();
    let out_names: Vec<_> = out_cd.entries.iter().map(|e| &e.file_name).collect();
    assert_eq!(src_names, out_names);
    assert_eq!(out_names[0], "mimetype");

    let mut identical = 0;
    for (a, b) in src_cd.entries.iter().zip(&out_cd.entries) {
        if a.file_name == "content.xml" {
            continue;
        }
        assert_eq!(src.read_raw(a).await.unwrap().data, out.read_raw(b).await.unwrap().data);
        assert_eq!(
            src.extract_to_memory(a).await.unwrap(),
            out.extract_to_memory(b).await.unwrap()
        );
        assert_eq!(a.compression_method, b.compression_method);
        assert_eq!(a.crc32, b.crc32);
        identical += 1;
    }
    assert_eq!(identical, 20);
}

#[tokio::test]
async fn invoice_data_becomes_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    let dest = dir.path().join("template_clean.odt");
    write_odt(&source, &invoice_content(), 0).await;

    let report = TemplateSanitizer::default()
        .sanitize_file(&source, &dest)
        .await
        .unwrap();
    assert!(report.is_complete(), "{:?}", report.missed());

    let text = String::from_utf8(read_entry(&dest, "content.xml").await).unwrap();
    assert_eq!(text.matches("{{AMOUNT}}").count(), 2);
    assert!(!text.contains("000,00 Kč"));
    assert_eq!(text.matches("{{CUSTOMER_BLOCK}}").count(), 1);
    assert!(!text.contains("ScioŠkola"));
    assert!(!text.contains("30062025"));
    assert!(text.contains("FAKTURA - DAŇOVÝ DOKLAD č. {{INVOICE_NO}}"));
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
}

#[tokio::test]
async fn second_run_is_a_reported_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    let once = dir.path().join("once.odt");
    let twice = dir.path().join("twice.odt");
    write_odt(&source, &invoice_content(), 3).await;

    let sanitizer = TemplateSanitizer::default();
    sanitizer.sanitize_file(&source, &once).await.unwrap();
    let report = sanitizer.sanitize_file(&once, &twice).await.unwrap();

    assert_eq!(report.missed().len(), INVOICE_RULES.len());
    assert_eq!(
        read_entry(&once, "content.xml").await,
        read_entry(&twice, "content.xml").await
    );
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    write_odt(&source, "<office:text>nothing to see</office:text>", 2).await;

    let report = TemplateSanitizer::default().preview(&source).await.unwrap();
    assert_eq!(report.entries, 4);
    assert_eq!(report.missed().len(), INVOICE_RULES.len());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn strict_run_still_writes_then_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    let dest = dir.path().join("out.odt");
    write_odt(&source, &format!("<p>{AMOUNT}</p>"), 0).await;

    let err = TemplateSanitizer::default()
        .strict(true)
        .sanitize_file(&source, &dest)
        .await
        .unwrap_err();

    let labels = match err {
        SanitizeError::MissedRules { labels } => labels,
        other => panic!("expected missed rules, got {other}"),
    };
    assert_eq!(labels.len(), INVOICE_RULES.len() - 1);
    assert!(!labels.iter().any(|l| l == "amount"));
    assert!(dest.exists());
}

#[tokio::test]
async fn missing_source_is_a_read_error_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.odt");

    let err = TemplateSanitizer::default()
        .sanitize_file(&dir.path().join("missing.odt"), &dest)
        .await
        .unwrap_err();
    assert!(matches!(err, SanitizeError::ArchiveRead { .. }), "{err}");
    assert!(!dest.exists());
}

#[tokio::test]
async fn unwritable_destination_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    write_odt(&source, "<p/>", 0).await;

    let err = TemplateSanitizer::default()
        .sanitize_file(&source, &dir.path().join("no/such/dir/out.odt"))
        .await
        .unwrap_err();
    assert!(matches!(err, SanitizeError::ArchiveWrite { .. }), "{err}");
}

#[tokio::test]
async fn refuses_to_overwrite_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("template.odt");
    write_odt(&source, "<p/>", 0).await;
    let before = std::fs::read(&source).unwrap();

    let err = TemplateSanitizer::default()
        .sanitize_file(&source, &dir.path().join(".").join("template.odt"))
        .await
        .unwrap_err();
    assert!(matches!(err, SanitizeError::SameFile { .. }), "{err}");
    assert_eq!(std::fs::read(&source).unwrap(), before);
}

#[tokio::test]
async fn archive_comment_survives() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("commented.odt");
    let dest = dir.path().join("out.odt");

    let mut writer = ZipWriter::new(Vec::new());
    writer
        .add_file("content.xml", AMOUNT.as_bytes(), CompressionMethod::Deflate)
        .await
        .unwrap();
    std::fs::write(&source, writer.finish(b"generated by LibreOffice").await.unwrap()).unwrap();

    TemplateSanitizer::default()
        .sanitize_file(&source, &dest)
        .await
        .unwrap();

    let cd = open(&dest).central_directory().await.unwrap();
    assert_eq!(cd.comment, b"generated by LibreOffice");
    assert_eq!(read_entry(&dest, "content.xml").await, b"{{AMOUNT}}");
}

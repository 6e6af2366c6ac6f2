//! Runs the binary the way the invoice project does.

use std::path::Path;
use std::process::Command;

use tmplsan::ZipWriter;
use tmplsan::zip::CompressionMethod;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tmplsan"));
    cmd.env_remove("RUST_LOG");
    cmd
}

async fn write_template(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut writer = ZipWriter::new(Vec::new());
    writer
        .add_file("mimetype", b"application/vnd.oasis.opendocument.text", CompressionMethod::Stored)
        .await
        .unwrap();
    writer
        .add_file(
            "content.xml",
            "<text:p>VS 30062025, 90<text:s/>000,00 Kč</text:p>".as_bytes(),
            CompressionMethod::Deflate,
        )
        .await
        .unwrap();
    std::fs::write(path, writer.finish(b"").await.unwrap()).unwrap();
}

#[tokio::test]
async fn no_arguments_uses_project_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_template(&dir.path().join("src/templates/template.odt")).await;

    let output = bin().current_dir(dir.path()).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Template sanitized."));
    assert!(stdout.contains("(missed)"));
    assert!(dir.path().join("src/templates/template_clean.odt").exists());

    // missed rules are logged on stderr at warn level
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("replacement rule matched nothing"));
}

#[tokio::test]
async fn strict_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.odt");
    write_template(&source).await;

    let output = bin()
        .arg(&source)
        .arg(dir.path().join("out.odt"))
        .arg("--strict")
        .arg("-qq")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("matched nothing"));
}

#[test]
fn missing_source_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = bin().current_dir(dir.path()).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read archive"), "{stderr}");
    assert!(!dir.path().join("src/templates/template_clean.odt").exists());
}

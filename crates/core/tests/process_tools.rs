#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use co_core::model::{DocumentLocator, RawDocument};
use co_core::services::normalize::{DocumentNormalizer, NormalizedDocument, TextExtractor};
use co_core::services::tools::{OcrNormalizer, PassthroughNormalizer, Pdf2TxtExtractor, ToolError};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn document(bytes: &[u8]) -> RawDocument {
    RawDocument {
        locator: DocumentLocator::from("M1208518-3.PDF"),
        content_type: "application/pdf".into(),
        bytes: bytes.to_vec(),
    }
}

#[tokio::test]
async fn ocr_normalizer_waits_for_the_tool_output() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    // Delay before writing so a fire-and-forget spawn would miss the file.
    let ocr = script(tools.path(), "fake-ocr", "sleep 1\ncp \"$1\" \"${1%.pdf}_ocr.pdf\"");

    let normalized =
        OcrNormalizer::new(&ocr).normalize(&document(b"locked"), work.path()).await.unwrap();

    assert_eq!(normalized.path, work.path().join("certificate_ocr.pdf"));
    assert_eq!(std::fs::read(&normalized.path).unwrap(), b"locked");
}

#[tokio::test]
async fn ocr_normalizer_reports_tool_failure() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ocr = script(tools.path(), "fake-ocr", "echo 'encrypted' >&2\nexit 3");

    let err = OcrNormalizer::new(&ocr).normalize(&document(b"x"), work.path()).await.unwrap_err();

    match err {
        ToolError::Failed { stderr, .. } => assert_eq!(stderr, "encrypted"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn ocr_normalizer_requires_output_file() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ocr = script(tools.path(), "fake-ocr", "exit 0");

    let err = OcrNormalizer::new(&ocr).normalize(&document(b"x"), work.path()).await.unwrap_err();

    assert!(matches!(err, ToolError::MissingOutput { .. }));
}

#[tokio::test]
async fn missing_tool_is_a_spawn_error() {
    let work = tempfile::tempdir().unwrap();
    let err = OcrNormalizer::new("/definitely/not/here/pypdfocr")
        .normalize(&document(b"x"), work.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Spawn { .. }));
}

#[tokio::test]
async fn passthrough_writes_working_file() {
    let work = tempfile::tempdir().unwrap();
    let normalized = PassthroughNormalizer.normalize(&document(b"plain"), work.path()).await.unwrap();
    assert_eq!(std::fs::read(normalized.path).unwrap(), b"plain");
}

#[tokio::test]
async fn pdf2txt_extractor_returns_stdout() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let text_bin = script(tools.path(), "fake-pdf2txt", "cat \"$1\"");
    let file = work.path().join("certificate.pdf");
    std::fs::write(&file, "ISSUED 06/01/2015\n").unwrap();

    let text = Pdf2TxtExtractor::new(&text_bin)
        .extract(&NormalizedDocument { path: file })
        .await
        .unwrap();

    assert_eq!(text, "ISSUED 06/01/2015\n");
}

//! Integration tests for the estimatepdf CLI
//!
//! Runs the built binary against manifests in a temporary directory and
//! checks the files it writes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_estimatepdf"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run estimatepdf")
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn assert_pdf(path: &Path) -> Vec<u8> {
    assert!(path.exists(), "PDF file should exist: {}", path.display());
    let content = fs::read(path).expect("Failed to read PDF file");
    assert!(content.len() > 100, "PDF file should have content");
    assert!(content.starts_with(b"%PDF-"), "File should start with PDF header");
    content
}

const MANIFEST: &str = r#"{
    "header": { "title": "Estimate #7", "subtitle": "Backyard renovation" },
    "metadata": { "author": "Green Acres" },
    "options": { "generation_date": "2024-05-17", "compress": false },
    "blocks": [
        { "type": "section", "title": "Client", "content": "Jane Doe" },
        { "type": "table", "headers": ["Item", "Qty", "Total"],
          "rows": [["Mulch", "4", "$120.00"], ["Edging", "40", "$380.00"]] },
        { "type": "images", "images": [{ "path": "missing.jpg" }] }
    ]
}"#;

#[test]
fn test_cli_demo_command() {
    let temp_dir = setup_temp_dir();
    let output_path = temp_dir.path().join("demo.pdf");

    let output = run_cli(&["demo", "-o", output_path.to_str().unwrap(), "--rows", "120"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_pdf(&output_path);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Demo PDF created successfully"));
}

#[test]
fn test_cli_render_manifest() {
    let temp_dir = setup_temp_dir();
    let manifest_path = temp_dir.path().join("job.json");
    let output_path = temp_dir.path().join("job.pdf");
    fs::write(&manifest_path, MANIFEST).unwrap();

    let output = run_cli(&[
        "render",
        manifest_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--progress",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = String::from_utf8_lossy(&assert_pdf(&output_path)).into_owned();
    assert!(text.contains("(Estimate #7) Tj"));
    assert!(text.contains("(Page 1 / 1) Tj"));
    assert!(text.contains("(17/05/2024) Tj"));
    assert!(text.contains("/Author (Green Acres)"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("100%"));
    assert!(stderr.contains("could not be decoded"));
}

#[test]
fn test_cli_render_base64() {
    let temp_dir = setup_temp_dir();
    let manifest_path = temp_dir.path().join("job.json");
    let output_path = temp_dir.path().join("job.b64");
    fs::write(&manifest_path, MANIFEST).unwrap();

    let output = run_cli(&[
        "render",
        manifest_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--base64",
    ]);
    assert!(output.status.success());

    let encoded = fs::read_to_string(&output_path).unwrap();
    // "%PDF-" in standard base64
    assert!(encoded.starts_with("JVBERi0"));
}

#[test]
fn test_cli_missing_manifest() {
    let temp_dir = setup_temp_dir();
    let output_path = temp_dir.path().join("out.pdf");

    let output = run_cli(&[
        "render",
        temp_dir.path().join("nope.json").to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read manifest"));
    assert!(!output_path.exists());
}

#[test]
fn test_cli_invalid_chunk_size() {
    let temp_dir = setup_temp_dir();
    let manifest_path = temp_dir.path().join("job.json");
    fs::write(&manifest_path, MANIFEST).unwrap();

    let output = run_cli(&[
        "render",
        manifest_path.to_str().unwrap(),
        "-o",
        temp_dir.path().join("out.pdf").to_str().unwrap(),
        "--chunk-size",
        "0",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid generation options"));
}

#[test]
fn test_cli_ragged_table_fails() {
    let temp_dir = setup_temp_dir();
    let manifest_path = temp_dir.path().join("bad.json");
    fs::write(
        &manifest_path,
        r#"{ "blocks": [ { "type": "table", "headers": ["A", "B"], "rows": [["1"]] } ] }"#,
    )
    .unwrap();

    let output = run_cli(&[
        "render",
        manifest_path.to_str().unwrap(),
        "-o",
        temp_dir.path().join("out.pdf").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("row 0 has 1 cells, expected 2"));
}

#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("render"));
    assert!(stdout.contains("demo"));
}

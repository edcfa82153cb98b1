//! Integration tests for the command-line interface: apply, check, tokens.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const BUILD_GN: &str = r#"config("pdfium_common_config") {
  include_dirs = [ "." ]
  defines = [ "PNG_PREFIX" ]
}

static_library("pdfium") {
  sources = [ "fpdfsdk/fpdf_view.cpp" ]
}
"#;

/// Helper to create a checkout with one BUILD.gn and a contrib dir
fn setup_test_checkout() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("BUILD.gn"), BUILD_GN).unwrap();

    let contrib = dir.path().join("contrib");
    fs::create_dir(&contrib).unwrap();
    fs::write(contrib.join("shim.cpp"), "").unwrap();

    dir
}

fn gn_patcher(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gn-patcher"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_apply_help() {
    let dir = TempDir::new().unwrap();
    let output = gn_patcher(dir.path(), &["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--pdfium"));
    assert!(stdout.contains("--contrib"));
}

#[test]
fn test_apply_pdfium_with_contrib() {
    let dir = setup_test_checkout();
    let output = gn_patcher(
        dir.path(),
        &["apply", "BUILD.gn", "--pdfium", "--contrib", "contrib"],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BUILD.gn: Rewritten"));
    assert!(stdout.contains("declaration flipped"));
    assert!(stdout.contains("1 source(s) added"));
    assert!(stdout.contains("2 config value(s) added"));

    let content = fs::read_to_string(dir.path().join("BUILD.gn")).unwrap();
    assert_eq!(
        content,
        r#"config("pdfium_common_config") {
  include_dirs = [ "." ,"v8/include"]
  defines = [ "PNG_PREFIX" ,"FPDFSDK_EXPORTS"]
}

shared_library("pdfium") {
  sources = [ "fpdfsdk/fpdf_view.cpp" ,"contrib/shim.cpp"]
}
"#
    );
}

#[test]
fn test_apply_dry_run() {
    let dir = setup_test_checkout();
    let output = gn_patcher(
        dir.path(),
        &["apply", ".", "--target", "pdfium", "--dry-run", "--diff"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would rewrite"));
    assert!(stdout.contains("-static_library(\"pdfium\") {"));
    assert!(stdout.contains("+shared_library(\"pdfium\") {"));

    let content = fs::read_to_string(dir.path().join("BUILD.gn")).unwrap();
    assert_eq!(content, BUILD_GN);
}

#[test]
fn test_apply_with_spec_file() {
    let dir = setup_test_checkout();
    fs::write(
        dir.path().join("edits.toml"),
        r#"[[configs]]
config = "pdfium_common_config"
key = "defines"
values = ["PNG_PREFIX", "USE_SYSTEM_ZLIB"]
ensure_absent = true
"#,
    )
    .unwrap();

    let output = gn_patcher(dir.path(), &["apply", "BUILD.gn", "--spec", "edits.toml"]);
    assert!(output.status.success());

    let content = fs::read_to_string(dir.path().join("BUILD.gn")).unwrap();
    assert!(content.contains(r#"defines = [ "PNG_PREFIX" ,"USE_SYSTEM_ZLIB"]"#));
    assert!(content.contains("static_library(\"pdfium\")"));
}

#[test]
fn test_check_reports_pending_then_clean() {
    let dir = setup_test_checkout();

    let output = gn_patcher(dir.path(), &["check", "BUILD.gn", "--target", "pdfium"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Needs rewrite"));

    let output = gn_patcher(dir.path(), &["apply", "BUILD.gn", "--target", "pdfium"]);
    assert!(output.status.success());

    // The flipped declaration no longer matches, so nothing is pending
    let output = gn_patcher(dir.path(), &["check", "BUILD.gn", "--target", "pdfium"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Up to date"));
}

#[test]
fn test_pdfium_apply_then_check_is_clean() {
    let dir = setup_test_checkout();

    let output = gn_patcher(
        dir.path(),
        &["apply", "BUILD.gn", "--pdfium", "--contrib", "contrib"],
    );
    assert!(output.status.success());
    let applied = fs::read_to_string(dir.path().join("BUILD.gn")).unwrap();

    let output = gn_patcher(
        dir.path(),
        &["check", "BUILD.gn", "--pdfium", "--contrib", "contrib"],
    );
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Up to date"));

    let output = gn_patcher(dir.path(), &["apply", "BUILD.gn", "--pdfium"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("BUILD.gn: Unchanged"));
    assert_eq!(fs::read_to_string(dir.path().join("BUILD.gn")).unwrap(), applied);
}

#[test]
fn test_apply_parse_failure() {
    let dir = TempDir::new().unwrap();
    let broken = "static_library(\"pdfium\") {\n  sources = [ \"a.cc\n";
    fs::write(dir.path().join("BUILD.gn"), broken).unwrap();

    let output = gn_patcher(dir.path(), &["apply", "BUILD.gn", "--pdfium"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unterminated string literal"));
    assert!(stderr.contains("left untouched"));
    assert_eq!(fs::read_to_string(dir.path().join("BUILD.gn")).unwrap(), broken);
}

#[test]
fn test_source_requires_target() {
    let dir = setup_test_checkout();
    let output = gn_patcher(dir.path(), &["apply", "BUILD.gn", "--source", "x.cc"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("need a target"));
}

#[test]
fn test_directory_without_scripts() {
    let dir = TempDir::new().unwrap();
    let output = gn_patcher(dir.path(), &["check", ".", "--pdfium"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No BUILD.gn files found"));
}

#[test]
fn test_tokens() {
    let dir = setup_test_checkout();
    let output = gn_patcher(dir.path(), &["tokens", "BUILD.gn"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Identifier"));
    assert!(stdout.contains("\"pdfium_common_config\""));
    assert!(stdout.contains("BracketOpen"));
}

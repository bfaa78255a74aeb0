//! End-to-end tests for the locally CLI
//!
//! These tests run the actual binary and check its output and exit status.

mod common;

use common::*;
use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI inside `workspace` with user settings isolated to it.
fn run_locally(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_locally"))
        .args(args)
        .current_dir(workspace)
        .env("XDG_CONFIG_HOME", workspace.join("xdg"))
        .env_remove("LOCALLY_MANIFEST")
        .env_remove("LOCALLY_CACHE")
        .output()
        .expect("Failed to execute locally")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Integrity commands
// =============================================================================

#[test]
fn test_hash_prints_record() {
    let ws = Workspace::new();
    std::fs::write(ws.root().join("payload.bin"), PAYLOAD).unwrap();

    let output = run_locally(ws.root(), &["-q", "hash", "payload.bin"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), PAYLOAD_RECORD);
}

#[test]
fn test_hash_sha256() {
    let ws = Workspace::new();
    std::fs::write(ws.root().join("empty"), b"").unwrap();

    let output = run_locally(ws.root(), &["-q", "hash", "--algorithm", "sha256", "empty"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855 0"
    );
}

#[test]
fn test_verify_ok_and_mismatch() {
    let ws = Workspace::new();
    std::fs::write(ws.root().join("payload.bin"), PAYLOAD).unwrap();

    let ok = run_locally(ws.root(), &["verify", "payload.bin", PAYLOAD_RECORD]);
    assert!(ok.status.success(), "{}", stderr(&ok));

    std::fs::write(ws.root().join("payload.bin"), b"9876543210").unwrap();
    let bad = run_locally(ws.root(), &["verify", "payload.bin", PAYLOAD_RECORD]);
    assert!(!bad.status.success());
    assert!(stderr(&bad).contains("hash/size mismatch"), "{}", stderr(&bad));
}

#[test]
fn test_verify_rejects_malformed_record() {
    let ws = Workspace::new();
    std::fs::write(ws.root().join("payload.bin"), PAYLOAD).unwrap();

    let output = run_locally(ws.root(), &["verify", "payload.bin", "not-a-record"]);
    assert!(!output.status.success());
}

// =============================================================================
// run
// =============================================================================

#[cfg(unix)]
#[test]
fn test_run_prints_tail() {
    let ws = Workspace::new();
    let output = run_locally(
        ws.root(),
        &["run", "--max-lines", "2", "for i in 1 2 3 4; do echo n$i; done"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "n3\nn4\n");
}

#[cfg(unix)]
#[test]
fn test_run_failure_exits_nonzero() {
    let ws = Workspace::new();
    let output = run_locally(ws.root(), &["run", "echo boom; exit 3"]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "boom\n");
    assert!(stderr(&output).contains("exited with code 3"), "{}", stderr(&output));
}

// =============================================================================
// Manifest commands
// =============================================================================

#[test]
fn test_fetch_from_cache_only() {
    let ws = Workspace::new();
    ws.place_archiver();
    ws.place("payload.bin", PAYLOAD);
    std::fs::write(
        ws.root().join("locally.toml"),
        format!(
            r#"{ARCHIVER_ENTRY}
            [[dependency]]
            filename = "payload.bin"
            integrity = "{PAYLOAD_RECORD}"
            url = "http://127.0.0.1:9/never"
            check = "payload"
            "#
        ),
    )
    .unwrap();

    let output = run_locally(ws.root(), &["fetch"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("hashsize ok"), "{}", stdout(&output));
}

#[test]
fn test_missing_manifest_fails() {
    let ws = Workspace::new();
    let output = run_locally(ws.root(), &["-m", "nope.toml", "fetch"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.toml"), "{}", stderr(&output));
}

#[test]
fn test_manifest_order_violation_reported() {
    let ws = Workspace::new();
    std::fs::write(
        ws.root().join("locally.toml"),
        r#"
        [[dependency]]
        filename = "gcc.7z"
        url = "http://127.0.0.1:9/never"
        check = "mingw"
        "#,
    )
    .unwrap();

    let output = run_locally(ws.root(), &["unpack"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("dependency order violation"), "{}", stderr(&output));
}

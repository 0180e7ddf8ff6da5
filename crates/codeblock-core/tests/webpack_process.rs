//! Integration tests for the node/webpack process path.
//!
//! A shell script stands in for `node`: it reads the bundle request from the
//! environment the way the driver does and behaves as scripted.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use codeblock_core::compile::{CompilerConfig, EphemeralCompiler, StagingArea};
use codeblock_core::Error;
use tempfile::TempDir;

/// Pulls `outputDir` and `entry` out of the request JSON.
const EXTRACT: &str = r#"
req="$CODEBLOCK_BUNDLE_REQUEST"
out=$(printf '%s' "$req" | sed 's/.*"outputDir":"\([^"]*\)".*/\1/')
entry=$(printf '%s' "$req" | sed 's/.*"entry":"\([^"]*\)".*/\1/')
"#;

fn fake_node(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-node");
    fs::write(&path, format!("#!/bin/sh\n{EXTRACT}\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn compiler(project: &Path, node: PathBuf) -> EphemeralCompiler {
    let config = CompilerConfig {
        node_path: Some(node),
        ..CompilerConfig::for_project(project)
    };
    EphemeralCompiler::new(config).expect("Failed to create compiler")
}

fn staging_dirs(root: &Path) -> usize {
    fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(StagingArea::PREFIX))
        .count()
}

#[tokio::test]
async fn test_bundle_read_back_with_report() {
    let bin = TempDir::new().expect("Failed to create temp dir");
    let project = TempDir::new().expect("Failed to create temp dir");
    let node = fake_node(
        bin.path(),
        r#"mkdir -p "$out"
cp "$entry" "$out/bundle.js"
echo 'loader chatter'
echo '{"errors":[],"warnings":["asset size limit"]}'"#,
    );

    let bundle = compiler(project.path(), node)
        .compile("console.log('hi')", "javascript")
        .await
        .expect("compile failed");

    assert_eq!(bundle.code, "console.log('hi')");
    assert_eq!(bundle.diagnostics.len(), 1);
    assert_eq!(bundle.diagnostics[0].message, "asset size limit");
    assert_eq!(staging_dirs(project.path()), 0);
}

#[tokio::test]
async fn test_nonzero_exit_is_compilation_error() {
    let bin = TempDir::new().expect("Failed to create temp dir");
    let project = TempDir::new().expect("Failed to create temp dir");
    let node = fake_node(bin.path(), "echo \"cannot load webpack\" >&2\nexit 2");

    let err = compiler(project.path(), node)
        .compile("1", "typescript")
        .await
        .unwrap_err();

    match err {
        Error::Compilation(message) => assert!(message.contains("cannot load webpack")),
        other => panic!("expected compilation error, got {other:?}"),
    }
    assert_eq!(staging_dirs(project.path()), 0);
}

#[tokio::test]
async fn test_timeout_kills_toolchain() {
    let bin = TempDir::new().expect("Failed to create temp dir");
    let project = TempDir::new().expect("Failed to create temp dir");
    let node = fake_node(bin.path(), "exec sleep 30");

    let config = CompilerConfig {
        node_path: Some(node),
        ..CompilerConfig::for_project(project.path()).with_timeout(Duration::from_millis(200))
    };
    let compiler = EphemeralCompiler::new(config).unwrap();

    let start = Instant::now();
    let err = compiler.compile("1", "javascript").await.unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(staging_dirs(project.path()), 0);
}

#[tokio::test]
async fn test_timeout_while_grandchild_holds_output() {
    let bin = TempDir::new().expect("Failed to create temp dir");
    let project = TempDir::new().expect("Failed to create temp dir");
    // node exits at once but leaves a process with its stdout open.
    let node = fake_node(bin.path(), "sleep 10 &\nexit 0");

    let config = CompilerConfig {
        node_path: Some(node),
        ..CompilerConfig::for_project(project.path()).with_timeout(Duration::from_millis(300))
    };
    let compiler = EphemeralCompiler::new(config).unwrap();

    let start = Instant::now();
    let err = compiler.compile("1", "javascript").await.unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(staging_dirs(project.path()), 0);
}

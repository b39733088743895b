//! CLI integration tests for stubforge.
//!
//! These tests run the binary against small header trees and check the
//! files it writes, its output streams and its exit status.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const EXAMPLE: &str = r#"namespace Example01
{
    // Simple add function (this will be the docstring)
    int add(int a, int b);

    int add(int a, int b, int c); // And this is a separate docstring, for this overload

    // A default constructor with named parameters will
    // be automatically generated in python for structs
    struct Point
    {
        int x = 0;
        int y = 0;
    };
}
"#;

/// Get the stubforge binary command, isolated from the user's global config.
fn stubforge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stubforge").unwrap();
    cmd.current_dir(dir).env("HOME", dir).arg("--no-color");
    cmd
}

/// Create a temporary directory holding the given headers.
fn header_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (path, text) in files {
        let path = tmp.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    tmp
}

// ============================================================================
// stubforge generate
// ============================================================================

#[test]
fn test_generate_writes_stub_and_bir() {
    let tmp = header_tree(&[("include/Example01.h", EXAMPLE)]);

    stubforge(tmp.path())
        .args(["generate", "include"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Generated `Example01`"));

    let stub = fs::read_to_string(tmp.path().join("Example01.pyi")).unwrap();
    assert!(stub.contains("class Example01:  # namespace"));
    assert!(stub.contains("@overload"));
    assert!(stub.contains("def __init__(self, x: int = 0, y: int = 0) -> None: ..."));

    let bir = fs::read_to_string(tmp.path().join("Example01.bir.json")).unwrap();
    assert!(bir.contains("\"format\": \"bir\""));
    assert!(bir.contains("\"qualified_name\": \"Example01::Point\""));
}

#[test]
fn test_generate_module_and_out_dir() {
    let tmp = header_tree(&[("a.h", "int answer();")]);

    stubforge(tmp.path())
        .args(["generate", "a.h", "--module", "mylib", "--out-dir", "out", "--no-bir"])
        .assert()
        .success();

    assert!(tmp.path().join("out/mylib.pyi").exists());
    assert!(!tmp.path().join("out/mylib.bir.json").exists());
}

#[test]
fn test_generate_reads_project_config() {
    let tmp = header_tree(&[
        ("a.h", "namespace detail { int hidden(); }\nint shown();"),
        (
            ".stubforge/config.toml",
            "[filter]\nexclude = [\"^detail::\"]\n\n[stub]\nmodule_name = \"configured\"\n",
        ),
    ]);

    stubforge(tmp.path()).args(["generate", "a.h"]).assert().success();

    let stub = fs::read_to_string(tmp.path().join("configured.pyi")).unwrap();
    assert!(stub.contains("def shown() -> int: ..."));
    assert!(!stub.contains("hidden"));
}

#[test]
fn test_generate_missing_input_fails() {
    let tmp = header_tree(&[]);

    stubforge(tmp.path())
        .args(["generate", "missing.h"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no such file or directory"));
}

#[test]
fn test_name_conflict_is_fatal() {
    let tmp = header_tree(&[("a.h", "struct Thing { int a; };\nvoid Thing();\n")]);

    stubforge(tmp.path())
        .args(["generate", "a.h"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fatal[name-conflict]"))
        .stderr(predicate::str::contains("no BIR produced"));

    assert!(!tmp.path().join("a.pyi").exists());
}

// ============================================================================
// stubforge dump
// ============================================================================

#[test]
fn test_dump_prints_bir_document() {
    let tmp = header_tree(&[("Example01.h", EXAMPLE)]);

    stubforge(tmp.path())
        .args(["dump", "Example01.h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": 1"))
        .stdout(predicate::str::contains("\"kind\": \"overload_set\""));

    assert!(!tmp.path().join("Example01.pyi").exists());
}

// ============================================================================
// stubforge check
// ============================================================================

#[test]
fn test_check_reports_warnings() {
    let tmp = header_tree(&[(
        "a.h",
        "int add(int a, int b) { return a + b; }\nint add(int x, int y) { return x; }\n",
    )]);

    stubforge(tmp.path())
        .args(["check", "a.h"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning[duplicate-definition]"))
        .stderr(predicate::str::contains("Checked 1 headers"));
}

#[test]
fn test_check_deny_warnings_exits_with_two() {
    let tmp = header_tree(&[("a.h", "template <typename T> T id(T v);\n")]);

    stubforge(tmp.path())
        .args(["check", "a.h", "--deny-warnings"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported-construct"));
}

#[test]
fn test_config_deny_warnings_exits_with_two() {
    let tmp = header_tree(&[
        ("a.h", "template <typename T> T id(T v);\n"),
        (".stubforge/config.toml", "[diagnostics]\ndeny_warnings = true\n"),
    ]);

    stubforge(tmp.path())
        .args(["check", "a.h"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("warnings are denied"));
}

#[test]
fn test_check_json_output() {
    let tmp = header_tree(&[("a.h", "int counter;\n")]);

    let output = stubforge(tmp.path())
        .args(["check", "a.h", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &diagnostics[0];
    assert_eq!(first["severity"], "warning");
    assert_eq!(first["code"], "unsupported-construct");
}

#[test]
fn test_clean_headers_pass_check() {
    let tmp = header_tree(&[("Example01.h", EXAMPLE)]);

    stubforge(tmp.path())
        .args(["check", "Example01.h", "--deny-warnings"])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 errors, 0 warnings"));
}

// ============================================================================
// stubforge completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = header_tree(&[]);

    stubforge(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stubforge"));
}

#[test]
fn test_requires_inputs() {
    let tmp = header_tree(&[]);

    stubforge(tmp.path()).arg("generate").assert().failure();
}

//! CLI integration tests for slipway.
//!
//! These tests run the real binary against a stub container engine: a
//! shell script named `docker` placed first on PATH inside a temporary
//! directory. The stub answers every engine subcommand the pipeline
//! uses and can be told to fail on a substring of the invocation via
//! the `SLIPWAY_STUB_FAIL` environment variable.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const STUB_ENGINE: &str = r#"#!/bin/sh
all="$*"
if [ -n "$SLIPWAY_STUB_FAIL" ]; then
  case "$all" in
    *"$SLIPWAY_STUB_FAIL"*)
      echo "stub engine failure: $SLIPWAY_STUB_FAIL" >&2
      exit 1
      ;;
  esac
fi
cmd="$1"; shift
case "$cmd" in
  run) echo stub-build-ctr ;;
  create) echo stub-runtime-ctr ;;
  exec) : ;;
  cp)
    dst="$2"
    case "$dst" in
      *:*) : ;;
      *) printf 'stub-binary' > "$dst" ;;
    esac
    ;;
  commit) echo sha256:stubimage ;;
  save)
    shift
    tar_path="$1"
    workdir=$(mktemp -d)
    echo '[]' > "$workdir/manifest.json"
    tar -cf "$tar_path" -C "$workdir" manifest.json
    rm -rf "$workdir"
    ;;
  load) echo "Loaded image ID: sha256:stubimage" ;;
  images) echo sha256:stubimage ;;
  tag) : ;;
  rm) : ;;
  *) echo "stub: unknown command $cmd" >&2; exit 1 ;;
esac
exit 0
"#;

/// A project directory with a stub engine on PATH.
struct TestProject {
    tmp: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();

        let bin_dir = tmp.path().join("stub-bin");
        fs::create_dir(&bin_dir).unwrap();
        let stub = bin_dir.join("docker");
        fs::write(&stub, STUB_ENGINE).unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let project = tmp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("excuse.ts"), "console.log(\"excuse\");").unwrap();

        TestProject { tmp }
    }

    fn dir(&self) -> std::path::PathBuf {
        self.tmp.path().join("project")
    }

    fn slipway(&self) -> Command {
        let mut cmd = Command::cargo_bin("slipway").unwrap();
        let path = format!(
            "{}:{}",
            self.tmp.path().join("stub-bin").display(),
            std::env::var("PATH").unwrap_or_default()
        );
        cmd.current_dir(self.dir()).env("PATH", path);
        cmd
    }

    fn artifact(&self, name: &str) -> std::path::PathBuf {
        self.dir().join(name)
    }
}

fn assert_non_empty(path: &Path) {
    assert!(path.exists(), "{} missing", path.display());
    assert!(fs::metadata(path).unwrap().len() > 0, "{} empty", path.display());
}

// ============================================================================
// successful runs
// ============================================================================

#[test]
fn test_zero_arg_run_exports_all_artifacts() {
    let project = TestProject::new();

    project
        .slipway()
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Container image exported as dagger-excuse-deno.tar",
        ));

    assert_non_empty(&project.artifact("excuse-mac"));
    assert_non_empty(&project.artifact("excuse-win.exe"));
    assert_non_empty(&project.artifact("excuse-linux"));
    assert_non_empty(&project.artifact("dagger-excuse-deno.tar"));
}

#[test]
fn test_rerun_over_existing_artifacts_succeeds() {
    let project = TestProject::new();

    project.slipway().assert().success();
    // Prior artifacts on disk must not make a second run fail.
    project.slipway().assert().success();
}

#[test]
fn test_parallel_run_exports_all_artifacts() {
    let project = TestProject::new();

    project.slipway().arg("--parallel").assert().success();

    assert_non_empty(&project.artifact("excuse-mac"));
    assert_non_empty(&project.artifact("excuse-win.exe"));
    assert_non_empty(&project.artifact("excuse-linux"));
    assert_non_empty(&project.artifact("dagger-excuse-deno.tar"));
}

#[test]
fn test_json_output_is_machine_readable() {
    let project = TestProject::new();

    let output = project
        .slipway()
        .args(["--message-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut saw_finished = false;
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        if value["reason"] == "pipeline-finished" {
            assert_eq!(value["success"], true);
            assert_eq!(value["artifacts"], 4);
            saw_finished = true;
        }
    }
    assert!(saw_finished);
}

// ============================================================================
// failure injection
// ============================================================================

#[test]
fn test_provisioning_failure_produces_nothing() {
    let project = TestProject::new();

    project
        .slipway()
        .env("SLIPWAY_STUB_FAIL", "apt-get install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("stub engine failure"));

    assert!(!project.artifact("excuse-mac").exists());
    assert!(!project.artifact("excuse-linux").exists());
    assert!(!project.artifact("dagger-excuse-deno.tar").exists());
}

#[test]
fn test_compile_failure_stops_before_image() {
    let project = TestProject::new();

    project
        .slipway()
        .env("SLIPWAY_STUB_FAIL", "x86_64-pc-windows-msvc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("windows"));

    assert!(!project.artifact("dagger-excuse-deno.tar").exists());
}

#[test]
fn test_tagging_failure_leaves_artifacts_on_disk() {
    let project = TestProject::new();

    project
        .slipway()
        .env("SLIPWAY_STUB_FAIL", "load -i")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tagging"));

    // Partial success: everything was already exported.
    assert_non_empty(&project.artifact("excuse-mac"));
    assert_non_empty(&project.artifact("excuse-win.exe"));
    assert_non_empty(&project.artifact("excuse-linux"));
    assert_non_empty(&project.artifact("dagger-excuse-deno.tar"));
}

// ============================================================================
// --check
// ============================================================================

#[test]
fn test_check_after_successful_run() {
    let project = TestProject::new();

    project.slipway().assert().success();
    project.slipway().arg("--check").assert().success();
}

#[test]
fn test_check_without_artifacts_fails() {
    let project = TestProject::new();

    project
        .slipway()
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

// ============================================================================
// argument handling
// ============================================================================

#[test]
fn test_unknown_program_is_rejected() {
    let project = TestProject::new();

    project
        .slipway()
        .args(["--program", "nonesuch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown program"));
}

#[test]
fn test_missing_source_dir_is_rejected() {
    let project = TestProject::new();

    project
        .slipway()
        .args(["--source-dir", "no/such/dir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

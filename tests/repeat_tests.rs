//! Repeated-collection session tests
//!
//! Runs `repeat` against the scripted fake toolchain and checks the per-run
//! directory layout, the tee'd logs, and the session manifest.

#![cfg(unix)]

use std::path::{Path, PathBuf};

use afinar::summary::SweepSummary;
use assert_cmd::Command;
use predicates::prelude::*;

fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct Setup {
    compiler: PathBuf,
    wat2wasm: PathBuf,
    node: PathBuf,
    config: PathBuf,
}

fn setup(dir: &Path) -> Setup {
    let compiler = dir.join("fake-compiler");
    let wat2wasm = dir.join("fake-wat2wasm");
    let node = dir.join("fake-node");
    write_script(&compiler, "cat \"$1\"");
    write_script(&wat2wasm, "cp \"$1\" \"$3\"");
    write_script(&node, "printf '42'");

    let bench = dir.join("rt02-tail-factorial.tub");
    std::fs::write(&bench, "fn main() { factorial(10) }\n").unwrap();

    let config = dir.join("config.json");
    std::fs::write(
        &config,
        format!(
            r#"{{
                "runs": 2,
                "warmup_runs": 0,
                "benchmarks": [{{"name": "rt02-tail-factorial", "path": "{}", "expected": "42"}}],
                "variants": [{{"name": "O2", "flags": ["-O2"]}}]
            }}"#,
            bench.display()
        ),
    )
    .unwrap();

    Setup {
        compiler,
        wat2wasm,
        node,
        config,
    }
}

fn repeat_cmd(dir: &Path, setup: &Setup, results_root: &Path, runs: &str) -> Command {
    let mut cmd = Command::cargo_bin("afinar").unwrap();
    cmd.arg("repeat")
        .arg("--runs")
        .arg(runs)
        .arg("--project-root")
        .arg(dir)
        .arg("--config")
        .arg(&setup.config)
        .arg("--results-root")
        .arg(results_root)
        .arg("--compiler")
        .arg(&setup.compiler)
        .arg("--wat2wasm")
        .arg(&setup.wat2wasm)
        .arg("--node")
        .arg(&setup.node);
    cmd
}

#[test]
fn test_repeat_isolates_runs_and_writes_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path());
    let results_root = dir.path().join("batch_runs");

    repeat_cmd(dir.path(), &setup, &results_root, "2")
        .arg("--")
        .arg("--skip-build")
        .arg("--skip-tests")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Run 1/2 ==="))
        .stdout(predicate::str::contains("=== Run 2/2 ==="))
        .stdout(predicate::str::contains("Wrote manifest to"));

    for run in ["run1", "run2"] {
        let run_dir = results_root.join(run);
        assert!(run_dir.join("results.csv").exists());
        let summary = SweepSummary::from_path(&run_dir.join("summary.json")).unwrap();
        assert_eq!(summary.variant_stats.len(), 1);

        let log = std::fs::read_to_string(run_dir.join("collect.log")).unwrap();
        assert!(log.starts_with("$ "));
        assert!(log.contains("[OK] rt02-tail-factorial / O2"));
        assert!(log.trim_end().ends_with("[exit 0]"));
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(results_root.join("manifest.json")).unwrap())
            .unwrap();
    let runs = manifest["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["run"], 1);
    assert_eq!(runs[1]["run"], 2);
    for record in runs {
        assert_eq!(record["top_delta"]["benchmark"], "rt02-tail-factorial");
        assert_eq!(record["top_delta"]["variant"], "O2");
        assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
        // paths are recorded relative to the project root
        assert!(!record["summary"].as_str().unwrap().starts_with('/'));
    }
}

#[test]
fn test_repeat_stops_on_failed_collect() {
    let dir = tempfile::tempdir().unwrap();
    let setup = setup(dir.path());
    let results_root = dir.path().join("batch_runs");

    // No ./make in the project root and no skip flags: the first inner
    // collect fails at the build step.
    repeat_cmd(dir.path(), &setup, &results_root, "2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Collect run failed"));
    assert!(!results_root.join("manifest.json").exists());
    assert!(!results_root.join("run2").exists());
}

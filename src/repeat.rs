//! Repeated collection runs with isolated per-run artifacts
//!
//! Re-invokes this binary's `collect` subcommand N times, storing each run's
//! results, summary, intermediates, and log in its own `run{idx}` directory,
//! then writes a manifest with one top-delta snapshot per run.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::SweepSummary;
use crate::tools::Toolchain;

/// Knobs for a repeated-run session
#[derive(Debug, Clone)]
pub struct RepeatOptions {
    /// How many times to run the collection pipeline
    pub runs: u32,
    pub project_root: PathBuf,
    pub config: PathBuf,
    /// Directory receiving one subdirectory per run
    pub results_root: PathBuf,
    pub tools: Toolchain,
    /// Skip the project build after the first run
    pub skip_build_after_first: bool,
    /// Skip the regression tests after the first run
    pub skip_tests_after_first: bool,
    /// Extra arguments forwarded to every inner collect invocation
    pub extra_args: Vec<String>,
}

/// Snapshot of the largest observed delta in one run's summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopDelta {
    pub benchmark: String,
    pub variant: String,
    pub delta_pct: f64,
    pub best_order: String,
    pub worst_order: String,
}

/// Metadata for one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: u32,
    pub summary: String,
    pub results: String,
    pub log: String,
    /// ISO-8601 UTC completion timestamp
    pub timestamp: String,
    pub top_delta: TopDelta,
}

/// Append-only manifest over all runs of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub runs: Vec<RunRecord>,
}

/// Spawn a command, tee its output to a log file while echoing it live
fn run_logged(mut cmd: Command, log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut log = fs::File::create(log_path)
        .with_context(|| format!("Failed to create {}", log_path.display()))?;
    writeln!(log, "$ {cmd:?}\n")?;
    let log = Arc::new(Mutex::new(log));

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn collect run")?;

    let stderr = child.stderr.take().expect("piped stderr");
    let stderr_log = Arc::clone(&log);
    let stderr_thread = std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
            eprintln!("{line}");
            if let Ok(mut log) = stderr_log.lock() {
                let _ = writeln!(log, "{line}");
            }
        }
    });

    let stdout = child.stdout.take().expect("piped stdout");
    for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
        println!("{line}");
        if let Ok(mut log) = log.lock() {
            let _ = writeln!(log, "{line}");
        }
    }

    let status = child.wait().context("Failed to wait for collect run")?;
    let _ = stderr_thread.join();
    if let Ok(mut log) = log.lock() {
        let _ = writeln!(log, "\n[exit {}]", status.code().unwrap_or(-1));
    }
    if !status.success() {
        bail!("Collect run failed (see {})", log_path.display());
    }
    Ok(())
}

/// A path relative to the project root where possible, verbatim otherwise
fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Run the collection pipeline N times and write the session manifest
pub fn run_repeat(options: &RepeatOptions) -> Result<()> {
    let root = &options.project_root;
    fs::create_dir_all(&options.results_root)
        .with_context(|| format!("Failed to create {}", options.results_root.display()))?;

    let exe = std::env::current_exe().context("Failed to locate this executable")?;
    let mut metadata = Vec::with_capacity(options.runs as usize);

    for idx in 1..=options.runs {
        let run_dir = options.results_root.join(format!("run{idx}"));
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create {}", run_dir.display()))?;
        let summary_path = run_dir.join("summary.json");
        let results_path = run_dir.join("results.csv");
        let out_dir = run_dir.join("out");
        let log_path = run_dir.join("collect.log");

        let mut cmd = Command::new(&exe);
        cmd.arg("collect")
            .arg("--project-root")
            .arg(root)
            .arg("--config")
            .arg(&options.config)
            .arg("--results")
            .arg(&results_path)
            .arg("--summary")
            .arg(&summary_path)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg("--compiler")
            .arg(&options.tools.compiler)
            .arg("--wat2wasm")
            .arg(&options.tools.wat2wasm)
            .arg("--node")
            .arg(&options.tools.node);
        if options.skip_tests_after_first && idx > 1 {
            cmd.arg("--skip-tests");
        }
        if options.skip_build_after_first && idx > 1 {
            cmd.arg("--skip-build");
        }
        cmd.args(&options.extra_args);

        println!("\n=== Run {idx}/{} ===", options.runs);
        run_logged(cmd, &log_path)?;

        // Digest: largest delta in this run's summary; first entry wins ties.
        let summary = SweepSummary::from_path(&summary_path)?;
        let top_entry = summary
            .variant_stats
            .iter()
            .reduce(|best, row| if row.delta_pct > best.delta_pct { row } else { best })
            .with_context(|| format!("Summary {} has no variant stats", summary_path.display()))?;

        metadata.push(RunRecord {
            run: idx,
            summary: relative_display(&summary_path, root),
            results: relative_display(&results_path, root),
            log: relative_display(&log_path, root),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            top_delta: TopDelta {
                benchmark: top_entry.benchmark.clone(),
                variant: top_entry.variant.clone(),
                delta_pct: top_entry.delta_pct,
                best_order: top_entry.best_order.clone(),
                worst_order: top_entry.worst_order.clone(),
            },
        });
    }

    let manifest_path = options.results_root.join("manifest.json");
    let manifest = RunManifest { runs: metadata };
    let text = serde_json::to_string_pretty(&manifest).expect("manifest serialization");
    fs::write(&manifest_path, text)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;
    println!("\nWrote manifest to {}", manifest_path.display());
    Ok(())
}

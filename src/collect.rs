//! Collection pipeline: build, test, sweep, summarize
//!
//! One `collect` invocation rebuilds the compiler project, runs its
//! regression suite, executes a full autotuning sweep, and distills the
//! results CSV into a summary document. The build and test steps are
//! external-collaborator invocations; each can be skipped independently.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::AutotuneConfig;
use crate::csv_table;
use crate::summary::{print_human_summary, summarize_pass_orders, summarize_variants, SweepSummary};
use crate::sweep::{run_sweep, SweepOptions};
use crate::tools::Toolchain;

/// How many top deltas the human digest prints
const DIGEST_TOP_N: usize = 10;

/// Knobs for one collection run
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub project_root: PathBuf,
    pub config: PathBuf,
    pub results: PathBuf,
    pub summary: PathBuf,
    pub out_dir: PathBuf,
    pub tools: Toolchain,
    /// Skip the project build step
    pub skip_build: bool,
    /// Skip the project regression tests
    pub skip_tests: bool,
    /// Skip the sweep and reuse an existing results CSV
    pub skip_sweep: bool,
    /// Override the configured number of timed runs
    pub runs: Option<u32>,
    /// Override the configured number of warm-up runs
    pub warmup: Option<u32>,
}

/// Run an external pipeline step with inherited stdio, failing on non-zero exit
fn run_step(program: &str, args: &[&str], cwd: &Path) -> Result<()> {
    println!("[collect] running: {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .with_context(|| format!("Failed to spawn {program}"))?;
    if !status.success() {
        bail!(
            "Command '{program}' failed with exit code {}",
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}

/// Execute the full collection pipeline
pub fn run_collect(options: &CollectOptions) -> Result<()> {
    if !options.skip_build {
        run_step("./make", &[], &options.project_root)?;
    }
    if !options.skip_tests {
        run_step("./make", &["test"], &options.project_root)?;
    }

    if !options.skip_sweep {
        let config = AutotuneConfig::from_path(&options.config)?;
        options.tools.ensure_available()?;

        let sweep_options = SweepOptions {
            output_dir: options.out_dir.clone(),
            runs: options.runs.unwrap_or(config.runs),
            warmup_runs: options.warmup.unwrap_or(config.warmup_runs),
        };
        let outcome = run_sweep(&config, &options.tools, &sweep_options);
        if outcome.rows.is_empty() {
            bail!(
                "No successful trials out of {} attempted; nothing to summarize",
                outcome.attempted
            );
        }
        csv_table::write_results(&outcome.rows, &options.results)?;
        println!(
            "\nWrote {} of {} attempted rows to {}",
            outcome.rows.len(),
            outcome.attempted,
            options.results.display()
        );
    }

    // Re-parse the CSV rather than summarizing in-memory rows: the summary
    // must reflect exactly what the persisted table says.
    let rows = csv_table::parse_results(&options.results)?;
    info!(rows = rows.len(), "parsed results table");

    let variant_stats = summarize_variants(&rows);
    let pass_order_stats = summarize_pass_orders(&rows);
    let summary = SweepSummary::new(
        options.config.display().to_string(),
        variant_stats,
        pass_order_stats,
    );
    summary.write_json(&options.summary)?;
    println!("[collect] wrote summary to {}", options.summary.display());

    print_human_summary(&summary, DIGEST_TOP_N);
    Ok(())
}

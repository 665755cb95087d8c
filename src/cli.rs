//! CLI argument parsing for Afinar

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "afinar")]
#[command(version)]
#[command(about = "Compiler pass-ordering autotuner and benchmark pipeline", long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: CommandKind,
}

#[derive(Subcommand, Debug)]
pub enum CommandKind {
    /// Run one full benchmark × variant × pass-ordering sweep
    Sweep(SweepArgs),
    /// Rebuild, test, sweep, and summarize in one pipeline
    Collect(CollectArgs),
    /// Aggregate multiple sweep summaries into ranked metrics
    Aggregate(AggregateArgs),
    /// Run the collection pipeline repeatedly with isolated artifacts
    Repeat(RepeatArgs),
    /// Render the benchmark feature correlation table
    Features(FeaturesArgs),
}

/// Locations of the external tools, shared by sweep-running subcommands
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Path to the compiler executable
    #[arg(long, default_value = "build/compiler")]
    pub compiler: PathBuf,

    /// wat2wasm executable
    #[arg(long, default_value = "wat2wasm")]
    pub wat2wasm: String,

    /// Node.js executable
    #[arg(long, default_value = "node")]
    pub node: String,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Path to the autotuning configuration JSON
    #[arg(long, default_value = "autotuning/config/default.json")]
    pub config: PathBuf,

    /// Path to write CSV results
    #[arg(long, default_value = "autotuning/results.csv")]
    pub output: PathBuf,

    /// Directory for intermediate WAT/WASM artifacts
    #[arg(long = "out-dir", default_value = "autotuning/out")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Override number of timed runs per variant
    #[arg(long)]
    pub runs: Option<u32>,

    /// Override number of warm-up runs per variant
    #[arg(long)]
    pub warmup: Option<u32>,
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Repository root of the compiler project
    #[arg(long = "project-root", default_value = ".")]
    pub project_root: PathBuf,

    /// Autotuning configuration JSON
    #[arg(long, default_value = "research_tests/config.json")]
    pub config: PathBuf,

    /// Autotuning results CSV
    #[arg(long, default_value = "artifacts/research/results.csv")]
    pub results: PathBuf,

    /// Summary JSON output path
    #[arg(long, default_value = "artifacts/research/summary.json")]
    pub summary: PathBuf,

    /// Directory for intermediate sweep artifacts
    #[arg(long = "out-dir", default_value = "artifacts/research/out")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Skip the project build step
    #[arg(long = "skip-build")]
    pub skip_build: bool,

    /// Skip the project regression tests
    #[arg(long = "skip-tests")]
    pub skip_tests: bool,

    /// Skip the sweep and summarize an existing results CSV
    #[arg(long = "skip-sweep")]
    pub skip_sweep: bool,

    /// Override number of timed runs per variant
    #[arg(long)]
    pub runs: Option<u32>,

    /// Override number of warm-up runs per variant
    #[arg(long)]
    pub warmup: Option<u32>,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Repository root used for auto-discovery of summaries
    #[arg(long = "project-root", default_value = ".")]
    pub project_root: PathBuf,

    /// Explicit summary.json paths to aggregate
    #[arg(long, num_args = 0.., value_name = "PATH")]
    pub summaries: Vec<PathBuf>,

    /// Directory for output tables
    #[arg(long = "out-dir", default_value = "docs/figures")]
    pub out_dir: PathBuf,

    /// Path to write the aggregated metrics JSON
    #[arg(long, default_value = "artifacts/research/aggregated_metrics.json")]
    pub metrics: PathBuf,

    /// How many top deltas to include
    #[arg(long = "top-n", default_value = "10")]
    pub top_n: usize,
}

#[derive(Args, Debug)]
pub struct RepeatArgs {
    /// How many times to run the pipeline
    #[arg(long, default_value = "3")]
    pub runs: u32,

    /// Repository root of the compiler project
    #[arg(long = "project-root", default_value = ".")]
    pub project_root: PathBuf,

    /// Autotuning configuration JSON
    #[arg(long, default_value = "research_tests/config.json")]
    pub config: PathBuf,

    /// Directory to store per-run artifacts
    #[arg(long = "results-root", default_value = "artifacts/research/batch_runs")]
    pub results_root: PathBuf,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Skip the regression tests after the first run to save time
    #[arg(long = "skip-tests-after-first")]
    pub skip_tests_after_first: bool,

    /// Skip the project build after the first run to save time
    #[arg(long = "skip-build-after-first")]
    pub skip_build_after_first: bool,

    /// Additional arguments passed through to every collect run (after --)
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Directory holding run*/summary.json batch outputs
    #[arg(long = "batch-runs", default_value = "artifacts/research/batch_runs")]
    pub batch_runs: PathBuf,

    /// Aggregated metrics JSON produced by `aggregate`
    #[arg(long, default_value = "artifacts/research/aggregated_metrics.json")]
    pub metrics: PathBuf,

    /// Benchmark feature catalog JSON (benchmark name → features)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Path for the CSV table
    #[arg(long = "out-csv", default_value = "docs/figures/benchmark_features_table.csv")]
    pub out_csv: PathBuf,

    /// Path for the LaTeX table
    #[arg(long = "out-latex", default_value = "docs/benchmark_features_table.tex")]
    pub out_latex: PathBuf,
}

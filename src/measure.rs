//! Variant Measurement Engine
//!
//! Runs one (benchmark, variant, pass-ordering) trial end to end: compile,
//! convert, warm up, time, gate on output consistency, and reduce the timing
//! sequence to quartiles. Every failure here is trial-scoped; the sweep
//! driver decides whether to continue.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::config::Benchmark;
use crate::stats;
use crate::tools::{ToolError, Toolchain};

/// Errors that fail a single trial without aborting the sweep
#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("Benchmark file not found: {0}")]
    BenchmarkNotFound(PathBuf),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Inconsistent outputs for {benchmark}/{variant}: {outputs:?}")]
    InconsistentOutputs {
        benchmark: String,
        variant: String,
        outputs: Vec<String>,
    },

    #[error("Output mismatch for {benchmark}/{variant}: expected {expected}, got {actual}")]
    OutputMismatch {
        benchmark: String,
        variant: String,
        expected: String,
        actual: String,
    },

    #[error("No timing data recorded")]
    NoTimingData,

    #[error("Failed to stat artifact {path}: {source}")]
    ArtifactSize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One successful timed trial of a (benchmark, variant, pass-ordering) triple
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    pub benchmark: String,
    pub variant: String,
    pub pass_order: String,
    /// Space-joined flags exactly as passed to the compiler
    pub flags: String,
    pub wat_size: u64,
    pub wasm_size: u64,
    pub runs: u32,
    pub warmup_runs: u32,
    pub p25_ms: f64,
    pub median_ms: f64,
    pub p75_ms: f64,
    /// Canonical output all timed runs agreed on
    pub result: String,
}

/// Apply the correctness gate to the outputs of the timed runs
///
/// All outputs must be textually identical, and when the benchmark declares
/// an expected output the canonical value must equal it.
fn canonical_output(
    benchmark: &str,
    variant: &str,
    outputs: &[String],
    expected: Option<&str>,
) -> Result<String, MeasureError> {
    let canonical = outputs.first().ok_or(MeasureError::NoTimingData)?.clone();
    if !outputs.iter().all(|output| *output == canonical) {
        return Err(MeasureError::InconsistentOutputs {
            benchmark: benchmark.to_string(),
            variant: variant.to_string(),
            outputs: outputs.to_vec(),
        });
    }
    if let Some(expected) = expected {
        if canonical != expected {
            return Err(MeasureError::OutputMismatch {
                benchmark: benchmark.to_string(),
                variant: variant.to_string(),
                expected: expected.to_string(),
                actual: canonical,
            });
        }
    }
    Ok(canonical)
}

fn artifact_size(path: &Path) -> Result<u64, MeasureError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| MeasureError::ArtifactSize {
            path: path.to_path_buf(),
            source,
        })
}

/// Measure one (benchmark, variant, pass-ordering) combination
///
/// `flags` already carries the variant's flags plus the pass-order flag; the
/// ordering only contributes its name here, for artifact naming and the
/// result row.
#[allow(clippy::too_many_arguments)]
pub fn measure_variant(
    tools: &Toolchain,
    bench: &Benchmark,
    variant_name: &str,
    flags: &[String],
    pass_order_name: &str,
    output_dir: &Path,
    runs: u32,
    warmup_runs: u32,
) -> Result<MeasurementResult, MeasureError> {
    if !bench.path.exists() {
        return Err(MeasureError::BenchmarkNotFound(bench.path.clone()));
    }

    let wat_suffix = pass_order_name.replace(' ', "_");
    let stem = format!("{}__{}__{}", bench.name, variant_name, wat_suffix);
    let wat_path = output_dir.join(format!("{stem}.wat"));
    let wasm_path = output_dir.join(format!("{stem}.wasm"));

    tools.compile(&bench.path, flags, &wat_path)?;
    tools.convert(&wat_path, &wasm_path)?;

    // Warm-up: execute but discard timings.
    for _ in 0..warmup_runs {
        tools.execute(&wasm_path, &bench.invoke)?;
    }

    let mut timings = Vec::with_capacity(runs as usize);
    let mut outputs = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        let start = Instant::now();
        let output = tools.execute(&wasm_path, &bench.invoke)?;
        timings.push(start.elapsed().as_secs_f64() * 1000.0);
        outputs.push(output);
    }

    let expected = bench.expected_text();
    let result = canonical_output(&bench.name, variant_name, &outputs, expected.as_deref())?;

    timings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    debug!(
        benchmark = %bench.name,
        variant = %variant_name,
        pass_order = %pass_order_name,
        samples = timings.len(),
        "timings collected"
    );

    Ok(MeasurementResult {
        benchmark: bench.name.clone(),
        variant: variant_name.to_string(),
        pass_order: pass_order_name.to_string(),
        flags: flags.join(" "),
        wat_size: artifact_size(&wat_path)?,
        wasm_size: artifact_size(&wasm_path)?,
        runs,
        warmup_runs,
        p25_ms: stats::p25(&timings),
        median_ms: stats::median(&timings),
        p75_ms: stats::p75(&timings),
        result,
    })
}

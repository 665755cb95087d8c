//! Sweep Driver: the benchmark × variant × pass-ordering cross product
//!
//! Iteration order is deterministic: benchmarks outer, variants middle,
//! orderings inner. A failing combination is logged and skipped; it never
//! aborts the sweep and never appears in the output table.

use std::path::PathBuf;

use tracing::warn;

use crate::config::AutotuneConfig;
use crate::measure::{measure_variant, MeasurementResult};
use crate::tools::Toolchain;

/// Knobs for one sweep invocation
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Directory for intermediate wat/wasm artifacts
    pub output_dir: PathBuf,
    /// Timed runs per combination
    pub runs: u32,
    /// Untimed warm-up runs per combination
    pub warmup_runs: u32,
}

/// Outcome of a full sweep: successful rows plus the attempt count
#[derive(Debug)]
pub struct SweepOutcome {
    pub rows: Vec<MeasurementResult>,
    pub attempted: usize,
}

/// Run the full cross product, collecting successful measurements
pub fn run_sweep(
    config: &AutotuneConfig,
    tools: &Toolchain,
    options: &SweepOptions,
) -> SweepOutcome {
    let mut rows = Vec::new();
    let mut attempted = 0;

    for bench in &config.benchmarks {
        for variant in &config.variants {
            for ordering in &config.pass_orders {
                attempted += 1;
                let mut flags = variant.flags.clone();
                if !ordering.order.is_empty() {
                    flags.push(ordering.flag());
                }
                println!("[RUN] {} / {} [{}]", bench.name, variant.name, ordering.name);
                match measure_variant(
                    tools,
                    bench,
                    &variant.name,
                    &flags,
                    &ordering.name,
                    &options.output_dir,
                    options.runs,
                    options.warmup_runs,
                ) {
                    Ok(row) => {
                        println!(
                            "[OK] {} / {} [{}]: {:.3} ms (flags: {})",
                            bench.name, variant.name, ordering.name, row.median_ms, row.flags
                        );
                        rows.push(row);
                    }
                    Err(err) => {
                        warn!(
                            benchmark = %bench.name,
                            variant = %variant.name,
                            pass_order = %ordering.name,
                            "trial failed: {err}"
                        );
                        eprintln!(
                            "[ERR] {} / {} [{}]: {}",
                            bench.name, variant.name, ordering.name, err
                        );
                    }
                }
            }
        }
    }

    SweepOutcome { rows, attempted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutotuneConfig;

    // The cross product with an unreadable compiler still attempts every
    // combination and collects zero rows.
    #[test]
    fn test_failures_are_isolated_per_combination() {
        let text = r#"{
            "benchmarks": [
                {"name": "a", "path": "/nonexistent/a.tub"},
                {"name": "b", "path": "/nonexistent/b.tub"}
            ],
            "variants": [{"name": "O1"}, {"name": "O2"}],
            "pass_orders": [
                {"name": "fwd", "order": ["inline", "unroll", "tail"]},
                {"name": "rev", "order": ["tail", "unroll", "inline"]}
            ]
        }"#;
        let config = AutotuneConfig::from_json_str(text, "inline").unwrap();
        let tools = Toolchain {
            compiler: PathBuf::from("/nonexistent/compiler"),
            wat2wasm: "wat2wasm".to_string(),
            node: "node".to_string(),
        };
        let options = SweepOptions {
            output_dir: std::env::temp_dir().join("afinar-sweep-test"),
            runs: 1,
            warmup_runs: 0,
        };
        let outcome = run_sweep(&config, &tools, &options);
        assert_eq!(outcome.attempted, 8);
        assert!(outcome.rows.is_empty());
    }
}

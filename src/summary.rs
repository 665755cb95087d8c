//! Statistical summarization of sweep results
//!
//! Reduces raw measurement rows into per-(benchmark, variant) best/worst
//! pass-order deltas and per-ordering global aggregates, and persists one
//! sweep's summary as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::measure::MeasurementResult;

/// Errors produced while persisting or loading summaries
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summary not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse summary {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Best/worst pass-order delta for one (benchmark, variant) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub benchmark: String,
    pub variant: String,
    pub best_order: String,
    pub best_flags: String,
    pub best_median_ms: f64,
    pub worst_order: String,
    pub worst_flags: String,
    pub worst_median_ms: f64,
    pub delta_ms: f64,
    pub delta_pct: f64,
}

/// Global aggregate for one pass ordering across all benchmark/variant pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOrderSummary {
    pub pass_order: String,
    pub num_samples: usize,
    pub mean_median_ms: f64,
    pub min_median_ms: f64,
    pub max_median_ms: f64,
}

/// One full sweep's summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    /// ISO-8601 UTC timestamp of summary creation
    pub generated_at: String,
    /// Source reference for the configuration that produced the sweep
    pub config: String,
    pub variant_stats: Vec<VariantSummary>,
    pub pass_order_stats: Vec<PassOrderSummary>,
}

/// Reduce rows into per-(benchmark, variant) best/worst deltas
///
/// Ties in `median_ms` resolve to the first entry in input order. Output is
/// sorted lexicographically by benchmark then variant.
pub fn summarize_variants(rows: &[MeasurementResult]) -> Vec<VariantSummary> {
    let mut groups: BTreeMap<(String, String), Vec<&MeasurementResult>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.benchmark.clone(), row.variant.clone()))
            .or_default()
            .push(row);
    }

    let mut summary = Vec::with_capacity(groups.len());
    for ((benchmark, variant), entries) in groups {
        let mut best = entries[0];
        let mut worst = entries[0];
        for row in &entries[1..] {
            if row.median_ms < best.median_ms {
                best = row;
            }
            if row.median_ms > worst.median_ms {
                worst = row;
            }
        }
        let gap = worst.median_ms - best.median_ms;
        let pct = if worst.median_ms != 0.0 {
            gap / worst.median_ms * 100.0
        } else {
            0.0
        };
        summary.push(VariantSummary {
            benchmark,
            variant,
            best_order: best.pass_order.clone(),
            best_flags: best.flags.clone(),
            best_median_ms: best.median_ms,
            worst_order: worst.pass_order.clone(),
            worst_flags: worst.flags.clone(),
            worst_median_ms: worst.median_ms,
            delta_ms: gap,
            delta_pct: pct,
        });
    }
    summary
}

/// Aggregate rows per pass ordering, sorted lexicographically by name
pub fn summarize_pass_orders(rows: &[MeasurementResult]) -> Vec<PassOrderSummary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.pass_order.clone())
            .or_default()
            .push(row.median_ms);
    }

    groups
        .into_iter()
        .map(|(pass_order, medians)| {
            let mean = medians.iter().sum::<f64>() / medians.len() as f64;
            let min = medians.iter().copied().fold(f64::INFINITY, f64::min);
            let max = medians.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            PassOrderSummary {
                pass_order,
                num_samples: medians.len(),
                mean_median_ms: mean,
                min_median_ms: min,
                max_median_ms: max,
            }
        })
        .collect()
}

impl SweepSummary {
    /// Build a summary, stamping it with the current UTC time
    pub fn new(
        config: String,
        variant_stats: Vec<VariantSummary>,
        pass_order_stats: Vec<PassOrderSummary>,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            config,
            variant_stats,
            pass_order_stats,
        }
    }

    /// Load a summary document from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, SummaryError> {
        if !path.exists() {
            return Err(SummaryError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SummaryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Persist the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<(), SummaryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SummaryError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(self).expect("summary serialization");
        fs::write(path, text).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Print a human-readable digest of one sweep's summary
pub fn print_human_summary(summary: &SweepSummary, top_n: usize) {
    println!("\n=== Top variant deltas (best vs worst pass order) ===");
    let mut ranked: Vec<&VariantSummary> = summary.variant_stats.iter().collect();
    ranked.sort_by(|a, b| {
        b.delta_pct
            .partial_cmp(&a.delta_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for entry in ranked.iter().take(top_n) {
        println!(
            "{}/{}: {} ({:.3} ms) vs {} ({:.3} ms) → Δ {:.3} ms ({:.1} %)",
            entry.benchmark,
            entry.variant,
            entry.best_order,
            entry.best_median_ms,
            entry.worst_order,
            entry.worst_median_ms,
            entry.delta_ms,
            entry.delta_pct
        );
    }

    println!("\n=== Pass order aggregates (lower is better) ===");
    let mut orders: Vec<&PassOrderSummary> = summary.pass_order_stats.iter().collect();
    orders.sort_by(|a, b| {
        a.mean_median_ms
            .partial_cmp(&b.mean_median_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for entry in orders {
        println!(
            "{}: mean={:.3} ms (min={:.3}, max={:.3}, samples={})",
            entry.pass_order,
            entry.mean_median_ms,
            entry.min_median_ms,
            entry.max_median_ms,
            entry.num_samples
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        benchmark: &str,
        variant: &str,
        pass_order: &str,
        median_ms: f64,
    ) -> MeasurementResult {
        MeasurementResult {
            benchmark: benchmark.to_string(),
            variant: variant.to_string(),
            pass_order: pass_order.to_string(),
            flags: format!("-{variant} --pass-order={pass_order}"),
            wat_size: 100,
            wasm_size: 50,
            runs: 5,
            warmup_runs: 1,
            p25_ms: median_ms - 1.0,
            median_ms,
            p75_ms: median_ms + 1.0,
            result: "42".to_string(),
        }
    }

    #[test]
    fn test_best_worst_delta_scenario() {
        let rows = vec![
            row("rt02-tail-factorial", "O2", "fast", 10.0),
            row("rt02-tail-factorial", "O2", "slow", 25.0),
        ];
        let summary = summarize_variants(&rows);
        assert_eq!(summary.len(), 1);
        let entry = &summary[0];
        assert_eq!(entry.best_order, "fast");
        assert_eq!(entry.worst_order, "slow");
        assert_eq!(entry.delta_ms, 15.0);
        assert_eq!(entry.delta_pct, 60.0);
    }

    #[test]
    fn test_median_ties_resolve_to_first_in_input_order() {
        let rows = vec![
            row("b", "v", "first", 10.0),
            row("b", "v", "second", 10.0),
        ];
        let summary = summarize_variants(&rows);
        assert_eq!(summary[0].best_order, "first");
        assert_eq!(summary[0].worst_order, "first");
        assert_eq!(summary[0].delta_ms, 0.0);
    }

    #[test]
    fn test_zero_worst_median_yields_zero_pct() {
        let rows = vec![row("b", "v", "only", 0.0)];
        let summary = summarize_variants(&rows);
        assert_eq!(summary[0].delta_pct, 0.0);
    }

    #[test]
    fn test_variant_groups_sorted_lexicographically() {
        let rows = vec![
            row("z-bench", "O2", "o", 1.0),
            row("a-bench", "O2", "o", 1.0),
            row("a-bench", "O1", "o", 1.0),
        ];
        let summary = summarize_variants(&rows);
        let keys: Vec<(&str, &str)> = summary
            .iter()
            .map(|s| (s.benchmark.as_str(), s.variant.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("a-bench", "O1"), ("a-bench", "O2"), ("z-bench", "O2")]
        );
    }

    #[test]
    fn test_pass_order_aggregates() {
        let rows = vec![
            row("a", "v", "fwd", 10.0),
            row("b", "v", "fwd", 20.0),
            row("a", "v", "rev", 5.0),
        ];
        let summary = summarize_pass_orders(&rows);
        assert_eq!(summary.len(), 2);
        let fwd = summary.iter().find(|s| s.pass_order == "fwd").unwrap();
        assert_eq!(fwd.num_samples, 2);
        assert_eq!(fwd.mean_median_ms, 15.0);
        assert_eq!(fwd.min_median_ms, 10.0);
        assert_eq!(fwd.max_median_ms, 20.0);
        // sorted by name
        assert_eq!(summary[0].pass_order, "fwd");
        assert_eq!(summary[1].pass_order, "rev");
    }

    #[test]
    fn test_summary_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let rows = vec![
            row("rt02-tail-factorial", "O2", "fast", 10.0),
            row("rt02-tail-factorial", "O2", "slow", 25.0),
        ];
        let summary = SweepSummary::new(
            "config.json".to_string(),
            summarize_variants(&rows),
            summarize_pass_orders(&rows),
        );
        summary.write_json(&path).unwrap();

        let loaded = SweepSummary::from_path(&path).unwrap();
        assert_eq!(loaded.config, "config.json");
        assert_eq!(loaded.variant_stats, summary.variant_stats);
        assert_eq!(loaded.pass_order_stats, summary.pass_order_stats);
        assert!(loaded.generated_at.ends_with('Z'));
    }

    #[test]
    fn test_missing_summary_is_not_found() {
        let err = SweepSummary::from_path(Path::new("/nonexistent/summary.json")).unwrap_err();
        assert!(matches!(err, SummaryError::NotFound(_)));
    }
}

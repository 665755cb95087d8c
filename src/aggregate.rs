//! Cross-run aggregation of repeated sweep summaries
//!
//! Combines N independently produced summaries into averaged deltas ranked
//! by optimization opportunity, plus per-ordering means of means. The mean
//! of per-summary means is intentional: it avoids re-weighting by unequal
//! per-summary sample counts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::summary::{SummaryError, SweepSummary};

/// Errors produced during cross-run aggregation
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Cross-sweep reduction, persisted as `aggregated_metrics.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Source summary paths, as given
    pub summaries: Vec<String>,
    /// `(benchmark, variant, avg_delta_pct)` sorted descending by delta
    pub top_variant_stats: Vec<(String, String, f64)>,
    /// Mean of per-summary `mean_median_ms` per pass ordering
    pub pass_order_means: BTreeMap<String, f64>,
}

/// Load every summary, failing fast on the first missing path
pub fn load_summaries(paths: &[PathBuf]) -> Result<Vec<SweepSummary>, AggregateError> {
    paths
        .iter()
        .map(|path| SweepSummary::from_path(path).map_err(AggregateError::from))
        .collect()
}

/// Discover default summary inputs under a project root
///
/// Prefers `<root>/artifacts/research/batch_runs/run*/summary.json` (sorted
/// lexicographically); falls back to the latest single summary.
pub fn find_default_summaries(root: &Path) -> Vec<PathBuf> {
    let batch_dir = root.join("artifacts").join("research").join("batch_runs");
    if batch_dir.is_dir() {
        let mut run_dirs: Vec<PathBuf> = fs::read_dir(&batch_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_dir()
                            && path
                                .file_name()
                                .and_then(|name| name.to_str())
                                .is_some_and(|name| name.starts_with("run"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        run_dirs.sort();
        let summaries: Vec<PathBuf> = run_dirs
            .into_iter()
            .map(|dir| dir.join("summary.json"))
            .filter(|path| path.exists())
            .collect();
        if !summaries.is_empty() {
            return summaries;
        }
    }
    vec![root.join("artifacts").join("research").join("summary.json")]
}

/// Mean `delta_pct` per (benchmark, variant), ranked descending
///
/// Keys are collected in encounter order across summaries; the descending
/// sort is stable, so equal means preserve that order.
pub fn aggregate_variant_deltas(summaries: &[SweepSummary]) -> Vec<(String, String, f64)> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut deltas: HashMap<(String, String), Vec<f64>> = HashMap::new();
    for summary in summaries {
        for row in &summary.variant_stats {
            let key = (row.benchmark.clone(), row.variant.clone());
            if !deltas.contains_key(&key) {
                order.push(key.clone());
            }
            deltas.entry(key).or_default().push(row.delta_pct);
        }
    }

    let mut averaged: Vec<(String, String, f64)> = order
        .into_iter()
        .map(|key| {
            let values = &deltas[&key];
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (key.0, key.1, mean)
        })
        .collect();
    averaged.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    averaged
}

/// Mean of per-summary `mean_median_ms` per pass ordering
pub fn aggregate_pass_order_means(summaries: &[SweepSummary]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for summary in summaries {
        for row in &summary.pass_order_stats {
            totals
                .entry(row.pass_order.clone())
                .or_default()
                .push(row.mean_median_ms);
        }
    }
    totals
        .into_iter()
        .map(|(order, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (order, mean)
        })
        .collect()
}

fn write_file(path: &Path, text: &str) -> Result<(), AggregateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| AggregateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let mut file = fs::File::create(path).map_err(|source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the ranked top-deltas table (top-N cutoff applied)
pub fn write_top_deltas_csv(
    stats: &[(String, String, f64)],
    top_n: usize,
    path: &Path,
) -> Result<(), AggregateError> {
    let mut text = String::from("benchmark,variant,label,avg_delta_pct\n");
    for (bench, variant, delta) in stats.iter().take(top_n) {
        text.push_str(&format!(
            "{bench},{variant},{bench} ({variant}),{delta:.4}\n"
        ));
    }
    write_file(path, &text)
}

/// Write per-ordering mean-of-means table, sorted by ordering name
pub fn write_pass_order_means_csv(
    means: &BTreeMap<String, f64>,
    path: &Path,
) -> Result<(), AggregateError> {
    let mut text = String::from("pass_order,mean_median_ms\n");
    for (order, value) in means {
        text.push_str(&format!("{order},{value:.4}\n"));
    }
    write_file(path, &text)
}

impl AggregatedMetrics {
    /// Persist the aggregated metrics as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<(), AggregateError> {
        let text = serde_json::to_string_pretty(self).expect("metrics serialization");
        write_file(path, &text)
    }

    /// Load aggregated metrics from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, AggregateError> {
        if !path.exists() {
            return Err(AggregateError::Summary(SummaryError::NotFound(
                path.to_path_buf(),
            )));
        }
        let text = fs::read_to_string(path).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| {
            AggregateError::Summary(SummaryError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
    }
}

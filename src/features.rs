//! Benchmark feature correlation table
//!
//! Joins a static per-benchmark structural-feature catalog with the resolved
//! dominant pass ordering per benchmark, weighted across variants by the
//! aggregated delta. The catalog is injectable data, not a compiled-in
//! constant, so the builder is testable against synthetic catalogs.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::majority::DominantOrders;

/// Errors produced while loading catalogs or writing tables
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Feature catalog not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse feature catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Static structural descriptors for one benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkFeatures {
    /// Loop count descriptor, e.g. "2 (nested)"
    pub loops: String,
    /// Tail-recursion presence, e.g. "Yes (tail recursion)"
    pub tail: String,
    /// Branching density, e.g. "High (if/continue)"
    pub branch: String,
}

/// Injectable per-benchmark feature catalog (benchmark name → features)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCatalog(pub BTreeMap<String, BenchmarkFeatures>);

impl FeatureCatalog {
    /// Load a catalog from a JSON file mapping benchmark names to features
    pub fn from_path(path: &Path) -> Result<Self, FeatureError> {
        if !path.exists() {
            return Err(FeatureError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| FeatureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| FeatureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One rendered row of the correlation table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub benchmark: String,
    pub loops: String,
    pub tail: String,
    pub branch: String,
    /// Dominant ordering rendered with arrows, or "n/a"
    pub dominant_order: String,
}

/// Build the correlation table: one row per catalog benchmark
///
/// Each (benchmark, variant) contributes its dominant ordering weighted by
/// the aggregated average delta for that key; the ordering with the highest
/// accumulated weight becomes the benchmark's entry.
pub fn build_table(
    catalog: &FeatureCatalog,
    dominant_orders: &DominantOrders,
    avg_deltas: &HashMap<(String, String), f64>,
) -> Vec<FeatureRow> {
    let mut per_benchmark: HashMap<&str, Vec<(String, f64)>> = HashMap::new();
    for ((bench, variant), order) in dominant_orders {
        let weight = avg_deltas
            .get(&(bench.clone(), variant.clone()))
            .copied()
            .unwrap_or(0.0);
        let weights = per_benchmark.entry(bench.as_str()).or_default();
        match weights.iter_mut().find(|(existing, _)| existing == order) {
            Some((_, total)) => *total += weight,
            None => weights.push((order.clone(), weight)),
        }
    }

    catalog
        .0
        .iter()
        .map(|(bench, features)| {
            let dominant = per_benchmark
                .get(bench.as_str())
                .and_then(|weights| {
                    // Highest accumulated weight; first inserted wins ties.
                    let mut best: Option<&(String, f64)> = None;
                    for entry in weights {
                        match best {
                            Some((_, weight)) if entry.1 <= *weight => {}
                            _ => best = Some(entry),
                        }
                    }
                    best.map(|(order, _)| order.replace('-', "→"))
                })
                .unwrap_or_else(|| "n/a".to_string());
            FeatureRow {
                benchmark: bench.clone(),
                loops: features.loops.clone(),
                tail: features.tail.clone(),
                branch: features.branch.clone(),
                dominant_order: dominant,
            }
        })
        .collect()
}

fn write_file(path: &Path, text: &str) -> Result<(), FeatureError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| FeatureError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let mut file = fs::File::create(path).map_err(|source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .map_err(|source| FeatureError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the correlation table as CSV
pub fn write_csv(rows: &[FeatureRow], path: &Path) -> Result<(), FeatureError> {
    let mut text = String::from("benchmark,loops,tail_recursion,branching,dominant_order\n");
    for row in rows {
        text.push_str(&format!(
            "{},{},{},{},{}\n",
            row.benchmark, row.loops, row.tail, row.branch, row.dominant_order
        ));
    }
    write_file(path, &text)
}

/// Write the correlation table as a LaTeX tabular
pub fn write_latex(rows: &[FeatureRow], path: &Path) -> Result<(), FeatureError> {
    let mut text = String::new();
    text.push_str("\\begin{tabular}{lllll}\n");
    text.push_str("\\toprule\n");
    text.push_str("Benchmark & Loops & Tail recursion & Branching & Dominant order \\\\\n");
    text.push_str("\\midrule\n");
    for row in rows {
        text.push_str(&format!(
            "{} & {} & {} & {} & {} \\\\\n",
            row.benchmark, row.loops, row.tail, row.branch, row.dominant_order
        ));
    }
    text.push_str("\\bottomrule\n\\end{tabular}\n");
    write_file(path, &text)
}

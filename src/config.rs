//! Autotuning configuration loading and validation
//!
//! The configuration is a JSON document naming benchmarks, flag variants,
//! and optional pass orderings. Every structural problem is surfaced here,
//! before any external tool is invoked; configuration errors must never
//! appear mid-sweep.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::pass_order::{PassOrderError, PassOrdering};

/// Default number of timed runs per trial
pub const DEFAULT_RUNS: u32 = 5;
/// Default number of untimed warm-up runs per trial
pub const DEFAULT_WARMUP_RUNS: u32 = 1;

/// Errors produced while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration must include non-empty 'benchmarks' and 'variants'")]
    EmptyCrossProduct,

    #[error("Invalid pass order configuration: {0}")]
    PassOrder(#[from] PassOrderError),
}

fn default_invoke() -> String {
    "main".to_string()
}

/// One benchmark program to measure
#[derive(Debug, Clone, Deserialize)]
pub struct Benchmark {
    /// Identity of the benchmark; must be unique within a config
    pub name: String,
    /// Path to the benchmark source file
    pub path: PathBuf,
    /// Exported symbol to invoke (defaults to `main`)
    #[serde(default = "default_invoke")]
    pub invoke: String,
    /// Expected program output; the canonical output must match it exactly
    #[serde(default)]
    pub expected: Option<serde_json::Value>,
}

impl Benchmark {
    /// The expected output as the text the execution sandbox would print
    pub fn expected_text(&self) -> Option<String> {
        self.expected.as_ref().map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// A fixed compiler-flag configuration, independent of pass ordering
#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub name: String,
    /// Compiler flags in the order they are passed
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPassOrder {
    #[serde(default)]
    name: String,
    #[serde(default)]
    order: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    runs: Option<u32>,
    warmup_runs: Option<u32>,
    #[serde(default)]
    benchmarks: Vec<Benchmark>,
    #[serde(default)]
    variants: Vec<Variant>,
    pass_orders: Option<Vec<RawPassOrder>>,
}

/// A validated autotuning configuration
#[derive(Debug, Clone)]
pub struct AutotuneConfig {
    pub runs: u32,
    pub warmup_runs: u32,
    pub benchmarks: Vec<Benchmark>,
    pub variants: Vec<Variant>,
    pub pass_orders: Vec<PassOrdering>,
    /// Source reference recorded in summaries (the config path as given)
    pub source: String,
}

impl AutotuneConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(raw, path.display().to_string())
    }

    /// Validate a configuration from an in-memory JSON string
    pub fn from_json_str(text: &str, source: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse {
                path: PathBuf::from(source),
                source: err,
            })?;
        Self::from_raw(raw, source.to_string())
    }

    fn from_raw(raw: RawConfig, source: String) -> Result<Self, ConfigError> {
        if raw.benchmarks.is_empty() || raw.variants.is_empty() {
            return Err(ConfigError::EmptyCrossProduct);
        }

        let pass_orders = match raw.pass_orders {
            None => vec![PassOrdering::default_ordering()],
            Some(entries) if entries.is_empty() => vec![PassOrdering::default_ordering()],
            Some(entries) => entries
                .iter()
                .map(|entry| PassOrdering::from_entry(&entry.name, &entry.order))
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self {
            runs: raw.runs.unwrap_or(DEFAULT_RUNS),
            warmup_runs: raw.warmup_runs.unwrap_or(DEFAULT_WARMUP_RUNS),
            benchmarks: raw.benchmarks,
            variants: raw.variants,
            pass_orders,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass_order::Pass;

    const MINIMAL: &str = r#"{
        "benchmarks": [{"name": "rt03-loop-summation", "path": "tests/rt03.tub"}],
        "variants": [{"name": "O2", "flags": ["-O2"]}]
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AutotuneConfig::from_json_str(MINIMAL, "inline").unwrap();
        assert_eq!(config.runs, DEFAULT_RUNS);
        assert_eq!(config.warmup_runs, DEFAULT_WARMUP_RUNS);
        assert_eq!(config.pass_orders.len(), 1);
        assert_eq!(config.pass_orders[0].name, "inline-unroll-tail");
        assert_eq!(config.benchmarks[0].invoke, "main");
        assert!(config.benchmarks[0].expected.is_none());
    }

    #[test]
    fn test_empty_pass_orders_falls_back_to_default() {
        let text = r#"{
            "benchmarks": [{"name": "b", "path": "b.tub"}],
            "variants": [{"name": "v"}],
            "pass_orders": []
        }"#;
        let config = AutotuneConfig::from_json_str(text, "inline").unwrap();
        assert_eq!(
            config.pass_orders[0].order,
            vec![Pass::Inline, Pass::Unroll, Pass::Tail]
        );
    }

    #[test]
    fn test_explicit_pass_orders_are_normalized() {
        let text = r#"{
            "runs": 7,
            "warmup_runs": 2,
            "benchmarks": [{"name": "b", "path": "b.tub", "expected": 42}],
            "variants": [{"name": "v", "flags": []}],
            "pass_orders": [
                {"name": "tail-first", "order": ["Tail", " inline", "UNROLL"]}
            ]
        }"#;
        let config = AutotuneConfig::from_json_str(text, "inline").unwrap();
        assert_eq!(config.runs, 7);
        assert_eq!(config.warmup_runs, 2);
        assert_eq!(config.pass_orders[0].joined(), "tail,inline,unroll");
        assert_eq!(config.benchmarks[0].expected_text().unwrap(), "42");
    }

    #[test]
    fn test_string_expected_output_is_kept_verbatim() {
        let text = r#"{
            "benchmarks": [{"name": "b", "path": "b.tub", "expected": "hello"}],
            "variants": [{"name": "v"}]
        }"#;
        let config = AutotuneConfig::from_json_str(text, "inline").unwrap();
        assert_eq!(config.benchmarks[0].expected_text().unwrap(), "hello");
    }

    #[test]
    fn test_missing_benchmarks_rejected() {
        let text = r#"{"variants": [{"name": "v"}]}"#;
        let err = AutotuneConfig::from_json_str(text, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCrossProduct));
    }

    #[test]
    fn test_missing_variants_rejected() {
        let text = r#"{"benchmarks": [{"name": "b", "path": "b.tub"}]}"#;
        let err = AutotuneConfig::from_json_str(text, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCrossProduct));
    }

    #[test]
    fn test_malformed_pass_order_fails_fast() {
        let text = r#"{
            "benchmarks": [{"name": "b", "path": "b.tub"}],
            "variants": [{"name": "v"}],
            "pass_orders": [{"name": "bad", "order": ["inline", "unroll", "loopfusion"]}]
        }"#;
        let err = AutotuneConfig::from_json_str(text, "inline").unwrap_err();
        assert!(err.to_string().contains("loopfusion"));
    }
}

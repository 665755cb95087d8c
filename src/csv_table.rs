//! Tabular results file: one CSV row per successful trial
//!
//! Fields containing commas (flag strings do) are quoted; the parser reverses
//! the quoting so a written table round-trips losslessly.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::measure::MeasurementResult;

/// Column order of the results table
pub const COLUMNS: [&str; 12] = [
    "benchmark",
    "variant",
    "pass_order",
    "flags",
    "wat_size",
    "wasm_size",
    "runs",
    "warmup_runs",
    "p25_ms",
    "median_ms",
    "p75_ms",
    "result",
];

/// Errors produced while writing or parsing the results table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Results file {path} is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Bad value '{value}' for column '{column}' in {path}")]
    BadValue {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error("No rows found in {0}")]
    Empty(PathBuf),
}

/// Escape a CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV line into fields, honoring quoted fields and doubled quotes
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

fn format_row(row: &MeasurementResult) -> String {
    [
        escape_field(&row.benchmark),
        escape_field(&row.variant),
        escape_field(&row.pass_order),
        escape_field(&row.flags),
        row.wat_size.to_string(),
        row.wasm_size.to_string(),
        row.runs.to_string(),
        row.warmup_runs.to_string(),
        row.p25_ms.to_string(),
        row.median_ms.to_string(),
        row.p75_ms.to_string(),
        escape_field(&row.result),
    ]
    .join(",")
}

/// Write results to a CSV file; writes nothing when `rows` is empty
pub fn write_results(rows: &[MeasurementResult], path: &Path) -> Result<(), TableError> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| TableError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let mut file = fs::File::create(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = COLUMNS.join(",");
    text.push('\n');
    for row in rows {
        text.push_str(&format_row(row));
        text.push('\n');
    }
    file.write_all(text.as_bytes()).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn column_index(
    header: &[String],
    column: &str,
    path: &Path,
) -> Result<usize, TableError> {
    header
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Parse a results CSV back into measurement rows
///
/// Numeric fields are reconstructed as their original types; an empty or
/// header-only file is an error because every downstream consumer needs at
/// least one row.
pub fn parse_results(path: &Path) -> Result<Vec<MeasurementResult>, TableError> {
    let text = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = text.lines().filter(|line| !line.is_empty());
    let header = match lines.next() {
        Some(line) => split_line(line),
        None => return Err(TableError::Empty(path.to_path_buf())),
    };

    let indices: Vec<usize> = COLUMNS
        .iter()
        .map(|column| column_index(&header, column, path))
        .collect::<Result<_, _>>()?;

    let parse_u64 = |fields: &[String], idx: usize, column: &str| {
        fields[indices[idx]]
            .parse::<u64>()
            .map_err(|_| TableError::BadValue {
                path: path.to_path_buf(),
                column: column.to_string(),
                value: fields[indices[idx]].clone(),
            })
    };
    let parse_f64 = |fields: &[String], idx: usize, column: &str| {
        fields[indices[idx]]
            .parse::<f64>()
            .map_err(|_| TableError::BadValue {
                path: path.to_path_buf(),
                column: column.to_string(),
                value: fields[indices[idx]].clone(),
            })
    };

    let mut rows = Vec::new();
    for line in lines {
        let fields = split_line(line);
        if fields.len() < header.len() {
            return Err(TableError::BadValue {
                path: path.to_path_buf(),
                column: "<row>".to_string(),
                value: line.to_string(),
            });
        }
        rows.push(MeasurementResult {
            benchmark: fields[indices[0]].clone(),
            variant: fields[indices[1]].clone(),
            pass_order: fields[indices[2]].clone(),
            flags: fields[indices[3]].clone(),
            wat_size: parse_u64(&fields, 4, "wat_size")?,
            wasm_size: parse_u64(&fields, 5, "wasm_size")?,
            runs: parse_u64(&fields, 6, "runs")? as u32,
            warmup_runs: parse_u64(&fields, 7, "warmup_runs")? as u32,
            p25_ms: parse_f64(&fields, 8, "p25_ms")?,
            median_ms: parse_f64(&fields, 9, "median_ms")?,
            p75_ms: parse_f64(&fields, 10, "p75_ms")?,
            result: fields[indices[11]].clone(),
        });
    }
    if rows.is_empty() {
        return Err(TableError::Empty(path.to_path_buf()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> MeasurementResult {
        MeasurementResult {
            benchmark: "rt02-tail-factorial".to_string(),
            variant: "O2".to_string(),
            pass_order: "inline-unroll-tail".to_string(),
            flags: "-O2 --pass-order=inline,unroll,tail".to_string(),
            wat_size: 1824,
            wasm_size: 512,
            runs: 5,
            warmup_runs: 1,
            p25_ms: 9.5,
            median_ms: 10.0,
            p75_ms: 11.25,
            result: "42".to_string(),
        }
    }

    #[test]
    fn test_escape_field_quotes_commas() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_split_line_round_trips_quoting() {
        let fields = split_line("\"a,b\",plain,\"say \"\"hi\"\"\"");
        assert_eq!(fields, vec!["a,b", "plain", "say \"hi\""]);
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![sample_row()];
        write_results(&rows, &path).unwrap();

        let parsed = parse_results(&path).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], rows[0]);
    }

    #[test]
    fn test_empty_rows_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_results(&[], &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_header_only_file_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, format!("{}\n", COLUMNS.join(","))).unwrap();
        let err = parse_results(&path).unwrap_err();
        assert!(matches!(err, TableError::Empty(_)));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "benchmark,variant\nx,y\n").unwrap();
        let err = parse_results(&path).unwrap_err();
        assert!(err.to_string().contains("pass_order"));
    }
}

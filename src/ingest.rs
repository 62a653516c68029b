//! CSV ingestion for simulation outputs and observed series.
//!
//! Three layouts are read:
//! - run tables: a header of governorate names, one row per simulation run;
//! - time series: a header of integer timestamps, one row per run, with
//!   empty cells forward-filled;
//! - observed series: headerless `(timestamp, infected)` pairs.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

/// Value used for leading empty cells in a time-series row.
pub const FORWARD_FILL_SEED: i64 = 1;

/// Errors raised while reading simulation CSVs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': '{value}' is not an integer")]
    NotAnInteger {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row} has {found} cells but the header has {expected} timestamps")]
    RowTooLong {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row} has {found} cells, expected at least {expected}")]
    RowTooShort {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("file has no header row")]
    Empty,
}

/// Per-run integer counts keyed by governorate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTable {
    columns: BTreeMap<String, Vec<i64>>,
    runs: usize,
}

impl RunTable {
    /// Counts for `key`, one per run, in file order.
    pub fn get(&self, key: &str) -> Option<&[i64]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    /// Counts for `key` as floats, or an empty vector for unknown keys.
    #[allow(clippy::cast_precision_loss)]
    pub fn values_f64(&self, key: &str) -> Vec<f64> {
        self.get(key)
            .map(|v| v.iter().map(|&x| x as f64).collect())
            .unwrap_or_default()
    }

    /// Number of runs (data rows).
    pub const fn runs(&self) -> usize {
        self.runs
    }
}

/// Per-run time series aligned to a shared timestamp header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesRuns {
    /// Timestamps from the header row.
    pub timestamps: Vec<i64>,
    /// One forward-filled series per run, each `timestamps.len()` long.
    pub runs: Vec<Vec<i64>>,
}

/// One observed `(timestamp, infected)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ObservedPoint {
    pub timestamp: i64,
    pub infected: i64,
}

fn open(path: &Path, has_headers: bool) -> Result<csv::Reader<std::fs::File>, IngestError> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_int(raw: &str, row: usize, column: &str) -> Result<i64, IngestError> {
    raw.trim().parse().map_err(|_| IngestError::NotAnInteger {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Loads a run table, keeping only the requested `keys`.
pub fn load_run_table(path: &Path, keys: &[&str]) -> Result<RunTable, IngestError> {
    let reader = open(path, true)?;
    read_run_table(reader, keys)
}

/// Reads a run table from any CSV reader with headers enabled.
pub fn read_run_table<R: Read>(
    mut reader: csv::Reader<R>,
    keys: &[&str],
) -> Result<RunTable, IngestError> {
    let header = reader.headers()?.clone();
    let positions = keys
        .iter()
        .map(|key| {
            header
                .iter()
                .position(|h| h.trim() == *key)
                .map(|idx| (*key, idx))
                .ok_or_else(|| IngestError::MissingColumn((*key).to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = RunTable::default();
    for (key, _) in &positions {
        table.columns.insert((*key).to_string(), Vec::new());
    }

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = row_idx + 1;
        for (key, idx) in &positions {
            let raw = record.get(*idx).ok_or(IngestError::RowTooShort {
                row,
                found: record.len(),
                expected: idx + 1,
            })?;
            let value = parse_int(raw, row, key)?;
            if let Some(column) = table.columns.get_mut(*key) {
                column.push(value);
            }
        }
        table.runs += 1;
    }

    tracing::debug!(runs = table.runs, columns = positions.len(), "loaded run table");
    Ok(table)
}

/// Loads a forward-filled time-series file.
pub fn load_time_series(path: &Path) -> Result<TimeSeriesRuns, IngestError> {
    let reader = open(path, false)?;
    read_time_series(reader)
}

/// Reads a time series from a headerless CSV reader.
pub fn read_time_series<R: Read>(mut reader: csv::Reader<R>) -> Result<TimeSeriesRuns, IngestError> {
    let mut records = reader.records();
    let header = records.next().ok_or(IngestError::Empty)??;
    let timestamps = header
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_int(raw, 0, &format!("#{i}")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut runs = Vec::new();
    for (row_idx, record) in records.enumerate() {
        let record = record?;
        runs.push(forward_fill(&record, row_idx + 1, &timestamps)?);
    }

    tracing::debug!(
        runs = runs.len(),
        timestamps = timestamps.len(),
        "loaded time series"
    );
    Ok(TimeSeriesRuns { timestamps, runs })
}

fn forward_fill(
    record: &StringRecord,
    row: usize,
    timestamps: &[i64],
) -> Result<Vec<i64>, IngestError> {
    if record.len() > timestamps.len() {
        return Err(IngestError::RowTooLong {
            row,
            found: record.len(),
            expected: timestamps.len(),
        });
    }

    let mut filled = Vec::with_capacity(timestamps.len());
    let mut last = FORWARD_FILL_SEED;
    for (i, raw) in record.iter().enumerate() {
        if !raw.trim().is_empty() {
            last = parse_int(raw, row, &timestamps[i].to_string())?;
        }
        filled.push(last);
    }
    filled.resize(timestamps.len(), last);
    Ok(filled)
}

/// Loads a headerless observed series of `(timestamp, infected)` pairs.
pub fn load_observed_series(path: &Path) -> Result<Vec<ObservedPoint>, IngestError> {
    let reader = open(path, false)?;
    read_observed_series(reader)
}

/// Reads an observed series from a headerless CSV reader.
pub fn read_observed_series<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<ObservedPoint>, IngestError> {
    let mut points = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = row_idx + 1;
        if record.len() < 2 {
            return Err(IngestError::RowTooShort {
                row,
                found: record.len(),
                expected: 2,
            });
        }
        points.push(ObservedPoint {
            timestamp: parse_int(&record[0], row, "timestamp")?,
            infected: parse_int(&record[1], row, "infected")?,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str, has_headers: bool) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn run_table_selects_requested_columns() {
        let data = "Total,Aden,Extra\n10,3,x\n12,4,y\n";
        let table = read_run_table(reader(data, true), &["Total", "Aden"]).unwrap();
        assert_eq!(table.runs(), 2);
        assert_eq!(table.get("Total"), Some(&[10, 12][..]));
        assert_eq!(table.get("Aden"), Some(&[3, 4][..]));
        assert!(table.get("Extra").is_none());
    }

    #[test]
    fn run_table_missing_column() {
        let err = read_run_table(reader("Total\n1\n", true), &["Total", "Aden"]).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ref c) if c == "Aden"));
    }

    #[test]
    fn run_table_rejects_non_integer() {
        let err = read_run_table(reader("Total\n1\n2.5\n", true), &["Total"]).unwrap_err();
        assert!(matches!(err, IngestError::NotAnInteger { row: 2, .. }));
    }

    #[test]
    fn time_series_forward_fills_from_one() {
        let data = "0,1,2,3\n,,5,\n2,,,7\n";
        let ts = read_time_series(reader(data, false)).unwrap();
        assert_eq!(ts.timestamps, vec![0, 1, 2, 3]);
        assert_eq!(ts.runs, vec![vec![1, 1, 5, 5], vec![2, 2, 2, 7]]);
    }

    #[test]
    fn time_series_pads_short_rows() {
        let ts = read_time_series(reader("0,1,2\n4\n", false)).unwrap();
        assert_eq!(ts.runs, vec![vec![4, 4, 4]]);
    }

    #[test]
    fn time_series_rejects_long_rows() {
        let err = read_time_series(reader("0,1\n1,2,3\n", false)).unwrap_err();
        assert!(matches!(err, IngestError::RowTooLong { row: 1, found: 3, expected: 2 }));
    }

    #[test]
    fn time_series_requires_header() {
        let err = read_time_series(reader("", false)).unwrap_err();
        assert!(matches!(err, IngestError::Empty));
    }

    #[test]
    fn observed_series_pairs() {
        let points = read_observed_series(reader("0,5\n7,40\n", false)).unwrap();
        assert_eq!(
            points,
            vec![
                ObservedPoint { timestamp: 0, infected: 5 },
                ObservedPoint { timestamp: 7, infected: 40 },
            ]
        );
    }
}

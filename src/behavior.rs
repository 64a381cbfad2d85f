//! Customer-behavior collaborator: CSV load + descriptive statistics.
//!
//! Independent of the market pipeline. Rows with any empty field are dropped
//! on load; the remaining rows must carry `user_id`, `item_id` and a
//! parseable `timestamp`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const REQUIRED_COLUMNS: [&str; 3] = ["user_id", "item_id", "timestamp"];

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("line {line}: unparseable timestamp {value:?}")]
    InvalidTimestamp { line: u64, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub user_id: String,
    pub item_id: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// item_id → number of rows.
    pub purchase_frequency: BTreeMap<String, usize>,
    /// Mean over users of (last - first timestamp), in hours. `None` without records.
    pub avg_session_hours: Option<f64>,
}

pub fn load_records(path: &Path) -> Result<Vec<Record>, DataError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_records(reader)
}

/// Same as [`load_records`] for any reader (tests, stdin).
pub fn load_records_from<R: Read>(input: R) -> Result<Vec<Record>, DataError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    read_records(reader)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Record>, DataError> {
    let headers = reader.headers()?.clone();
    let idx = column_indexes(&headers)?;

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().any(str::is_empty) {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let (Some(user), Some(item), Some(ts)) = (row.get(idx[0]), row.get(idx[1]), row.get(idx[2])) else {
            // short row: treated like a row with missing values
            continue;
        };
        let timestamp = parse_timestamp(ts).ok_or_else(|| DataError::InvalidTimestamp {
            line,
            value: ts.to_string(),
        })?;
        out.push(Record {
            user_id: user.to_string(),
            item_id: item.to_string(),
            timestamp,
        });
    }
    Ok(out)
}

fn column_indexes(headers: &StringRecord) -> Result<[usize; 3], DataError> {
    let mut idx = [0usize; 3];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
    }
    Ok(idx)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn summarize(records: &[Record]) -> Summary {
    let mut purchase_frequency = BTreeMap::new();
    let mut spans: HashMap<&str, (NaiveDateTime, NaiveDateTime)> = HashMap::new();

    for r in records {
        *purchase_frequency.entry(r.item_id.clone()).or_insert(0) += 1;
        spans
            .entry(r.user_id.as_str())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(r.timestamp);
                *hi = (*hi).max(r.timestamp);
            })
            .or_insert((r.timestamp, r.timestamp));
    }

    let avg_session_hours = if spans.is_empty() {
        None
    } else {
        let total_secs: i64 = spans
            .values()
            .map(|(lo, hi)| (*hi - *lo).num_seconds())
            .sum();
        Some(total_secs as f64 / spans.len() as f64 / 3600.0)
    };

    Summary {
        purchase_frequency,
        avg_session_hours,
    }
}

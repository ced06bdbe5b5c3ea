//! Record normalization.
//!
//! Raw rows from the source are coerced into `SiteRecord`s: the three
//! load-bearing fields (Latitude, Longitude, ARR Total) must parse as
//! numbers or the row is dropped. Drops never abort the run; they are
//! tallied in a `NormalizationReport` so a schema mismatch at the source
//! is visible instead of silently producing an empty map.

use crate::models::{FieldError, NormalizationReport, RawRecord, SiteRecord};
use serde_json::Value;
use tracing::{debug, warn};

/// Administrative columns removed before processing when present.
const DROPPED_COLUMNS: [&str; 2] = ["#", "Notes"];

const FIELD_NAME: &str = "Name";
const FIELD_ADDRESS: &str = "Address";
const FIELD_LATITUDE: &str = "Latitude";
const FIELD_LONGITUDE: &str = "Longitude";
const FIELD_ARR_TOTAL: &str = "ARR Total";

/// Normalize a fetched record set.
///
/// Returns the surviving records sorted ascending by ARR Total (so
/// higher-value markers draw on top) together with a report of what was
/// kept and dropped.
pub fn normalize(raw: &[RawRecord]) -> (Vec<SiteRecord>, NormalizationReport) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut report = NormalizationReport {
        input_rows: raw.len(),
        ..Default::default()
    };

    for (index, row) in raw.iter().enumerate() {
        let row = strip_admin_columns(row);
        match normalize_row(&row) {
            Ok(record) => kept.push(record),
            Err(e) => {
                debug!("Dropping row {}: {}", index + 1, e);
                report.reasons.push(format!("row {}: {}", index + 1, e));
            }
        }
    }

    report.kept = kept.len();
    report.dropped = report.input_rows - report.kept;

    if report.looks_degenerate() {
        warn!(
            "Normalization kept {} of {} rows; source schema may not match expectations",
            report.kept, report.input_rows
        );
    }

    // Ascending ARR: draw order only, aggregation is order-independent.
    kept.sort_by(|a, b| {
        a.arr_total
            .partial_cmp(&b.arr_total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    (kept, report)
}

/// Remove administrative columns. Tolerant drop: a row without them is
/// returned unchanged.
fn strip_admin_columns(row: &RawRecord) -> RawRecord {
    let mut cleaned = row.clone();
    for column in DROPPED_COLUMNS {
        cleaned.remove(column);
    }
    cleaned
}

/// Normalize one row, naming the first offending field on failure.
fn normalize_row(row: &RawRecord) -> Result<SiteRecord, FieldError> {
    let latitude = require_numeric(row, FIELD_LATITUDE)?;
    let longitude = require_numeric(row, FIELD_LONGITUDE)?;
    let arr_total = require_numeric(row, FIELD_ARR_TOTAL)?;

    Ok(SiteRecord {
        name: string_field(row, FIELD_NAME),
        address: string_field(row, FIELD_ADDRESS),
        latitude,
        longitude,
        arr_total,
    })
}

/// A passthrough text field; missing values become empty strings.
fn string_field(row: &RawRecord, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn require_numeric(row: &RawRecord, field: &str) -> Result<f64, FieldError> {
    let value = row
        .get(field)
        .ok_or_else(|| FieldError::Missing(field.to_string()))?;

    coerce_numeric(value).ok_or_else(|| {
        FieldError::NonNumeric(field.to_string(), display_value(value))
    })
}

/// Coerce a JSON value to f64: numbers pass through, strings are trimmed
/// and parsed, everything else is treated as missing.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn good_row(name: &str, arr: f64, lat: f64, lon: f64) -> RawRecord {
        row(&[
            ("Name", json!(name)),
            ("Address", json!("123 Main St")),
            ("Latitude", json!(lat)),
            ("Longitude", json!(lon)),
            ("ARR Total", json!(arr)),
        ])
    }

    #[test]
    fn test_normalize_keeps_clean_rows() {
        let raw = vec![good_row("A", 5_000.0, 40.0, -120.0)];
        let (records, report) = normalize(&raw);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_normalize_drops_non_numeric_latitude() {
        let mut bad = good_row("B", 5_000.0, 0.0, -120.0);
        bad.insert("Latitude".to_string(), json!("not a number"));

        let raw = vec![good_row("A", 5_000.0, 40.0, -120.0), bad];
        let (records, report) = normalize(&raw);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
        assert_eq!(report.dropped, 1);
        assert!(report.reasons[0].contains("Latitude"));
    }

    #[test]
    fn test_normalize_drops_missing_arr() {
        let mut bad = good_row("B", 0.0, 40.0, -120.0);
        bad.remove("ARR Total");

        let (records, report) = normalize(&[bad]);
        assert!(records.is_empty());
        assert_eq!(report.dropped, 1);
        assert!(report.reasons[0].contains("ARR Total"));
    }

    #[test]
    fn test_normalize_parses_string_numbers() {
        let mut r = good_row("A", 0.0, 40.0, -120.0);
        r.insert("ARR Total".to_string(), json!("  12500.75 "));

        let (records, _) = normalize(&[r]);
        assert_eq!(records.len(), 1);
        assert!((records[0].arr_total - 12_500.75).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_sorts_ascending_by_arr() {
        let raw = vec![
            good_row("big", 120_000.0, 40.0, -80.0),
            good_row("small", 5_000.0, 40.0, -120.0),
            good_row("mid", 30_000.0, 40.0, -95.0),
        ];
        let (records, _) = normalize(&raw);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["small", "mid", "big"]);
    }

    #[test]
    fn test_normalize_tolerates_admin_columns() {
        let mut r = good_row("A", 5_000.0, 40.0, -120.0);
        r.insert("#".to_string(), json!(1));
        r.insert("Notes".to_string(), json!("internal"));

        let (records, report) = normalize(&[r]);
        assert_eq!(records.len(), 1);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_normalize_missing_name_becomes_empty() {
        let mut r = good_row("A", 5_000.0, 40.0, -120.0);
        r.remove("Name");

        let (records, _) = normalize(&[r]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "");
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&json!(42)), Some(42.0));
        assert_eq!(coerce_numeric(&json!(3.5)), Some(3.5));
        assert_eq!(coerce_numeric(&json!("17")), Some(17.0));
        assert_eq!(coerce_numeric(&json!("")), None);
        assert_eq!(coerce_numeric(&json!("12,000")), None);
        assert_eq!(coerce_numeric(&json!(null)), None);
        assert_eq!(coerce_numeric(&json!(true)), None);
        assert_eq!(coerce_numeric(&json!([1])), None);
    }

    #[test]
    fn test_empty_input_report() {
        let (records, report) = normalize(&[]);
        assert!(records.is_empty());
        assert_eq!(report.input_rows, 0);
        assert!(!report.looks_degenerate());
    }
}

//! Event-log records: extraction and normalization.

pub mod model;
pub mod source;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::error::{CoreResult, EvgraphError};
use model::{ProjectedRow, RawRecord, SubmitRecord};

/// Output format of canonical timestamps.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset layouts accepted besides RFC 3339; the offset is dropped.
const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Naive layouts, tried after the offset ones.
const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Result of normalizing a batch of raw rows.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<SubmitRecord>,
    /// Rows read from the source.
    pub total: usize,
    /// Rows dropped because they were not "submit" actions.
    pub non_submit: usize,
    /// Submit rows dropped as exact duplicates.
    pub duplicates: usize,
    /// Submit rows dropped because a field was missing.
    pub incomplete: usize,
}

/// Normalize raw rows into complete, de-duplicated submit records.
///
/// Filters to submit actions, projects and renames the canonical columns,
/// drops exact duplicates (first occurrence wins) and incomplete rows, then
/// canonicalizes every timestamp. A timestamp that cannot be parsed fails the
/// whole batch.
pub fn normalize(raw: Vec<RawRecord>) -> CoreResult<NormalizeOutcome> {
    let mut outcome = NormalizeOutcome {
        total: raw.len(),
        ..Default::default()
    };

    let mut seen: HashSet<ProjectedRow> = HashSet::new();
    let mut unique = Vec::new();
    for record in raw {
        if !record.is_submit() {
            outcome.non_submit += 1;
            continue;
        }
        let row = ProjectedRow::from(record);
        if seen.insert(row.clone()) {
            unique.push(row);
        } else {
            outcome.duplicates += 1;
        }
    }

    for row in unique {
        let Some(mut record) = row.into_complete() else {
            outcome.incomplete += 1;
            continue;
        };
        record.date = canonicalize_timestamp(&record.date).ok_or_else(|| {
            EvgraphError::InvalidTimestamp {
                event_id: record.event_id.clone(),
                value: record.date.clone(),
            }
        })?;
        outcome.records.push(record);
    }

    info!(
        total = outcome.total,
        kept = outcome.records.len(),
        non_submit = outcome.non_submit,
        duplicates = outcome.duplicates,
        incomplete = outcome.incomplete,
        "Normalized event log"
    );

    Ok(outcome)
}

/// Rewrite a timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// Wall-clock fields are kept as written; offsets are dropped, not applied.
pub fn canonicalize_timestamp(value: &str) -> Option<String> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local().format(CANONICAL_DATE_FORMAT).to_string());
    }
    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local().format(CANONICAL_DATE_FORMAT).to_string());
        }
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.format(CANONICAL_DATE_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(CANONICAL_DATE_FORMAT).to_string())
}

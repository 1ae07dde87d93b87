//! CSV extraction of the event-log export.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use super::model::{RawRecord, REQUIRED_COLUMNS};
use crate::error::{CoreResult, EvgraphError};

/// Read every row of a CSV file.
///
/// Unreadable files and malformed rows are reported as
/// [`EvgraphError::SourceUnavailable`]; missing columns as
/// [`EvgraphError::SchemaViolation`].
pub fn read_csv_path(path: &Path) -> CoreResult<Vec<RawRecord>> {
    let file = File::open(path).map_err(|e| EvgraphError::source_unavailable(path, e))?;

    let records = read_csv(BufReader::new(file)).map_err(|e| match e {
        EvgraphError::Csv(err) => EvgraphError::source_unavailable(path, err),
        other => other,
    })?;

    info!(path = %path.display(), rows = records.len(), "Read event log");
    Ok(records)
}

/// Read every row from any CSV byte stream with a header line.
pub fn read_csv<R: Read>(reader: R) -> CoreResult<Vec<RawRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<RawRecord>() {
        records.push(row?);
    }

    debug!(rows = records.len(), "Parsed CSV rows");
    Ok(records)
}

/// Fail with every required column the header line lacks.
fn check_headers(headers: &StringRecord) -> CoreResult<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EvgraphError::SchemaViolation(missing))
    }
}

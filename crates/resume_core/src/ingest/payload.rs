//! CSV payload decoding.
//!
//! Field counts are not enforced here; row shape belongs to row validation so
//! that shape errors carry row numbers.

use csv::ReaderBuilder;
use std::io::Read;
use thiserror::Error;

/// The payload could not be framed into rows at all.
#[derive(Debug, Error)]
#[error("error reading csv body due to: {0}")]
pub struct PayloadError(#[from] csv::Error);

/// Reads every record of a headerless CSV payload as raw text fields.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Vec<String>>, PayloadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

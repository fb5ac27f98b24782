//! Delimited text ingestion
//!
//! Each input record contributes at most one sample: the first comma
//! separated cell that parses as a finite number. Records without such a
//! cell are skipped, so the sample count may be lower than the record count.
//! Records are decoded lossily; bytes that are not UTF-8 only affect the
//! record they appear in.

use crate::error::QrsResult;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Field delimiter for input records
pub const DELIMITER: char = ',';

/// Samples extracted from a record stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestedRecords {
    /// One value per accepted record, in input order
    pub samples: Vec<f64>,
    /// Zero-based record index each sample came from
    pub line_numbers: Vec<usize>,
    /// Total records seen
    pub records_read: usize,
    /// Records without any numeric cell
    pub skipped: usize,
}

impl IngestedRecords {
    /// Check whether any numeric content was found
    pub fn has_samples(&self) -> bool {
        !self.samples.is_empty()
    }
}

/// Split a record into its raw cells
pub fn split_record(record: &str) -> Vec<&str> {
    record.split(DELIMITER).collect()
}

/// Extract the first numeric cell of a record
pub fn extract_numeric_value(record: &str) -> Option<f64> {
    record
        .split(DELIMITER)
        .find_map(|cell| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// Read all records from `reader`, keeping one sample per numeric record
pub fn read_samples<R: BufRead>(reader: R) -> QrsResult<IngestedRecords> {
    let mut ingested = IngestedRecords::default();

    for (line_index, record) in reader.split(b'\n').enumerate() {
        let record = record?;
        ingested.records_read += 1;

        // invalid UTF-8 turns into U+FFFD and only spoils the cells it sits in
        let line = String::from_utf8_lossy(&record);
        match extract_numeric_value(line.trim_end_matches('\r')) {
            Some(value) => {
                ingested.samples.push(value);
                ingested.line_numbers.push(line_index);
            }
            None => ingested.skipped += 1,
        }
    }

    Ok(ingested)
}

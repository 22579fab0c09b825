//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operation rows from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize rows one at a time,
//! so memory use does not grow with the file. Parsing and conversion are
//! delegated to the csv_format module.
//!
//! ```no_run
//! use admin_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let mut reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! while let Some(result) = reader.next() {
//!     match result {
//!         Ok(record) => println!("{} {}", record.op, record.target),
//!         Err(e) => eprintln!("line {}: {}", reader.line(), e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `Err` items and iteration continues

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{AdminError, OperationRecord};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    rows: u64,
}

impl SyncReader {
    /// Open an operations file
    ///
    /// The header row is required; rows may have fewer columns than the
    /// header and every field is trimmed.
    pub fn new(path: &Path) -> Result<Self, AdminError> {
        let file = File::open(path).map_err(|e| AdminError::IoError {
            message: format!("failed to open '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self { reader, rows: 0 })
    }

    /// File line of the row most recently yielded
    ///
    /// The header is line 1.
    pub fn line(&self) -> u64 {
        self.rows + 1
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRecord, AdminError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let result = deserializer.next()?;
        self.rows += 1;

        Some(result.map_err(AdminError::from).and_then(convert_csv_record))
    }
}

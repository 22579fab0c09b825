//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. It applies every row in file order, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Row dispatch to `AdminService::apply`
//! - CSV output to the `csv_format` writers
//!
//! Rows are streamed one at a time, so memory use grows with the number of
//! accounts and ledger records, not with the size of the file.

use crate::core::InMemoryAdminService;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_outputs, ProcessingStrategy, RunSummary};
use crate::types::AdminError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<(), AdminError> {
        let service = InMemoryAdminService::in_memory();
        let mut reader = SyncReader::new(input_path)?;
        let mut summary = RunSummary::default();

        while let Some(result) = reader.next() {
            let line = reader.line();
            match result {
                Ok(record) => {
                    let result = service.apply(&record);
                    summary.record(Some(line), &record, &result);
                }
                Err(e) => {
                    summary.rejected += 1;
                    warn!(line, error = %e, "skipping invalid row");
                }
            }
        }

        write_outputs(&service, summary, output, ledger_output)
    }
}

//! Processing strategy module for the batch driver
//!
//! This module defines the Strategy pattern for complete processing pipelines,
//! covering CSV parsing, applying rows to a fresh in-memory service, and
//! writing the final account table (and optionally the ledger). This allows
//! the synchronous and the asynchronous batch implementation to be selected at
//! runtime.

use crate::cli::StrategyType;
use crate::core::{InMemoryAdminService, Ledger};
use crate::io::csv_format::{write_accounts_csv, write_ledger_csv};
use crate::types::{AdminError, OperationRecord};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Complete operations-file pipeline
pub trait ProcessingStrategy: Send + Sync {
    /// Apply every row of `input_path` and write the results
    ///
    /// The account table goes to `output`; when `ledger_output` is given the
    /// ledger is written there too. Rejected rows are logged and skipped.
    ///
    /// # Errors
    ///
    /// Only failures that stop the whole run: the input cannot be opened or
    /// an output cannot be written.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<(), AdminError>;
}

/// Create a strategy of the requested type
///
/// `config` only applies to the async strategy; `None` uses the defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

/// Tally of applied and rejected rows
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
}

impl RunSummary {
    pub fn record(&mut self, line: Option<u64>, record: &OperationRecord, result: &Result<(), AdminError>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(e) => {
                self.rejected += 1;
                warn!(
                    line,
                    op = %record.op,
                    target = %record.target,
                    kind = %e.kind(),
                    error = %e,
                    "operation rejected"
                );
            }
        }
    }
}

/// Write the final account table and, if requested, the ledger
pub(crate) fn write_outputs(
    service: &InMemoryAdminService,
    summary: RunSummary,
    output: &mut dyn Write,
    ledger_output: Option<&mut dyn Write>,
) -> Result<(), AdminError> {
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        accounts = service.store().len(),
        transactions = service.ledger().len(),
        "processing finished"
    );

    write_accounts_csv(&service.list_accounts(), output)?;
    if let Some(ledger_output) = ledger_output {
        write_ledger_csv(&service.ledger().all(), ledger_output)?;
    }
    Ok(())
}

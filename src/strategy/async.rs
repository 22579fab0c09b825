//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. It reads the operations file in batches and
//! applies each batch with conflict-group partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (conflict groups in parallel, bounded)
//!         └── AdminService
//!             ├── InMemoryAccountStore (per-account locks)
//!             └── InMemoryLedger (append-only)
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another, so rows touching the same
//! account are applied in file order across the whole file. Within a batch,
//! rows touching disjoint sets of accounts run in parallel.

use crate::core::{BatchProcessor, InMemoryAdminService};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_outputs, ProcessingStrategy, RunSummary};
use crate::types::AdminError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of rows read per batch
    pub batch_size: usize,

    /// Runtime worker threads and the most conflict groups applied at once
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<(), AdminError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()?;

        let (service, summary) = runtime.block_on(async {
            let service = InMemoryAdminService::in_memory();
            let processor = BatchProcessor::new(service.clone(), self.config.max_concurrent_batches);
            let mut summary = RunSummary::default();

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| AdminError::IoError {
                    message: format!("failed to open '{}': {}", input_path.display(), e),
                })?;

            // csv-async reads through the futures io traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Finish the batch before reading the next one
                for result in processor.process_batch(batch).await {
                    summary.record(None, &result.record, &result.result);
                }
            }

            Ok::<_, AdminError>((service, summary))
        })?;

        write_outputs(&service, summary, output, ledger_output)
    }
}

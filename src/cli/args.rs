use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Apply account, transfer and status operations from a CSV file
#[derive(Parser, Debug)]
#[command(name = "admin-ledger")]
#[command(about = "Apply role-gated account and balance operations from a CSV file", long_about = None)]
pub struct CliArgs {
    /// Operations CSV file
    #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for file order or 'async' for parallel batches"
    )]
    pub strategy: StrategyType,

    /// Rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Concurrency limit (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of conflict groups applied at once (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Where to write the ledger
    #[arg(
        long = "ledger-out",
        value_name = "PATH",
        help = "Also write the transaction ledger as CSV to this file"
    )]
    pub ledger_out: Option<PathBuf>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}

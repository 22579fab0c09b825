//! Admin ledger CLI
//!
//! Applies an operations CSV (signups, logins, credits, transfers, status
//! changes, profile edits) to a fresh in-memory system and prints the final
//! account table.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! cargo run -- --strategy sync operations.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 operations.csv
//! cargo run -- --ledger-out ledger.csv operations.csv > accounts.csv
//! RUST_LOG=debug cargo run -- operations.csv
//! ```
//!
//! Logs go to stderr so stdout only carries CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable)

use admin_ledger::cli;
use admin_ledger::strategy;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    let mut ledger_file = match args.ledger_out.as_deref().map(File::create).transpose() {
        Ok(file) => file.map(BufWriter::new),
        Err(e) => {
            error!(error = %e, "cannot create ledger output");
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    let mut result = strategy.process(
        &args.input_file,
        &mut output,
        ledger_file.as_mut().map(|file| file as &mut dyn Write),
    );
    if let Some(file) = ledger_file.as_mut().filter(|_| result.is_ok()) {
        result = file.flush().map_err(Into::into);
    }

    if let Err(e) = result {
        error!(error = %e, "processing failed");
        process::exit(1);
    }
}

//! Batch processing with conflict-group partitioning
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! operation rows concurrently while keeping every account's rows in file
//! order.
//!
//! # Design
//!
//! Rows are partitioned into conflict groups. Two rows belong to the same
//! group when they share a key, directly or through a chain of other rows
//! (union-find). A row's keys are the usernames it names and every email it
//! claims or logs in with, so signups stay ordered after the rows that free
//! or take their username or email.
//!
//! Groups run concurrently, at most `max_concurrent` at a time; rows inside
//! a group run sequentially. Every operation only reads and writes the
//! accounts behind its own keys, so the final state matches applying the
//! whole batch in file order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── AdminService  (shared store, ledger and clock)
//!     └── Semaphore     (bounds concurrently running groups)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

use crate::core::service::AdminService;
use crate::core::traits::{AccountStore, Clock, Ledger};
use crate::types::{username_key, AdminError, Operation, OperationRecord};

/// Result of applying a single operation row
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The row that was applied
    pub record: OperationRecord,

    /// Outcome of applying it
    pub result: Result<(), AdminError>,
}

/// Batch processor with conflict-group partitioning
///
/// Cloning is cheap; clones share the same service and concurrency limit.
#[derive(Debug)]
pub struct BatchProcessor<S, L, C> {
    service: AdminService<S, L, C>,
    limit: Arc<Semaphore>,
}

impl<S, L, C> Clone for BatchProcessor<S, L, C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            limit: Arc::clone(&self.limit),
        }
    }
}

impl<S, L, C> BatchProcessor<S, L, C>
where
    S: AccountStore + 'static,
    L: Ledger + 'static,
    C: Clock + 'static,
{
    /// Create a processor running at most `max_concurrent` groups at once
    ///
    /// A limit of zero is treated as one.
    pub fn new(service: AdminService<S, L, C>, max_concurrent: usize) -> Self {
        Self {
            service,
            limit: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn service(&self) -> &AdminService<S, L, C> {
        &self.service
    }

    /// Partition rows into conflict groups
    ///
    /// Each group keeps its rows in their original order, and groups are
    /// returned in order of their first row.
    pub fn partition_by_conflict(&self, batch: Vec<OperationRecord>) -> Vec<Vec<OperationRecord>> {
        let mut parent: Vec<usize> = (0..batch.len()).collect();
        let mut owner: HashMap<String, usize> = HashMap::new();

        for (index, record) in batch.iter().enumerate() {
            for key in self.conflict_keys(record) {
                match owner.get(&key) {
                    Some(&other) => union(&mut parent, index, other),
                    None => {
                        owner.insert(key, index);
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<OperationRecord>> = BTreeMap::new();
        for (index, record) in batch.into_iter().enumerate() {
            let root = find(&mut parent, index);
            groups.entry(root).or_default().push(record);
        }

        groups.into_values().collect()
    }

    /// Apply rows one after another
    pub fn process_sequential(&self, records: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        records
            .into_iter()
            .map(|record| {
                let result = self.service.apply(&record);
                ProcessingResult { record, result }
            })
            .collect()
    }

    /// Apply a batch with its conflict groups running concurrently
    ///
    /// Results are returned group by group, each group in row order.
    pub async fn process_batch(&self, batch: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        let groups = self.partition_by_conflict(batch);
        let processor = self.clone();
        self.run_groups(groups, move |group| processor.process_sequential(group))
            .await
    }

    /// Run `work` on every group on the blocking pool, bounded by the limit
    async fn run_groups<F>(&self, groups: Vec<Vec<OperationRecord>>, work: F) -> Vec<ProcessingResult>
    where
        F: Fn(Vec<OperationRecord>) -> Vec<ProcessingResult> + Clone + Send + 'static,
    {
        let mut tasks = Vec::with_capacity(groups.len());
        for group in groups {
            // The semaphore is never closed; a failed acquire only drops the bound
            let permit = Arc::clone(&self.limit).acquire_owned().await.ok();
            let work = work.clone();
            // Rows may hash passwords, which is CPU-bound
            tasks.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                work(group)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "conflict group task failed"),
            }
        }
        results
    }

    /// Normalized keys of the accounts and unique fields a row touches
    ///
    /// An email used as a login identifier is mapped to the owning account's
    /// username so it conflicts with that account's other rows.
    fn conflict_keys(&self, record: &OperationRecord) -> Vec<String> {
        let mut keys: Vec<String> = record
            .usernames()
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                self.service
                    .store()
                    .find_by_email(name)
                    .map(|account| username_key(&account.username))
                    .unwrap_or_else(|| username_key(name))
            })
            .collect();

        if record.op == Operation::Login {
            keys.push(email_key(&record.target));
        }
        if let Some(email) = record.email.as_deref().filter(|email| !email.trim().is_empty()) {
            keys.push(email_key(email));
        }
        keys
    }
}

fn email_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}

fn find(parent: &mut [usize], mut index: usize) -> usize {
    while parent[index] != index {
        parent[index] = parent[parent[index]];
        index = parent[index];
    }
    index
}

/// Merge two sets, keeping the smaller index as root
fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

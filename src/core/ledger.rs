//! Thread-safe in-memory transaction ledger
//!
//! This module provides [`InMemoryLedger`], the default [`Ledger`]
//! implementation: an append-only map of ledger records keyed by a
//! monotonically increasing id.
//!
//! # Purpose
//!
//! The ledger is an audit trail of committed balance movements. It is never
//! used to derive balances; those live on the accounts themselves. Records
//! are written once and never mutated or removed.

use crate::core::traits::Ledger;
use crate::types::{AccountId, AdminError, NewTransaction, TransactionId, TransactionRecord};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only ledger backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: DashMap<TransactionId, TransactionRecord>,

    /// Last id handed out; ids start at 1
    last_id: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, oldest first
    pub fn all(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    fn newest_first(&self, keep: impl Fn(&TransactionRecord) -> bool) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }
}

impl Ledger for InMemoryLedger {
    fn append(&self, transaction: NewTransaction) -> Result<TransactionRecord, AdminError> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = transaction.with_id(id);

        self.records.insert(id, record.clone());

        Ok(record)
    }

    fn get(&self, id: TransactionId) -> Option<TransactionRecord> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    fn recent(&self, limit: usize) -> Vec<TransactionRecord> {
        let mut records = self.newest_first(|_| true);
        records.truncate(limit);
        records
    }

    fn for_account(&self, account: AccountId) -> Vec<TransactionRecord> {
        self.newest_first(|record| record.from.id == account || record.to.id == account)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountSnapshot, Direction, Role};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::thread;
    use uuid::Uuid;

    fn snapshot(username: &str) -> AccountSnapshot {
        AccountSnapshot {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role: Role::Agent,
        }
    }

    fn transfer(from: &AccountSnapshot, to: &AccountSnapshot, amount: i64) -> NewTransaction {
        NewTransaction {
            from: from.clone(),
            to: to.clone(),
            amount: Decimal::new(amount, 0),
            direction: Direction::Add,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let ledger = InMemoryLedger::new();
        let (a, b) = (snapshot("a"), snapshot("b"));

        let first = ledger.append(transfer(&a, &b, 1)).unwrap();
        let second = ledger.append(transfer(&a, &b, 2)).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(2).unwrap().amount, Decimal::new(2, 0));
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let ledger = InMemoryLedger::new();
        let (a, b) = (snapshot("a"), snapshot("b"));
        for amount in 1..=5 {
            ledger.append(transfer(&a, &b, amount)).unwrap();
        }

        let recent = ledger.recent(3);
        let amounts: Vec<_> = recent.iter().map(|record| record.amount).collect();
        assert_eq!(
            amounts,
            vec![Decimal::new(5, 0), Decimal::new(4, 0), Decimal::new(3, 0)]
        );
        assert_eq!(ledger.recent(100).len(), 5);
    }

    #[test]
    fn test_for_account_matches_either_side() {
        let ledger = InMemoryLedger::new();
        let (a, b, c) = (snapshot("a"), snapshot("b"), snapshot("c"));
        ledger.append(transfer(&a, &b, 1)).unwrap();
        ledger.append(transfer(&c, &a, 2)).unwrap();
        ledger.append(transfer(&b, &c, 3)).unwrap();

        let for_a = ledger.for_account(a.id);
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].amount, Decimal::new(2, 0));
        assert_eq!(for_a[1].amount, Decimal::new(1, 0));
    }

    #[test]
    fn test_all_is_oldest_first() {
        let ledger = InMemoryLedger::new();
        let (a, b) = (snapshot("a"), snapshot("b"));
        ledger.append(transfer(&a, &b, 1)).unwrap();
        ledger.append(transfer(&b, &a, 2)).unwrap();

        let ids: Vec<_> = ledger.all().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_concurrent_appends_get_unique_ids() {
        let ledger = Arc::new(InMemoryLedger::new());
        let (a, b) = (snapshot("a"), snapshot("b"));

        thread::scope(|scope| {
            for _ in 0..8 {
                let ledger = Arc::clone(&ledger);
                let (a, b) = (a.clone(), b.clone());
                scope.spawn(move || {
                    for _ in 0..25 {
                        ledger.append(transfer(&a, &b, 1)).unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.len(), 200);
        let ids: Vec<_> = ledger.all().iter().map(|record| record.id).collect();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }
}

use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::transaction::{NewTransaction, Transaction};
use crate::storage::backend::KeyValueStore;
use crate::storage::manager::StorageManager;

/// Single source of truth for the transaction list.
///
/// Keeps the list in insertion order and writes the whole list through to
/// the key-value backend on every mutation. A mutation is only committed in
/// memory once its write succeeded, so a failed write changes nothing.
///
/// Stored rows that cannot be read are not part of the list but are written
/// back unchanged after it, until the list is replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    storage: StorageManager,
    transactions: Vec<Transaction>,
    retained: Vec<Value>,
}

impl TransactionStore {
    /// Load the persisted list. Corrupted or missing data yields an empty store.
    pub fn open(storage: StorageManager, kv: &dyn KeyValueStore) -> Self {
        let stored = storage.load_transaction_records(kv);
        tracing::debug!(
            "Loaded {} transactions ({} unreadable rows kept aside)",
            stored.transactions.len(),
            stored.retained.len()
        );
        Self {
            storage,
            transactions: stored.transactions,
            retained: stored.retained,
        }
    }

    /// Number of stored rows that could not be read as transactions.
    pub fn unreadable_count(&self) -> usize {
        self.retained.len()
    }

    /// Snapshot sorted by ascending date; same-day entries keep insertion order.
    pub fn list(&self) -> Vec<Transaction> {
        let mut list = self.transactions.clone();
        list.sort_by_key(|t| t.date);
        list
    }

    /// The list in insertion (storage) order.
    pub fn entries(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Validate a candidate, give it a fresh id and append it.
    pub fn add(
        &mut self,
        kv: &mut dyn KeyValueStore,
        candidate: NewTransaction,
    ) -> Result<Uuid, CoreError> {
        let transaction = Transaction::from_candidate(candidate)?;
        let id = transaction.id;

        let mut next = self.transactions.clone();
        next.push(transaction);
        self.commit(kv, next)?;

        tracing::info!("Added transaction {id}");
        Ok(id)
    }

    /// Remove a transaction by id and return it.
    pub fn remove(
        &mut self,
        kv: &mut dyn KeyValueStore,
        id: Uuid,
    ) -> Result<Transaction, CoreError> {
        self.take(kv, id).map(|(_, transaction)| transaction)
    }

    /// Remove a transaction by id and return it with its former position in
    /// insertion order (so it can be put back exactly where it was).
    pub fn take(
        &mut self,
        kv: &mut dyn KeyValueStore,
        id: Uuid,
    ) -> Result<(usize, Transaction), CoreError> {
        let idx = self
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let mut next = self.transactions.clone();
        let removed = next.remove(idx);
        self.commit(kv, next)?;

        tracing::info!("Removed transaction {id}");
        Ok((idx, removed))
    }

    /// Put an existing transaction back, keeping its id.
    ///
    /// `position` is clamped to the end of the list. Fails if a transaction
    /// with the same id is already present.
    pub fn reinsert(
        &mut self,
        kv: &mut dyn KeyValueStore,
        position: usize,
        transaction: Transaction,
    ) -> Result<(), CoreError> {
        transaction.validate()?;
        if self.get(transaction.id).is_some() {
            return Err(CoreError::ValidationError(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }

        let id = transaction.id;
        let mut next = self.transactions.clone();
        next.insert(position.min(next.len()), transaction);
        self.commit(kv, next)?;

        tracing::info!("Reinserted transaction {id}");
        Ok(())
    }

    /// Overwrite the whole list (seed data, reset). Unreadable rows kept
    /// from storage are dropped as well.
    pub fn replace_all(
        &mut self,
        kv: &mut dyn KeyValueStore,
        transactions: Vec<Transaction>,
    ) -> Result<(), CoreError> {
        validate_new(&HashSet::new(), &transactions)?;
        let count = transactions.len();
        self.storage
            .save_transaction_records(kv, &transactions, &[])?;
        self.transactions = transactions;
        self.retained.clear();

        tracing::info!("Replaced transaction list ({count} entries)");
        Ok(())
    }

    /// Append new transactions (CSV import) in one write. Only the incoming
    /// rows are validated; their ids must not clash with stored ones.
    /// Returns the number appended.
    pub fn append_all(
        &mut self,
        kv: &mut dyn KeyValueStore,
        transactions: Vec<Transaction>,
    ) -> Result<usize, CoreError> {
        let existing: HashSet<Uuid> = self.transactions.iter().map(|t| t.id).collect();
        validate_new(&existing, &transactions)?;

        let count = transactions.len();
        let mut next = self.transactions.clone();
        next.extend(transactions);
        self.commit(kv, next)?;

        tracing::info!("Appended {count} transactions");
        Ok(count)
    }

    /// Drop the in-memory list without writing (used after the backing keys
    /// were removed).
    pub(crate) fn forget(&mut self) {
        self.transactions.clear();
        self.retained.clear();
    }

    fn commit(
        &mut self,
        kv: &mut dyn KeyValueStore,
        next: Vec<Transaction>,
    ) -> Result<(), CoreError> {
        self.storage
            .save_transaction_records(kv, &next, &self.retained)?;
        self.transactions = next;
        Ok(())
    }
}

/// Every incoming transaction valid, and its id unique among `existing`
/// and the other incoming ones.
fn validate_new(existing: &HashSet<Uuid>, transactions: &[Transaction]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(transactions.len());
    for transaction in transactions {
        transaction.validate()?;
        if existing.contains(&transaction.id) || !seen.insert(transaction.id) {
            return Err(CoreError::ValidationError(format!(
                "duplicate transaction id {}",
                transaction.id
            )));
        }
    }
    Ok(())
}

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::errors::CoreError;
use crate::models::settings::Preferences;
use crate::models::transaction::Transaction;

use super::backend::KeyValueStore;
use super::keys::StorageKeys;

/// Result of [`StorageManager::load_transaction_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredTransactions {
    /// Rows that decoded into valid transactions, in stored order
    pub transactions: Vec<Transaction>,
    /// Rows that did not, exactly as stored
    pub retained: Vec<Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredRow<'a> {
    Transaction(&'a Transaction),
    Raw(&'a Value),
}

/// Typed access to the tracker's namespaced keys.
///
/// Reads never fail: a missing, unreadable or corrupted value is logged and
/// replaced by the fallback. Writes replace the whole value and surface
/// failures to the caller.
#[derive(Debug, Clone, Default)]
pub struct StorageManager {
    keys: StorageKeys,
}

impl StorageManager {
    pub fn new(keys: StorageKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    // ── Transactions ────────────────────────────────────────────────

    /// The readable transactions. See [`StorageManager::load_transaction_records`].
    pub fn load_transactions(&self, kv: &dyn KeyValueStore) -> Vec<Transaction> {
        self.load_transaction_records(kv).transactions
    }

    /// Load the stored list row by row.
    ///
    /// Each element is decoded and validated on its own. Rows that fail
    /// (bad date, non-positive amount, duplicate id...) are kept verbatim in
    /// [`StoredTransactions::retained`] instead of poisoning the whole list.
    pub fn load_transaction_records(&self, kv: &dyn KeyValueStore) -> StoredTransactions {
        let key = &self.keys.transactions;
        let rows: Vec<Value> = read_json(kv, key, Vec::new());

        let mut stored = StoredTransactions::default();
        let mut seen = HashSet::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            let parsed = serde_json::from_value::<Transaction>(row.clone())
                .map_err(CoreError::from)
                .and_then(|t| t.validate().map(|()| t));
            match parsed {
                Ok(t) if seen.insert(t.id) => stored.transactions.push(t),
                Ok(t) => {
                    tracing::warn!("Keeping duplicate row {idx} under '{key}' aside: id {}", t.id);
                    stored.retained.push(row);
                }
                Err(e) => {
                    tracing::warn!("Keeping unreadable row {idx} under '{key}' aside: {e}");
                    stored.retained.push(row);
                }
            }
        }
        stored
    }

    /// Persist the full transaction list (whole-value replacement).
    pub fn save_transactions(
        &self,
        kv: &mut dyn KeyValueStore,
        transactions: &[Transaction],
    ) -> Result<(), CoreError> {
        write_json(kv, &self.keys.transactions, transactions)
    }

    /// Persist the list followed by previously unreadable rows, unchanged.
    pub fn save_transaction_records(
        &self,
        kv: &mut dyn KeyValueStore,
        transactions: &[Transaction],
        retained: &[Value],
    ) -> Result<(), CoreError> {
        let rows: Vec<StoredRow<'_>> = transactions
            .iter()
            .map(StoredRow::Transaction)
            .chain(retained.iter().map(StoredRow::Raw))
            .collect();
        write_json(kv, &self.keys.transactions, &rows)
    }

    // ── Budget ──────────────────────────────────────────────────────

    /// Stored budget, if a positive one is set.
    ///
    /// Accepts a JSON number or a numeric string; anything else counts as
    /// "no budget".
    pub fn load_budget(&self, kv: &dyn KeyValueStore) -> Option<f64> {
        let value: serde_json::Value = read_json(kv, &self.keys.budget, serde_json::Value::Null);
        let amount = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        (amount.is_finite() && amount > 0.0).then_some(amount)
    }

    /// Persist the budget; `None` is stored as `0`.
    pub fn save_budget(
        &self,
        kv: &mut dyn KeyValueStore,
        budget: Option<f64>,
    ) -> Result<(), CoreError> {
        write_json(kv, &self.keys.budget, &budget.unwrap_or(0.0))
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub fn load_preferences(&self, kv: &dyn KeyValueStore) -> Preferences {
        read_json(kv, &self.keys.preferences, Preferences::default())
    }

    pub fn save_preferences(
        &self,
        kv: &mut dyn KeyValueStore,
        preferences: &Preferences,
    ) -> Result<(), CoreError> {
        write_json(kv, &self.keys.preferences, preferences)
    }

    /// Remove every key of this namespace/version.
    pub fn clear_all(&self, kv: &mut dyn KeyValueStore) -> Result<(), CoreError> {
        for key in self.keys.all() {
            kv.remove(key)?;
        }
        Ok(())
    }
}

/// Read and decode the JSON value under `key`, or return `fallback`.
pub fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    let raw = match kv.get(key) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return fallback,
        Err(e) => {
            tracing::warn!("Failed to read '{key}', using default: {e}");
            return fallback;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Corrupted value under '{key}', using default: {e}");
            fallback
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    kv: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize '{key}': {e}")))?;
    kv.set(key, raw)
}

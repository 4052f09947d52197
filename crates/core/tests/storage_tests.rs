// ═══════════════════════════════════════════════════════════════════
// Storage Tests — key-value backends, namespaced keys, StorageManager
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use expense_tracker_core::models::settings::{Preferences, Theme, TrackerConfig};
use expense_tracker_core::models::transaction::{NewTransaction, Transaction};
use expense_tracker_core::storage::backend::{FileStore, KeyValueStore, MemoryStore};
use expense_tracker_core::storage::keys::{StorageKeys, CURRENT_VERSION};
use expense_tracker_core::storage::manager::{read_json, write_json, StorageManager};
use serde_json::Value;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Rows as an older version could store them: one fine, one with a
/// non-ISO date that no longer parses.
const LEGACY_ROWS: &str = r#"[
    {"id":"0b7d6f0e-8a4c-4a43-9a53-2b0d9a5e1f11","date":"2024-01-05","note":"Rent","cat":"Rent","amt":900},
    {"id":"1c8e7f1f-9b5d-4b54-8b64-3c1e0b6f2a22","date":"01/06/2024","note":"Imported","cat":"Food","amt":12.5}
]"#;

fn tx(note: &str, amount: f64) -> Transaction {
    Transaction::from_candidate(NewTransaction::new(d(2024, 1, 10), note, "Food", amount)).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════

mod keys {
    use super::*;

    #[test]
    fn default_keys_are_versioned() {
        let keys = StorageKeys::default();
        assert_eq!(keys.transactions, "myExpenseTracker:v1:transactions");
        assert_eq!(keys.preferences, "myExpenseTracker:v1:prefs");
        assert_eq!(keys.budget, "myExpenseTracker:v1:budget");
    }

    #[test]
    fn version_changes_every_key() {
        let v1 = StorageKeys::new("app", 1);
        let v2 = StorageKeys::new("app", 2);
        for (a, b) in v1.all().iter().zip(v2.all().iter()) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn from_config() {
        let config = TrackerConfig {
            namespace: "test".into(),
            storage_version: 7,
            ..TrackerConfig::default()
        };
        assert_eq!(StorageKeys::from_config(&config).budget, "test:v7:budget");
    }

    #[test]
    fn current_version_is_one() {
        assert_eq!(CURRENT_VERSION, 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryStore
// ═══════════════════════════════════════════════════════════════════

mod memory_store {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("k", "\"v\"".into()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("\"v\""));
        assert_eq!(store.len(), 1);
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn remove_missing_is_ok() {
        let mut store = MemoryStore::new();
        assert!(store.remove("nope").is_ok());
    }
}

// ═══════════════════════════════════════════════════════════════════
// FileStore
// ═══════════════════════════════════════════════════════════════════

mod file_store {
    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("a", "1".into()).unwrap();
            store.set("b", "[2]".into()).unwrap();
            store.remove("a").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("[2]"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1".into()).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// StorageManager
// ═══════════════════════════════════════════════════════════════════

mod manager {
    use super::*;

    #[test]
    fn transactions_round_trip() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        let list = vec![tx("a", 1.0), tx("b", 2.5)];

        manager.save_transactions(&mut kv, &list).unwrap();
        assert_eq!(manager.load_transactions(&kv), list);
    }

    #[test]
    fn missing_transactions_is_empty() {
        let manager = StorageManager::default();
        assert!(manager.load_transactions(&MemoryStore::new()).is_empty());
    }

    #[test]
    fn corrupted_transactions_fall_back_to_empty() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        kv.set(&manager.keys().transactions, "[{\"id\": 12".into())
            .unwrap();
        assert!(manager.load_transactions(&kv).is_empty());
    }

    #[test]
    fn unreadable_rows_are_kept_aside() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        kv.set(&manager.keys().transactions, LEGACY_ROWS.into())
            .unwrap();

        let stored = manager.load_transaction_records(&kv);
        assert_eq!(stored.transactions.len(), 1);
        assert_eq!(stored.transactions[0].note, "Rent");
        assert_eq!(stored.retained.len(), 1);
        assert_eq!(stored.retained[0]["date"], "01/06/2024");

        let readable = manager.load_transactions(&kv);
        assert_eq!(readable, stored.transactions);
    }

    #[test]
    fn invalid_and_duplicate_rows_are_kept_aside() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        let raw = r#"[
            {"id":"0b7d6f0e-8a4c-4a43-9a53-2b0d9a5e1f11","date":"2024-01-05","note":"a","cat":"Food","amt":1},
            {"id":"0b7d6f0e-8a4c-4a43-9a53-2b0d9a5e1f11","date":"2024-01-06","note":"b","cat":"Food","amt":2},
            {"id":"2d9f8a2a-ac6e-4c65-9c75-4d2f1c7a3b33","date":"2024-01-07","note":"tiny","cat":"Food","amt":0},
            {"date":"2024-01-08","note":"no id","cat":"Food","amt":3}
        ]"#;
        kv.set(&manager.keys().transactions, raw.into()).unwrap();

        let stored = manager.load_transaction_records(&kv);
        assert_eq!(stored.transactions.len(), 1);
        assert_eq!(stored.transactions[0].note, "a");
        assert_eq!(stored.retained.len(), 3);
    }

    #[test]
    fn retained_rows_are_written_back_verbatim() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        kv.set(&manager.keys().transactions, LEGACY_ROWS.into())
            .unwrap();
        let stored = manager.load_transaction_records(&kv);

        let mut list = stored.transactions.clone();
        list.push(tx("new", 3.0));
        manager
            .save_transaction_records(&mut kv, &list, &stored.retained)
            .unwrap();

        let raw: Vec<Value> =
            serde_json::from_str(&kv.get(&manager.keys().transactions).unwrap().unwrap())
                .unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0]["note"], "Rent");
        assert_eq!(raw[1]["note"], "new");
        assert_eq!(raw[2], stored.retained[0]);

        let reloaded = manager.load_transaction_records(&kv);
        assert_eq!(reloaded.transactions, list);
        assert_eq!(reloaded.retained, stored.retained);
    }

    #[test]
    fn other_version_is_not_read() {
        let v1 = StorageManager::new(StorageKeys::new("app", 1));
        let v2 = StorageManager::new(StorageKeys::new("app", 2));
        let mut kv = MemoryStore::new();
        v1.save_transactions(&mut kv, &[tx("old", 1.0)]).unwrap();
        assert!(v2.load_transactions(&kv).is_empty());
    }

    #[test]
    fn budget_round_trip_and_clear() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        assert_eq!(manager.load_budget(&kv), None);

        manager.save_budget(&mut kv, Some(500.0)).unwrap();
        assert_eq!(manager.load_budget(&kv), Some(500.0));

        manager.save_budget(&mut kv, None).unwrap();
        assert_eq!(kv.get(&manager.keys().budget).unwrap().as_deref(), Some("0.0"));
        assert_eq!(manager.load_budget(&kv), None);
    }

    #[test]
    fn budget_accepts_numeric_string() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        kv.set(&manager.keys().budget, "\"750\"".into()).unwrap();
        assert_eq!(manager.load_budget(&kv), Some(750.0));
    }

    #[test]
    fn budget_ignores_garbage() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        for raw in ["-5", "0", "\"abc\"", "{}", "not json", "null"] {
            kv.set(&manager.keys().budget, raw.into()).unwrap();
            assert_eq!(manager.load_budget(&kv), None, "raw budget {raw}");
        }
    }

    #[test]
    fn preferences_round_trip() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        assert_eq!(manager.load_preferences(&kv), Preferences::default());

        let prefs = Preferences { theme: Theme::Dark };
        manager.save_preferences(&mut kv, &prefs).unwrap();
        assert_eq!(manager.load_preferences(&kv), prefs);
    }

    #[test]
    fn clear_all_only_touches_own_keys() {
        let manager = StorageManager::default();
        let mut kv = MemoryStore::new();
        manager.save_transactions(&mut kv, &[tx("a", 1.0)]).unwrap();
        manager.save_budget(&mut kv, Some(10.0)).unwrap();
        manager
            .save_preferences(&mut kv, &Preferences::default())
            .unwrap();
        kv.set("someone-else", "1".into()).unwrap();

        manager.clear_all(&mut kv).unwrap();
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.keys().collect::<Vec<_>>(), vec!["someone-else"]);
    }

    #[test]
    fn read_write_json_helpers() {
        let mut kv = MemoryStore::new();
        write_json(&mut kv, "nums", &vec![1, 2, 3]).unwrap();
        let nums: Vec<i32> = read_json(&kv, "nums", Vec::new());
        assert_eq!(nums, vec![1, 2, 3]);

        let fallback: Vec<i32> = read_json(&kv, "missing", vec![9]);
        assert_eq!(fallback, vec![9]);
    }

    #[test]
    fn empty_string_value_uses_fallback() {
        let mut kv = MemoryStore::new();
        kv.set("k", String::new()).unwrap();
        let value: u32 = read_json(&kv, "k", 42);
        assert_eq!(value, 42);
    }
}

pub mod errors;
pub mod models;
pub mod presentation;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use models::{
    period::YearMonth,
    settings::{Preferences, Theme, TrackerConfig},
    summary::MonthlySummary,
    transaction::{sample_transactions, NewTransaction, Transaction},
};
use presentation::{DashboardView, PresentationAdapter};
use services::{
    aggregation_service::AggregationService,
    csv_service::{self, CsvCodec},
    import_service::{CsvSource, ImportReport},
    transaction_service::TransactionStore,
    undo_service::{Clock, SystemClock, UndoBuffer},
};
use std::time::{Duration, Instant};
use storage::{backend::KeyValueStore, keys::StorageKeys, manager::StorageManager};
use uuid::Uuid;

use errors::CoreError;

/// Main entry point for the expense tracker core library.
///
/// One instance per running app: it owns the key-value backend, the
/// transaction store and the undo slot, and exposes every user action.
/// Derived views are recomputed from the store on demand.
#[must_use]
pub struct ExpenseTracker<S: KeyValueStore, C: Clock = SystemClock> {
    backend: S,
    config: TrackerConfig,
    storage: StorageManager,
    store: TransactionStore,
    undo: UndoBuffer<C>,
    csv: CsvCodec,
    aggregation: AggregationService,
}

impl<S: KeyValueStore, C: Clock> std::fmt::Debug for ExpenseTracker<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseTracker")
            .field("transactions", &self.store.len())
            .field("namespace", &self.config.namespace)
            .field("storage_version", &self.config.storage_version)
            .field("undo_pending", &self.undo.is_pending())
            .finish()
    }
}

impl<S: KeyValueStore> ExpenseTracker<S> {
    /// Open a tracker over `backend` with the default configuration.
    pub fn open(backend: S) -> Self {
        Self::with_config(backend, TrackerConfig::default())
    }

    pub fn with_config(backend: S, config: TrackerConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }

    /// A timer that completes when the pending undo expires, or `None` if
    /// nothing is pending.
    ///
    /// The timer owns no borrow of the tracker: drop it to cancel, and call
    /// [`ExpenseTracker::expire_undo`] once it fires. A newer delete moves the
    /// deadline, so hosts re-arm after each delete.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn undo_expiry_timer(&self) -> Option<tokio::time::Sleep> {
        self.undo_deadline()
            .map(|deadline| tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)))
    }
}

impl<S: KeyValueStore, C: Clock> ExpenseTracker<S, C> {
    /// Open a tracker with an explicit clock for undo deadlines.
    pub fn with_clock(backend: S, config: TrackerConfig, clock: C) -> Self {
        let storage = StorageManager::new(StorageKeys::from_config(&config));
        let store = TransactionStore::open(storage.clone(), &backend);
        let undo = UndoBuffer::with_clock(config.undo_window, clock);

        Self {
            backend,
            config,
            storage,
            store,
            undo,
            csv: CsvCodec::new(),
            aggregation: AggregationService::new(),
        }
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Validate and add a transaction. Returns its new id.
    pub fn add_transaction(&mut self, candidate: NewTransaction) -> Result<Uuid, CoreError> {
        self.store.add(&mut self.backend, candidate)
    }

    /// All transactions, ascending by date (same-day entries in insertion order).
    #[must_use]
    pub fn list_transactions(&self) -> Vec<Transaction> {
        self.store.list()
    }

    #[must_use]
    pub fn get_transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.store.get(id)
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.store.len()
    }

    /// Stored rows that could not be read. They are kept in storage untouched.
    #[must_use]
    pub fn unreadable_row_count(&self) -> usize {
        self.store.unreadable_count()
    }

    /// Delete a transaction and keep it restorable for the undo window.
    /// Any previously pending undo is dropped.
    pub fn delete_transaction(&mut self, id: Uuid) -> Result<Transaction, CoreError> {
        let (position, removed) = self.store.take(&mut self.backend, id)?;
        self.undo.capture_at(removed.clone(), position);
        Ok(removed)
    }

    // ── Undo ────────────────────────────────────────────────────────

    /// Restore the most recently deleted transaction (same id, same place).
    pub fn undo_delete(&mut self) -> Result<Transaction, CoreError> {
        self.undo.restore(&mut self.store, &mut self.backend)
    }

    /// Drop the pending undo if its window has passed. Hosts call this from
    /// their timer; returns `true` when the undo affordance should be hidden.
    pub fn expire_undo(&mut self) -> bool {
        self.undo.expire()
    }

    /// Give up the pending undo right away.
    pub fn dismiss_undo(&mut self) -> Option<Transaction> {
        self.undo.cancel()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.is_pending()
    }

    #[must_use]
    pub fn undo_time_remaining(&self) -> Option<Duration> {
        self.undo.time_remaining()
    }

    #[must_use]
    pub fn undo_deadline(&self) -> Option<Instant> {
        self.undo.deadline()
    }

    // ── Budget ──────────────────────────────────────────────────────

    /// The monthly budget, if a positive one is set.
    #[must_use]
    pub fn budget(&self) -> Option<f64> {
        self.storage.load_budget(&self.backend)
    }

    /// Set the monthly budget. Zero, negative or non-finite input clears it.
    /// Returns the budget now in effect.
    pub fn set_budget(&mut self, amount: f64) -> Result<Option<f64>, CoreError> {
        let budget = (amount.is_finite() && amount > 0.0).then_some(amount);
        self.storage.save_budget(&mut self.backend, budget)?;
        tracing::info!("Budget set to {budget:?}");
        Ok(budget)
    }

    pub fn clear_budget(&mut self) -> Result<(), CoreError> {
        self.storage.save_budget(&mut self.backend, None)
    }

    // ── Summary & Rendering ─────────────────────────────────────────

    /// Month total, budget remaining and category totals for `month`.
    #[must_use]
    pub fn summary(&self, month: YearMonth) -> MonthlySummary {
        self.aggregation
            .summarize(self.store.entries(), month, self.budget())
    }

    /// Summary for the current local month.
    #[must_use]
    pub fn current_summary(&self) -> MonthlySummary {
        self.summary(YearMonth::current())
    }

    /// Immutable snapshot for a presentation adapter.
    #[must_use]
    pub fn dashboard(&self, month: YearMonth) -> DashboardView {
        DashboardView {
            transactions: self.store.list(),
            summary: self.summary(month),
        }
    }

    /// Push the current state for `month` to `adapter`.
    pub fn render<P: PresentationAdapter + ?Sized>(&self, adapter: &mut P, month: YearMonth) {
        adapter.render(&self.dashboard(month));
        adapter.set_undo_available(self.can_undo());
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// All transactions as CSV, in storage order.
    #[must_use]
    pub fn export_csv(&self) -> String {
        self.csv.encode(self.store.entries())
    }

    /// Download name for an export made on `date`.
    #[must_use]
    pub fn export_file_name(&self, date: NaiveDate) -> String {
        csv_service::export_file_name(&self.config.export_prefix, date)
    }

    /// Write the CSV export into `dir` and return the file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn save_export(
        &self,
        dir: impl AsRef<std::path::Path>,
        date: NaiveDate,
    ) -> Result<std::path::PathBuf, CoreError> {
        let path = dir.as_ref().join(self.export_file_name(date));
        tokio::fs::write(&path, self.export_csv()).await?;
        tracing::info!("Exported {} transactions to {}", self.store.len(), path.display());
        Ok(path)
    }

    /// Decode CSV text and append the accepted rows.
    ///
    /// A bad header fails the whole import. Bad rows are skipped and counted.
    /// Nothing is written when no row was accepted.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, CoreError> {
        let outcome = self.csv.decode(text)?;
        let skipped = outcome.skipped;
        let imported = if outcome.transactions.is_empty() {
            0
        } else {
            self.store.append_all(&mut self.backend, outcome.transactions)?
        };

        tracing::info!("Imported {imported} transactions ({skipped} rows skipped)");
        Ok(ImportReport { imported, skipped })
    }

    /// Read `source` and import it. The read is the only await point.
    pub async fn import_from<Src: CsvSource + ?Sized>(
        &mut self,
        source: &Src,
    ) -> Result<ImportReport, CoreError> {
        let text = source.read_text().await?;
        tracing::debug!("Read {} bytes from {}", text.len(), source.name());
        self.import_csv(&text)
    }

    // ── Bulk Operations ─────────────────────────────────────────────

    /// Replace all transactions with demo data dated relative to `today`.
    pub fn seed_sample_data(&mut self, today: NaiveDate) -> Result<(), CoreError> {
        self.store
            .replace_all(&mut self.backend, sample_transactions(today))
    }

    /// Delete every stored value of this namespace: transactions, budget
    /// and preferences. Also drops any pending undo.
    pub fn factory_reset(&mut self) -> Result<(), CoreError> {
        self.storage.clear_all(&mut self.backend)?;
        self.store.forget();
        self.undo.cancel();
        tracing::info!("Factory reset of {}", self.config.namespace);
        Ok(())
    }

    // ── Preferences ─────────────────────────────────────────────────

    #[must_use]
    pub fn preferences(&self) -> Preferences {
        self.storage.load_preferences(&self.backend)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), CoreError> {
        let mut preferences = self.preferences();
        preferences.theme = theme;
        self.storage
            .save_preferences(&mut self.backend, &preferences)
    }

    /// Flip between light and dark. Returns the new theme.
    pub fn toggle_theme(&mut self) -> Result<Theme, CoreError> {
        let theme = self.preferences().theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Give the backend back (e.g. to reopen it with another configuration).
    pub fn into_backend(self) -> S {
        self.backend
    }
}

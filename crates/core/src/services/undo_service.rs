use std::time::{Duration, Instant};

use crate::errors::CoreError;
use crate::models::transaction::Transaction;
use crate::storage::backend::KeyValueStore;

use super::transaction_service::TransactionStore;

/// Source of "now" for undo deadlines.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// The deleted transaction waiting for a possible restore.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRestore {
    pub transaction: Transaction,
    /// Former position in insertion order, if known
    pub position: Option<usize>,
    pub deadline: Instant,
}

/// Single-slot, time-limited memory of the most recent delete.
///
/// A new capture replaces (and drops) any pending one. The expiry is a
/// deadline checked with [`UndoBuffer::expire`]; nothing is restored
/// automatically.
#[derive(Debug)]
pub struct UndoBuffer<C: Clock = SystemClock> {
    clock: C,
    window: Duration,
    pending: Option<PendingRestore>,
}

impl UndoBuffer<SystemClock> {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl<C: Clock> UndoBuffer<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            clock,
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Remember `transaction` for restore, appended at the end of the list.
    pub fn capture(&mut self, transaction: Transaction) {
        self.arm(transaction, None);
    }

    /// Remember `transaction` for restore at its former `position`.
    pub fn capture_at(&mut self, transaction: Transaction, position: usize) {
        self.arm(transaction, Some(position));
    }

    /// Put the pending transaction back into `store` (same id) and clear the slot.
    ///
    /// Fails with [`CoreError::NothingToUndo`] if nothing is pending or the
    /// window has passed. If the store rejects the transaction, it stays
    /// pending and the store's error is returned.
    pub fn restore(
        &mut self,
        store: &mut TransactionStore,
        kv: &mut dyn KeyValueStore,
    ) -> Result<Transaction, CoreError> {
        self.expire();
        let pending = self.pending.take().ok_or(CoreError::NothingToUndo)?;

        let position = pending.position.unwrap_or(store.len());
        if let Err(e) = store.reinsert(kv, position, pending.transaction.clone()) {
            self.pending = Some(pending);
            return Err(e);
        }

        tracing::info!("Restored transaction {}", pending.transaction.id);
        Ok(pending.transaction)
    }

    /// Clear the slot if its deadline has passed. Returns `true` if a
    /// pending transaction was dropped.
    pub fn expire(&mut self) -> bool {
        let now = self.clock.now();
        match &self.pending {
            Some(p) if now >= p.deadline => {
                tracing::debug!("Undo window for {} expired", p.transaction.id);
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending transaction, if any. Returns it.
    pub fn cancel(&mut self) -> Option<Transaction> {
        self.pending.take().map(|p| p.transaction)
    }

    /// The pending restore, if any and not yet expired.
    pub fn pending(&self) -> Option<&PendingRestore> {
        let now = self.clock.now();
        self.pending.as_ref().filter(|p| now < p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// When the pending restore expires, as seen by this buffer's clock.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending().map(|p| p.deadline)
    }

    /// Time left before the pending restore expires.
    pub fn time_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending().map(|p| p.deadline.saturating_duration_since(now))
    }

    fn arm(&mut self, transaction: Transaction, position: Option<usize>) {
        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                "Undo for {} superseded by {}",
                previous.transaction.id,
                transaction.id
            );
        }
        let deadline = self.clock.now() + self.window;
        self.pending = Some(PendingRestore {
            transaction,
            position,
            deadline,
        });
    }
}

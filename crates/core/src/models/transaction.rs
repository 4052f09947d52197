use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// Categories offered by the entry form. Imported rows may carry any
/// non-empty category.
pub const SUGGESTED_CATEGORIES: [&str; 7] = [
    "Food",
    "Transport",
    "Rent",
    "Shopping",
    "Bills",
    "Entertainment",
    "Other",
];

/// A single dated expense entry.
///
/// Transactions are never edited in place: the store only appends and
/// removes them. The persisted field names (`cat`, `amt`) match data written
/// by earlier versions of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, generated when the transaction is created
    pub id: Uuid,

    /// Date of the expense (no time component)
    pub date: NaiveDate,

    /// Free-text description, never empty after trimming
    pub note: String,

    /// Spending category, never empty after trimming
    #[serde(rename = "cat")]
    pub category: String,

    /// Amount spent (always positive, rounded to cents)
    #[serde(rename = "amt")]
    pub amount: f64,
}

/// An unvalidated transaction as entered by the user or read from a CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub note: String,
    pub category: String,
    pub amount: f64,
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        note: impl Into<String>,
        category: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            date,
            note: note.into(),
            category: category.into(),
            amount,
        }
    }
}

impl Transaction {
    /// Validate a candidate and assign it a fresh id.
    ///
    /// Rules:
    /// - note and category must be non-empty after trimming (stored trimmed)
    /// - amount must be finite and positive, and still positive once rounded to cents
    pub fn from_candidate(candidate: NewTransaction) -> Result<Self, CoreError> {
        let note = candidate.note.trim();
        if note.is_empty() {
            return Err(CoreError::ValidationError("note must not be empty".into()));
        }
        let category = candidate.category.trim();
        if category.is_empty() {
            return Err(CoreError::ValidationError(
                "category must not be empty".into(),
            ));
        }
        let amount = validate_amount(candidate.amount)?;

        Ok(Self {
            id: Uuid::new_v4(),
            date: candidate.date,
            note: note.to_string(),
            category: category.to_string(),
            amount,
        })
    }

    /// Check the invariants of an already-built transaction (used when a
    /// whole list is handed to the store, e.g. seed data or a restore).
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.note.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "transaction {} has an empty note",
                self.id
            )));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "transaction {} has an empty category",
                self.id
            )));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "transaction {} has a non-positive amount ({})",
                self.id, self.amount
            )));
        }
        Ok(())
    }
}

/// Round a monetary value to two fractional digits.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate_amount(amount: f64) -> Result<f64, CoreError> {
    if !amount.is_finite() {
        return Err(CoreError::ValidationError(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "amount must be positive, got {amount}"
        )));
    }
    let rounded = round_cents(amount);
    if rounded <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "amount {amount} rounds to zero"
        )));
    }
    Ok(rounded)
}

/// Demo data relative to `today`, used by "load sample data".
pub fn sample_transactions(today: NaiveDate) -> Vec<Transaction> {
    [
        (-20, "Groceries", "Food", 42.37),
        (-18, "Bus pass", "Transport", 63.0),
        (-15, "Rent", "Rent", 900.0),
        (-7, "T-Shirt", "Shopping", 19.99),
        (-3, "Snacks", "Food", 8.25),
    ]
    .into_iter()
    .map(|(offset, note, category, amount)| Transaction {
        id: Uuid::new_v4(),
        date: today + chrono::Duration::days(offset),
        note: note.to_string(),
        category: category.to_string(),
        amount,
    })
    .collect()
}

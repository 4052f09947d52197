use std::collections::HashMap;

use crate::models::period::YearMonth;
use crate::models::summary::{CategoryTotal, MonthlySummary, RemainingStatus};
use crate::models::transaction::{round_cents, Transaction};

/// Share of the budget below which the remaining amount is flagged.
pub const WARN_RATIO: f64 = 0.2;

/// Derives the monthly budget view from a transaction list.
///
/// Pure business logic: no I/O, no clock. The reference month is always
/// passed in.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Summarize `transactions` for `month` against an optional budget.
    ///
    /// A budget that is absent, zero, negative or non-finite counts as
    /// "no budget": `remaining` is `None` and the status is `None`.
    pub fn summarize(
        &self,
        transactions: &[Transaction],
        month: YearMonth,
        budget: Option<f64>,
    ) -> MonthlySummary {
        let mut month_total = 0.0;
        let mut transaction_count = 0;
        let mut category_totals: Vec<CategoryTotal> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for transaction in transactions.iter().filter(|t| month.contains(t.date)) {
            month_total += transaction.amount;
            transaction_count += 1;

            match index.get(transaction.category.as_str()) {
                Some(&i) => category_totals[i].total += transaction.amount,
                None => {
                    index.insert(&transaction.category, category_totals.len());
                    category_totals.push(CategoryTotal {
                        category: transaction.category.clone(),
                        total: transaction.amount,
                    });
                }
            }
        }

        let month_total = round_cents(month_total);
        for entry in &mut category_totals {
            entry.total = round_cents(entry.total);
        }

        let budget = budget.filter(|b| b.is_finite() && *b > 0.0);
        let remaining = budget.map(|b| round_cents(b - month_total));

        MonthlySummary {
            month,
            transaction_count,
            month_total,
            budget,
            remaining,
            status: remaining_status(budget, remaining),
            category_totals,
        }
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify the remaining amount relative to the budget.
pub fn remaining_status(budget: Option<f64>, remaining: Option<f64>) -> RemainingStatus {
    match (budget, remaining) {
        (Some(budget), Some(remaining)) if budget > 0.0 => {
            if remaining < 0.0 {
                RemainingStatus::Over
            } else if remaining < budget * WARN_RATIO {
                RemainingStatus::Warn
            } else {
                RemainingStatus::Ok
            }
        }
        _ => RemainingStatus::None,
    }
}

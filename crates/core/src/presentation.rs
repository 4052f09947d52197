//! Rendering seam.
//!
//! The core never draws anything. After every change it hands an immutable
//! [`DashboardView`] to a [`PresentationAdapter`], which may target a web
//! view, a native UI or a terminal.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::summary::{MonthlySummary, RemainingStatus};
use crate::models::transaction::Transaction;

/// Everything a front end needs to redraw: the table rows, the badge and
/// the chart input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// All transactions, ascending by date
    pub transactions: Vec<Transaction>,
    pub summary: MonthlySummary,
}

/// Implemented by each rendering target.
pub trait PresentationAdapter {
    /// Redraw table, totals, budget badge and category chart.
    fn render(&mut self, view: &DashboardView);

    /// Show or hide the "undo delete" affordance.
    fn set_undo_available(&mut self, available: bool);
}

/// Format an amount as Canadian dollars, e.g. `$1,234.56` or `-$12.00`.
pub fn format_money(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = (amount.abs() * 100.0).round() as u64;
    let (dollars, cents) = (cents / 100, cents % 100);

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && (dollars > 0 || cents > 0) { "-" } else { "" };
    format!("{sign}${grouped}.{cents:02}")
}

/// Plain-text dashboard, e.g. for a terminal front end or logs.
#[derive(Debug, Default)]
pub struct TextPresenter {
    output: String,
    undo_available: bool,
}

impl TextPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently rendered dashboard.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn undo_available(&self) -> bool {
        self.undo_available
    }
}

impl PresentationAdapter for TextPresenter {
    fn render(&mut self, view: &DashboardView) {
        let summary = &view.summary;
        let mut out = String::new();

        if view.transactions.is_empty() {
            out.push_str("No transactions yet.\n");
        }
        for t in &view.transactions {
            let _ = writeln!(
                out,
                "{}  {:<24} {:<14} {:>12}",
                t.date,
                t.note,
                t.category,
                format_money(t.amount)
            );
        }

        let _ = writeln!(out, "Total ({}): {}", summary.month, format_money(summary.month_total));
        match (summary.remaining, summary.status) {
            (Some(remaining), status) if status != RemainingStatus::None => {
                let _ = writeln!(out, "Remaining: {} [{status}]", format_money(remaining));
            }
            _ => out.push_str("Remaining: —\n"),
        }

        for c in &summary.category_totals {
            let _ = writeln!(out, "  {}: {}", c.category, format_money(c.total));
        }

        self.output = out;
    }

    fn set_undo_available(&mut self, available: bool) {
        self.undo_available = available;
    }
}

use serde::{Deserialize, Serialize};

use super::period::YearMonth;

/// How the month's spending compares with the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainingStatus {
    /// No budget set
    None,
    /// Spent more than the budget
    Over,
    /// Less than 20% of the budget left
    Warn,
    /// At least 20% of the budget left
    Ok,
}

impl std::fmt::Display for RemainingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemainingStatus::None => write!(f, "none"),
            RemainingStatus::Over => write!(f, "over"),
            RemainingStatus::Warn => write!(f, "warn"),
            RemainingStatus::Ok => write!(f, "ok"),
        }
    }
}

/// Total spent in one category during the reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Input for the category chart: parallel label/value arrays.
///
/// Order is first-appearance order; consumers must not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Derived budget view for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Month this summary was computed for
    pub month: YearMonth,

    /// Number of transactions dated in the month
    pub transaction_count: usize,

    /// Sum of amounts dated in the month
    pub month_total: f64,

    /// The budget the summary was computed against, if one is set
    pub budget: Option<f64>,

    /// `budget - month_total`; absent when no budget is set
    pub remaining: Option<f64>,

    pub status: RemainingStatus,

    /// Per-category totals, in order of first appearance
    pub category_totals: Vec<CategoryTotal>,
}

impl MonthlySummary {
    /// Chart-ready view of the category totals.
    pub fn chart_data(&self) -> ChartData {
        let (labels, values) = self
            .category_totals
            .iter()
            .map(|c| (c.category.clone(), c.total))
            .unzip();
        ChartData { labels, values }
    }

    /// Total for a single category, if it had spending this month.
    pub fn category_total(&self, category: &str) -> Option<f64> {
        self.category_totals
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.total)
    }
}

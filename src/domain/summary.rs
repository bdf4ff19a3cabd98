use serde::{Deserialize, Serialize};

use super::{percent_of, Cents};

/// Income and expense totals for a period, with the savings derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub income_total: Cents,
    pub expense_total: Cents,
    /// `income_total - expense_total`
    pub savings: Cents,
    /// Savings as a percentage of income; 0 without income
    pub savings_rate: f64,
}

impl MonthlySummary {
    pub fn new(income_total: Cents, expense_total: Cents) -> Self {
        let savings = income_total - expense_total;
        Self {
            income_total,
            expense_total,
            savings,
            savings_rate: percent_of(savings, income_total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.income_total == 0 && self.expense_total == 0
    }

    /// Expenses as a percentage of income; 0 without income.
    pub fn expense_ratio(&self) -> f64 {
        percent_of(self.expense_total, self.income_total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Okay,
    Warning,
    NoData,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Okay => "okay",
            HealthStatus::Warning => "warning",
            HealthStatus::NoData => "no_data",
        }
    }

    /// Advisory (message, tip) shown with each status.
    pub fn advice(&self) -> (&'static str, &'static str) {
        match self {
            HealthStatus::Excellent => (
                "Excellent! You're saving over 20% of your income.",
                "Consider increasing your emergency fund or investment contributions.",
            ),
            HealthStatus::Good => (
                "Good progress! Try to increase savings to 20%.",
                "Look for areas to reduce expenses and increase savings.",
            ),
            HealthStatus::Okay => (
                "You're saving money, but aim for at least 10% of income.",
                "Create a budget to identify potential savings opportunities.",
            ),
            HealthStatus::Warning => (
                "You're spending more than you earn this month.",
                "Review your expenses and consider cutting non-essential spending.",
            ),
            HealthStatus::NoData => (
                "Add income and expense transactions to see your financial health.",
                "Start by recording your monthly income and tracking daily expenses.",
            ),
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialHealth {
    pub status: HealthStatus,
    pub message: String,
    pub tip: String,
}

/// Classify a summary by its savings rate.
///
/// | condition            | status    |
/// |----------------------|-----------|
/// | no income            | no_data   |
/// | rate >= 20           | excellent |
/// | rate >= 10           | good      |
/// | savings >= 0         | okay      |
/// | savings < 0          | warning   |
pub fn classify_financial_health(summary: &MonthlySummary) -> FinancialHealth {
    let status = if summary.income_total <= 0 {
        HealthStatus::NoData
    } else if summary.savings_rate >= 20.0 {
        HealthStatus::Excellent
    } else if summary.savings_rate >= 10.0 {
        HealthStatus::Good
    } else if summary.savings >= 0 {
        HealthStatus::Okay
    } else {
        HealthStatus::Warning
    };

    let (message, tip) = status.advice();
    FinancialHealth {
        status,
        message: message.to_string(),
        tip: tip.to_string(),
    }
}

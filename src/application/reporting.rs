use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Budget, BudgetUsage, CategoryId, Cents, FinancialHealth, FinancialTip, GoalProgress,
    MonthYear, MonthlySummary, Transaction,
};

/// Which window a dashboard summary was finally computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// The requested month had activity
    CurrentMonth,
    /// Nothing this month; the previous calendar month is shown
    PreviousMonth,
    /// Neither month had activity; the trailing days window is shown
    RollingWindow,
    /// The owner has never recorded anything
    NoData,
}

impl SummarySource {
    pub fn describe(&self) -> &'static str {
        match self {
            SummarySource::CurrentMonth => "this month",
            SummarySource::PreviousMonth => "last month (no activity this month)",
            SummarySource::RollingWindow => "recent activity (no activity this or last month)",
            SummarySource::NoData => "no transactions recorded yet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackSummary {
    pub summary: MonthlySummary,
    pub source: SummarySource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub category_name: String,
    pub category_icon: String,
    pub category_color: String,
    #[serde(flatten)]
    pub usage: BudgetUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetOverview {
    pub period: MonthYear,
    pub statuses: Vec<BudgetStatus>,
    pub total_budgeted: Cents,
    pub total_spent: Cents,
    pub total_remaining: Cents,
}

/// A budget that crossed the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub category: String,
    pub percentage: f64,
    pub is_over: bool,
    pub over_amount: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: MonthYear,
    /// "M/YYYY"
    pub label: String,
    pub income_total: Cents,
    pub expense_total: Cents,
    pub savings: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub total: Cents,
}

/// Chart payload: parallel label/value/color arrays, values in currency units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

/// One bar of the budget progress chart, values in currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub category: String,
    pub budgeted: f64,
    pub spent: f64,
    pub percentage: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub period: MonthYear,
    pub summary: FallbackSummary,
    pub health: FinancialHealth,
    pub expense_ratio: f64,
    pub transaction_count: i64,
    pub recent_transactions: Vec<Transaction>,
    pub budgets: Vec<BudgetStatus>,
    pub budget_alerts: Vec<BudgetAlert>,
    /// The most recently created goals
    pub goals: Vec<GoalProgress>,
    pub financial_tips: Vec<FinancialTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub period: MonthYear,
    pub expense_breakdown: Vec<CategoryTotal>,
    pub trend: Vec<TrendPoint>,
    pub top_categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerStats {
    pub transactions: i64,
    pub categories: i64,
    pub budgets: i64,
}

/// Cents as currency units, for chart payloads only.
pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

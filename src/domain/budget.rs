use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{capped_percent_of, CategoryId, Cents, MonthYear, OwnerId};

pub type BudgetId = Uuid;

/// A spending limit for one expense category in one calendar month.
/// `(owner, category, month, year)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub owner: OwnerId,
    pub category: CategoryId,
    pub amount_cents: Cents,
    pub period: MonthYear,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(owner: OwnerId, category: CategoryId, amount_cents: Cents, period: MonthYear) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            category,
            amount_cents,
            period,
            created_at: Utc::now(),
        }
    }
}

/// How much of a budget has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub budgeted: Cents,
    pub spent: Cents,
    /// Negative once the budget is exceeded
    pub remaining: Cents,
    /// 0..=100; stays at 100 when over budget
    pub percentage_used: f64,
    pub is_over: bool,
    /// How far spending exceeds the budget, 0 otherwise
    pub over_amount: Cents,
}

impl BudgetUsage {
    pub fn compute(budgeted: Cents, spent: Cents) -> Self {
        Self {
            budgeted,
            spent,
            remaining: budgeted - spent,
            percentage_used: capped_percent_of(spent, budgeted).max(0.0),
            is_over: spent > budgeted,
            over_amount: (spent - budgeted).max(0),
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{capped_percent_of, Cents, OwnerId};

pub type GoalId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: GoalId,
    pub owner: OwnerId,
    pub title: String,
    pub target_amount: Cents,
    pub current_amount: Cents,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        owner: OwnerId,
        title: impl Into<String>,
        target_amount: Cents,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            target_amount,
            current_amount: 0,
            target_date,
            created_at: Utc::now(),
        }
    }

    pub fn with_current_amount(mut self, current_amount: Cents) -> Self {
        self.current_amount = current_amount;
        self
    }
}

/// Progress of a savings goal as of a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: SavingsGoal,
    /// 0..=100
    pub progress_pct: f64,
    pub is_completed: bool,
    /// Days until the target date; 0 once it has passed
    pub days_remaining: i64,
}

impl GoalProgress {
    pub fn compute(goal: &SavingsGoal, today: NaiveDate) -> Self {
        Self {
            progress_pct: capped_percent_of(goal.current_amount, goal.target_amount).max(0.0),
            is_completed: goal.current_amount >= goal.target_amount,
            days_remaining: (goal.target_date - today).num_days().max(0),
            goal: goal.clone(),
        }
    }

    /// Amount still missing to reach the target.
    pub fn amount_left(&self) -> Cents {
        (self.goal.target_amount - self.goal.current_amount).max(0)
    }
}

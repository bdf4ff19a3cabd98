use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{PeriodError, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    /// The store handed back something that doesn't hold together: an
    /// unparseable value, or a reference to a record that no longer exists.
    #[error("Malformed ledger data: {0}")]
    Data(String),

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("User not found: {0}")]
    OwnerNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category already exists: {name} ({kind})")]
    CategoryAlreadyExists { name: String, kind: String },

    #[error(
        "Cannot delete category '{name}': it is used by {transactions} transactions and {budgets} budgets"
    )]
    CategoryInUse {
        name: String,
        transactions: i64,
        budgets: i64,
    },

    #[error("Budgets can only be set on expense categories: {0}")]
    NotAnExpenseCategory(String),

    #[error("A budget for '{category}' already exists for {period}")]
    BudgetAlreadyExists { category: String, period: String },

    #[error("Budget not found: {0}")]
    BudgetNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Savings goal not found: {0}")]
    GoalNotFound(String),

    #[error("Financial tip not found: {0}")]
    TipNotFound(String),

    #[error("Database error: {0}")]
    Database(anyhow::Error),
}

/// Raised by storage code when a stored value can't be interpreted.
/// Surfaces to callers as [`AppError::Data`].
#[derive(Error, Debug)]
#[error("{0}")]
pub struct MalformedData(pub String);

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<MalformedData>() {
            Some(malformed) => AppError::Data(malformed.0.clone()),
            None => AppError::Database(err),
        }
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        match err {
            PeriodError::EndBeforeStart { start, end } => AppError::InvalidRange { start, end },
            PeriodError::InvalidMonth(month) => {
                AppError::Validation(ValidationError::InvalidMonth(month))
            }
            PeriodError::InvalidYear(year) => {
                AppError::Validation(ValidationError::UnsupportedYear(year))
            }
            PeriodError::WindowOutOfRange(days) => {
                AppError::Validation(ValidationError::WindowOutOfRange(days))
            }
            other => AppError::Data(other.to_string()),
        }
    }
}

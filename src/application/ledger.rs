use async_trait::async_trait;

use crate::domain::{
    AmountQuery, Budget, Category, CategoryId, CategoryTotalsQuery, Cents, MonthYear, OwnerId,
    SavingsGoal,
};

use super::AppError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Total for one category, carrying the category so callers can show its
/// name, icon and color.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAggregate {
    pub category: Category,
    pub total: Cents,
}

/// Read access to a user's financial records.
///
/// The aggregation layer only ever talks to this trait. Implementations must
/// return 0 (not an error) for sums with no matching rows, and report values
/// they cannot interpret as [`AppError::Data`].
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn sum_amounts(&self, query: &AmountQuery) -> Result<Cents>;

    async fn category_totals(&self, query: &CategoryTotalsQuery) -> Result<Vec<CategoryAggregate>>;

    async fn count_transactions(&self, owner: OwnerId) -> Result<i64>;

    async fn list_budgets(&self, owner: OwnerId, period: MonthYear) -> Result<Vec<Budget>>;

    async fn list_goals(&self, owner: OwnerId) -> Result<Vec<SavingsGoal>>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;
}

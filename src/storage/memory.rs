use async_trait::async_trait;

use crate::application::{ledger::Result, AppError, CategoryAggregate, Ledger};
use crate::domain::{
    self, AmountQuery, Budget, Category, CategoryId, CategoryTotalsQuery, Cents, MonthYear,
    OwnerId, SavingsGoal, Transaction,
};

/// A [`Ledger`] over plain vectors.
///
/// Used for previews and tests where a database would only get in the way.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    goals: Vec<SavingsGoal>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn with_transactions(mut self, transactions: impl IntoIterator<Item = Transaction>) -> Self {
        self.transactions.extend(transactions);
        self
    }

    pub fn with_budgets(mut self, budgets: impl IntoIterator<Item = Budget>) -> Self {
        self.budgets.extend(budgets);
        self
    }

    pub fn with_goals(mut self, goals: impl IntoIterator<Item = SavingsGoal>) -> Self {
        self.goals.extend(goals);
        self
    }

    fn find_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn sum_amounts(&self, query: &AmountQuery) -> Result<Cents> {
        Ok(domain::sum_amounts(query, &self.transactions))
    }

    async fn category_totals(&self, query: &CategoryTotalsQuery) -> Result<Vec<CategoryAggregate>> {
        domain::category_totals(query, &self.transactions)
            .into_iter()
            .map(|(id, total)| -> Result<CategoryAggregate> {
                let category = self.find_category(id).cloned().ok_or_else(|| {
                    AppError::Data(format!("transactions reference missing category {}", id))
                })?;
                Ok(CategoryAggregate { category, total })
            })
            .collect()
    }

    async fn count_transactions(&self, owner: OwnerId) -> Result<i64> {
        Ok(self.transactions.iter().filter(|t| t.owner == owner).count() as i64)
    }

    async fn list_budgets(&self, owner: OwnerId, period: MonthYear) -> Result<Vec<Budget>> {
        Ok(self
            .budgets
            .iter()
            .filter(|b| b.owner == owner && b.period == period)
            .cloned()
            .collect())
    }

    async fn list_goals(&self, owner: OwnerId) -> Result<Vec<SavingsGoal>> {
        Ok(self
            .goals
            .iter()
            .filter(|g| g.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.find_category(id).cloned())
    }
}

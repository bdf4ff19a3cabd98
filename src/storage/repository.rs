use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, SqlitePool, Type};
use uuid::Uuid;

use crate::application::{ledger, CategoryAggregate, Ledger, MalformedData};
use crate::domain::{
    AmountQuery, Budget, BudgetId, Category, CategoryId, CategoryTotalsQuery, Cents, DateRange,
    FinancialTip, GoalId, Kind, MonthYear, Owner, OwnerId, SavingsGoal, TipId, TipPriority,
    Transaction, TransactionId,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const CATEGORY_COLUMNS: &str = "id, owner_id, name, kind, icon, color, created_at";
const TRANSACTION_COLUMNS: &str =
    "id, owner_id, category_id, amount_cents, kind, description, occurred_on, created_at";
const BUDGET_COLUMNS: &str = "id, owner_id, category_id, amount_cents, month, year, created_at";
const GOAL_COLUMNS: &str =
    "id, owner_id, title, target_amount_cents, current_amount_cents, target_date, created_at";
const TIP_COLUMNS: &str = "id, title, content, priority, is_active, created_at";

/// Filter for listing transactions. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub range: Option<DateRange>,
    pub category: Option<CategoryId>,
    pub kind: Option<Kind>,
    pub limit: Option<usize>,
}

/// SQLite-backed store for owners, categories, transactions, budgets and goals.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Owner operations
    // ========================

    pub async fn save_owner(&self, owner: &Owner) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO owners (id, username, monthly_income_cents, savings_goal_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(owner.id.to_string())
        .bind(&owner.username)
        .bind(owner.monthly_income)
        .bind(owner.savings_goal)
        .bind(owner.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    pub async fn get_owner_by_username(&self, username: &str) -> Result<Option<Owner>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, monthly_income_cents, savings_goal_cents, created_at
            FROM owners
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_owner).transpose()
    }

    pub async fn update_owner_profile(
        &self,
        id: OwnerId,
        monthly_income: Cents,
        savings_goal: Cents,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE owners SET monthly_income_cents = ?, savings_goal_cents = ? WHERE id = ?",
        )
        .bind(monthly_income)
        .bind(savings_goal)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update profile")?;
        Ok(())
    }

    fn row_to_owner(row: &SqliteRow) -> Result<Owner> {
        Ok(Owner {
            id: parse_uuid(column(row, "id")?, "user id")?,
            username: column(row, "username")?,
            monthly_income: column(row, "monthly_income_cents")?,
            savings_goal: column(row, "savings_goal_cents")?,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // ========================
    // Category operations
    // ========================

    pub async fn save_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, owner_id, name, kind, icon, color, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(category.id.to_string())
        .bind(category.owner.to_string())
        .bind(&category.name)
        .bind(category.kind.as_str())
        .bind(&category.icon)
        .bind(&category.color)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save category")?;
        Ok(())
    }

    pub async fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE id = ?",
            CATEGORY_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch category")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// Categories of `owner` called `name` (case-insensitive). An income and an
    /// expense category may share a name, hence the list.
    pub async fn find_categories_by_name(
        &self,
        owner: OwnerId,
        name: &str,
    ) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE owner_id = ? AND name = ? COLLATE NOCASE ORDER BY kind",
            CATEGORY_COLUMNS
        ))
        .bind(owner.to_string())
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch category by name")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    /// Whether `owner` has a `kind` category called `name`, ignoring case.
    pub async fn category_exists(&self, owner: OwnerId, name: &str, kind: Kind) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM categories WHERE owner_id = ? AND name = ? COLLATE NOCASE AND kind = ?",
        )
        .bind(owner.to_string())
        .bind(name)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to check category")?;
        Ok(column::<i64>(&row, "count")? > 0)
    }

    /// All categories of `owner`, income first, then by name.
    pub async fn list_categories(&self, owner: OwnerId) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE owner_id = ? ORDER BY kind DESC, name",
            CATEGORY_COLUMNS
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    pub async fn update_category(&self, category: &Category) -> Result<()> {
        sqlx::query("UPDATE categories SET name = ?, icon = ?, color = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.icon)
            .bind(&category.color)
            .bind(category.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update category")?;
        Ok(())
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;
        Ok(())
    }

    /// Number of transactions and budgets referencing a category.
    pub async fn category_usage(&self, id: CategoryId) -> Result<(i64, i64)> {
        let id_str = id.to_string();
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM transactions WHERE category_id = ?) AS transactions,
                (SELECT COUNT(*) FROM budgets WHERE category_id = ?) AS budgets
            "#,
        )
        .bind(&id_str)
        .bind(&id_str)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count category usage")?;

        Ok((column(&row, "transactions")?, column(&row, "budgets")?))
    }

    pub async fn count_categories(&self, owner: OwnerId) -> Result<i64> {
        self.count_for_owner("categories", owner).await
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        Ok(Category {
            id: parse_uuid(column(row, "id")?, "category id")?,
            owner: parse_uuid(column(row, "owner_id")?, "category owner")?,
            name: column(row, "name")?,
            kind: parse_kind(column(row, "kind")?)?,
            icon: column(row, "icon")?,
            color: column(row, "color")?,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // ========================
    // Transaction operations
    // ========================

    pub async fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, owner_id, category_id, amount_cents, kind, description, occurred_on, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.owner.to_string())
        .bind(transaction.category.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(format_date(transaction.occurred_on))
        .bind(transaction.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(())
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    pub async fn update_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET category_id = ?, amount_cents = ?, kind = ?, description = ?, occurred_on = ?
            WHERE id = ?
            "#,
        )
        .bind(transaction.category.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(format_date(transaction.occurred_on))
        .bind(transaction.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update transaction")?;
        Ok(())
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<()> {
        sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(())
    }

    /// List transactions of `owner`, newest first.
    pub async fn list_transactions(
        &self,
        owner: OwnerId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut query = format!(
            "SELECT {} FROM transactions WHERE owner_id = ?",
            TRANSACTION_COLUMNS
        );

        let (start, end) = range_bounds(filter.range);
        let category_str = filter.category.map(|id| id.to_string());

        if start.is_some() {
            query.push_str(" AND occurred_on >= ?");
        }
        if end.is_some() {
            query.push_str(" AND occurred_on <= ?");
        }
        if category_str.is_some() {
            query.push_str(" AND category_id = ?");
        }
        if filter.kind.is_some() {
            query.push_str(" AND kind = ?");
        }

        query.push_str(" ORDER BY occurred_on DESC, created_at DESC");

        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some(ref start) = start {
            sql_query = sql_query.bind(start);
        }
        if let Some(ref end) = end {
            sql_query = sql_query.bind(end);
        }
        if let Some(ref category) = category_str {
            sql_query = sql_query.bind(category);
        }
        if let Some(kind) = filter.kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Sum transaction amounts matching `query` with SQL aggregation.
    pub async fn sum_amounts_matching(&self, query: &AmountQuery) -> Result<Cents> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(amount_cents), 0) AS total FROM transactions WHERE owner_id = ?",
        );

        let (start, end) = range_bounds(query.range);
        let category_str = query.category.map(|id| id.to_string());

        if query.kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        if category_str.is_some() {
            sql.push_str(" AND category_id = ?");
        }
        if start.is_some() {
            sql.push_str(" AND occurred_on >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND occurred_on <= ?");
        }

        let mut sql_query = sqlx::query(&sql).bind(query.owner.to_string());
        if let Some(kind) = query.kind {
            sql_query = sql_query.bind(kind.as_str());
        }
        if let Some(ref category) = category_str {
            sql_query = sql_query.bind(category);
        }
        if let Some(ref start) = start {
            sql_query = sql_query.bind(start);
        }
        if let Some(ref end) = end {
            sql_query = sql_query.bind(end);
        }

        let row = sql_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum transactions")?;

        column(&row, "total")
    }

    /// Per-category totals in a single grouped query.
    pub async fn totals_by_category(
        &self,
        query: &CategoryTotalsQuery,
    ) -> Result<Vec<CategoryAggregate>> {
        let mut sql = String::from(
            r#"
            SELECT
                t.category_id AS category_id,
                c.owner_id AS owner_id,
                c.name AS name,
                c.kind AS kind,
                c.icon AS icon,
                c.color AS color,
                c.created_at AS created_at,
                SUM(t.amount_cents) AS total
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.owner_id = ? AND t.kind = ?
            "#,
        );

        let (start, end) = range_bounds(Some(query.range));
        if start.is_some() {
            sql.push_str(" AND t.occurred_on >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND t.occurred_on <= ?");
        }
        sql.push_str(" GROUP BY t.category_id ORDER BY total DESC");

        let mut sql_query = sqlx::query(&sql)
            .bind(query.owner.to_string())
            .bind(query.kind.as_str());
        if let Some(ref start) = start {
            sql_query = sql_query.bind(start);
        }
        if let Some(ref end) = end {
            sql_query = sql_query.bind(end);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to total transactions by category")?;

        rows.iter()
            .map(|row| -> Result<CategoryAggregate> {
                let category_id: String = column(row, "category_id")?;
                let Some(name) = column::<Option<String>>(row, "name")? else {
                    return Err(MalformedData(format!(
                        "transactions reference missing category {}",
                        category_id
                    ))
                    .into());
                };
                Ok(CategoryAggregate {
                    category: Category {
                        id: parse_uuid(category_id, "category id")?,
                        owner: parse_uuid(column(row, "owner_id")?, "category owner")?,
                        name,
                        kind: parse_kind(column(row, "kind")?)?,
                        icon: column(row, "icon")?,
                        color: column(row, "color")?,
                        created_at: parse_timestamp(column(row, "created_at")?)?,
                    },
                    total: column(row, "total")?,
                })
            })
            .collect()
    }

    pub async fn count_transactions_for_owner(&self, owner: OwnerId) -> Result<i64> {
        self.count_for_owner("transactions", owner).await
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let amount_cents: Cents = column(row, "amount_cents")?;
        if amount_cents <= 0 {
            return Err(
                MalformedData(format!("non-positive transaction amount {}", amount_cents)).into(),
            );
        }

        Ok(Transaction {
            id: parse_uuid(column(row, "id")?, "transaction id")?,
            owner: parse_uuid(column(row, "owner_id")?, "transaction owner")?,
            category: parse_uuid(column(row, "category_id")?, "transaction category")?,
            amount_cents,
            kind: parse_kind(column(row, "kind")?)?,
            description: column(row, "description")?,
            occurred_on: parse_date(column(row, "occurred_on")?)?,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // ========================
    // Budget operations
    // ========================

    pub async fn save_budget(&self, budget: &Budget) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO budgets (id, owner_id, category_id, amount_cents, month, year, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(budget.id.to_string())
        .bind(budget.owner.to_string())
        .bind(budget.category.to_string())
        .bind(budget.amount_cents)
        .bind(budget.period.month() as i64)
        .bind(budget.period.year() as i64)
        .bind(budget.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save budget")?;
        Ok(())
    }

    pub async fn get_budget(&self, id: BudgetId) -> Result<Option<Budget>> {
        let row = sqlx::query(&format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch budget")?;

        row.as_ref().map(Self::row_to_budget).transpose()
    }

    /// The budget for one category and month, if any.
    pub async fn find_budget(
        &self,
        owner: OwnerId,
        category: CategoryId,
        period: MonthYear,
    ) -> Result<Option<Budget>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM budgets WHERE owner_id = ? AND category_id = ? AND month = ? AND year = ?",
            BUDGET_COLUMNS
        ))
        .bind(owner.to_string())
        .bind(category.to_string())
        .bind(period.month() as i64)
        .bind(period.year() as i64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        row.as_ref().map(Self::row_to_budget).transpose()
    }

    /// Budgets of one month, ordered by category name.
    pub async fn list_budgets_for_period(
        &self,
        owner: OwnerId,
        period: MonthYear,
    ) -> Result<Vec<Budget>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.owner_id, b.category_id, b.amount_cents, b.month, b.year, b.created_at
            FROM budgets b
            LEFT JOIN categories c ON c.id = b.category_id
            WHERE b.owner_id = ? AND b.month = ? AND b.year = ?
            ORDER BY c.name
            "#,
        )
        .bind(owner.to_string())
        .bind(period.month() as i64)
        .bind(period.year() as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list budgets")?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    pub async fn update_budget(&self, budget: &Budget) -> Result<()> {
        sqlx::query("UPDATE budgets SET amount_cents = ?, month = ?, year = ? WHERE id = ?")
            .bind(budget.amount_cents)
            .bind(budget.period.month() as i64)
            .bind(budget.period.year() as i64)
            .bind(budget.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update budget")?;
        Ok(())
    }

    pub async fn delete_budget(&self, id: BudgetId) -> Result<()> {
        sqlx::query("DELETE FROM budgets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete budget")?;
        Ok(())
    }

    pub async fn count_budgets(&self, owner: OwnerId) -> Result<i64> {
        self.count_for_owner("budgets", owner).await
    }

    fn row_to_budget(row: &SqliteRow) -> Result<Budget> {
        let month: i64 = column(row, "month")?;
        let year: i64 = column(row, "year")?;
        let period = u32::try_from(month)
            .ok()
            .zip(i32::try_from(year).ok())
            .and_then(|(month, year)| MonthYear::new(month, year).ok())
            .ok_or_else(|| MalformedData(format!("invalid budget period {}/{}", month, year)))?;

        Ok(Budget {
            id: parse_uuid(column(row, "id")?, "budget id")?,
            owner: parse_uuid(column(row, "owner_id")?, "budget owner")?,
            category: parse_uuid(column(row, "category_id")?, "budget category")?,
            amount_cents: column(row, "amount_cents")?,
            period,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // ========================
    // Savings goal operations
    // ========================

    pub async fn save_goal(&self, goal: &SavingsGoal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO savings_goals (id, owner_id, title, target_amount_cents, current_amount_cents, target_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal.id.to_string())
        .bind(goal.owner.to_string())
        .bind(&goal.title)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(format_date(goal.target_date))
        .bind(goal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save savings goal")?;
        Ok(())
    }

    pub async fn get_goal(&self, id: GoalId) -> Result<Option<SavingsGoal>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM savings_goals WHERE id = ?",
            GOAL_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch savings goal")?;

        row.as_ref().map(Self::row_to_goal).transpose()
    }

    /// Goals of `owner`, most recently created first.
    pub async fn list_goals_for_owner(&self, owner: OwnerId) -> Result<Vec<SavingsGoal>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM savings_goals WHERE owner_id = ? ORDER BY created_at DESC, title",
            GOAL_COLUMNS
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list savings goals")?;

        rows.iter().map(Self::row_to_goal).collect()
    }

    pub async fn update_goal(&self, goal: &SavingsGoal) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE savings_goals
            SET title = ?, target_amount_cents = ?, current_amount_cents = ?, target_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&goal.title)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(format_date(goal.target_date))
        .bind(goal.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update savings goal")?;
        Ok(())
    }

    pub async fn delete_goal(&self, id: GoalId) -> Result<()> {
        sqlx::query("DELETE FROM savings_goals WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete savings goal")?;
        Ok(())
    }

    fn row_to_goal(row: &SqliteRow) -> Result<SavingsGoal> {
        Ok(SavingsGoal {
            id: parse_uuid(column(row, "id")?, "goal id")?,
            owner: parse_uuid(column(row, "owner_id")?, "goal owner")?,
            title: column(row, "title")?,
            target_amount: column(row, "target_amount_cents")?,
            current_amount: column(row, "current_amount_cents")?,
            target_date: parse_date(column(row, "target_date")?)?,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // ========================
    // Financial tip operations
    // ========================

    pub async fn save_tip(&self, tip: &FinancialTip) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO financial_tips (id, title, content, priority, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tip.id.to_string())
        .bind(&tip.title)
        .bind(&tip.content)
        .bind(tip.priority.as_str())
        .bind(tip.is_active)
        .bind(tip.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save financial tip")?;
        Ok(())
    }

    pub async fn get_tip(&self, id: TipId) -> Result<Option<FinancialTip>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM financial_tips WHERE id = ?",
            TIP_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch financial tip")?;

        row.as_ref().map(Self::row_to_tip).transpose()
    }

    /// Tips by priority (high first), newest first within a priority.
    pub async fn list_tips(&self, active_only: bool, limit: Option<usize>) -> Result<Vec<FinancialTip>> {
        let mut query = format!("SELECT {} FROM financial_tips", TIP_COLUMNS);
        if active_only {
            query.push_str(" WHERE is_active = 1");
        }
        query.push_str(
            " ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, created_at DESC",
        );
        if let Some(limit) = limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list financial tips")?;

        rows.iter().map(Self::row_to_tip).collect()
    }

    pub async fn set_tip_active(&self, id: TipId, is_active: bool) -> Result<()> {
        sqlx::query("UPDATE financial_tips SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update financial tip")?;
        Ok(())
    }

    pub async fn delete_tip(&self, id: TipId) -> Result<()> {
        sqlx::query("DELETE FROM financial_tips WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete financial tip")?;
        Ok(())
    }

    fn row_to_tip(row: &SqliteRow) -> Result<FinancialTip> {
        let priority: String = column(row, "priority")?;
        Ok(FinancialTip {
            id: parse_uuid(column(row, "id")?, "tip id")?,
            title: column(row, "title")?,
            content: column(row, "content")?,
            priority: TipPriority::from_str(&priority).ok_or_else(|| {
                MalformedData(format!("invalid tip priority: '{}'", priority))
            })?,
            is_active: column(row, "is_active")?,
            created_at: parse_timestamp(column(row, "created_at")?)?,
        })
    }

    // `table` is always one of our own table names, never user input.
    async fn count_for_owner(&self, table: &str, owner: OwnerId) -> Result<i64> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS count FROM {} WHERE owner_id = ?",
            table
        ))
        .bind(owner.to_string())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to count {}", table))?;

        column(&row, "count")
    }
}

#[async_trait]
impl Ledger for Repository {
    async fn sum_amounts(&self, query: &AmountQuery) -> ledger::Result<Cents> {
        Ok(self.sum_amounts_matching(query).await?)
    }

    async fn category_totals(
        &self,
        query: &CategoryTotalsQuery,
    ) -> ledger::Result<Vec<CategoryAggregate>> {
        Ok(self.totals_by_category(query).await?)
    }

    async fn count_transactions(&self, owner: OwnerId) -> ledger::Result<i64> {
        Ok(self.count_transactions_for_owner(owner).await?)
    }

    async fn list_budgets(&self, owner: OwnerId, period: MonthYear) -> ledger::Result<Vec<Budget>> {
        Ok(self.list_budgets_for_period(owner, period).await?)
    }

    async fn list_goals(&self, owner: OwnerId) -> ledger::Result<Vec<SavingsGoal>> {
        Ok(self.list_goals_for_owner(owner).await?)
    }

    async fn get_category(&self, id: CategoryId) -> ledger::Result<Option<Category>> {
        Ok(self.fetch_category(id).await?)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn range_bounds(range: Option<DateRange>) -> (Option<String>, Option<String>) {
    match range {
        Some(range) => (range.start.map(format_date), range.end.map(format_date)),
        None => (None, None),
    }
}

fn parse_uuid(value: String, what: &str) -> Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| MalformedData(format!("invalid {}: '{}'", what, value)).into())
}

fn parse_kind(value: String) -> Result<Kind> {
    Kind::from_str(&value)
        .ok_or_else(|| MalformedData(format!("invalid category kind: '{}'", value)).into())
}

fn parse_date(value: String) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|_| MalformedData(format!("invalid date: '{}'", value)).into())
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MalformedData(format!("invalid timestamp: '{}'", value)).into())
}

/// Reads a column, reporting a value of the wrong storage class as malformed
/// data. SQLite lets REAL or TEXT into an INTEGER column.
fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| MalformedData(format!("unreadable column '{}': {}", name, e)).into())
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use budgetwise::application::FinanceService;
use budgetwise::domain::validation::{NewBudget, NewTransaction};
use budgetwise::domain::{
    Budget, Category, Cents, Kind, MonthYear, Owner, OwnerId, Transaction,
};
use budgetwise::storage::Repository;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(FinanceService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = FinanceService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

fn database_url(temp_dir: &TempDir) -> String {
    format!("sqlite:{}", temp_dir.path().join("test.db").display())
}

/// A second repository over the test database, for driving the aggregator directly
pub async fn test_repository(temp_dir: &TempDir) -> Result<Repository> {
    Repository::connect(&database_url(temp_dir)).await
}

/// Raw pool over the test database, for writing rows the service would refuse
pub async fn raw_pool(temp_dir: &TempDir) -> Result<SqlitePool> {
    Ok(SqlitePool::connect(&database_url(temp_dir)).await?)
}

/// Helper to create a test service plus a user with the default categories
pub async fn test_owner() -> Result<(FinanceService, Owner, TempDir)> {
    let (service, temp_dir) = test_service().await?;
    let owner = service.ensure_owner("tester").await?;
    Ok((service, owner, temp_dir))
}

/// Helper to build a date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn month(year: i32, month: u32) -> MonthYear {
    MonthYear::new(month, year).unwrap()
}

/// Record a transaction in one of the default categories.
pub async fn record(
    service: &FinanceService,
    owner: OwnerId,
    category: &str,
    amount: Cents,
    on: NaiveDate,
) -> Result<Transaction> {
    let input = NewTransaction {
        amount_cents: amount,
        description: format!("{} on {}", category, on),
        occurred_on: on,
    };
    Ok(service
        .record_transaction(owner, category, None, input)
        .await?)
}

/// Set a monthly budget on an expense category.
pub async fn budget(
    service: &FinanceService,
    owner: OwnerId,
    category: &str,
    amount: Cents,
    period: MonthYear,
) -> Result<Budget> {
    let input = NewBudget {
        amount_cents: amount,
        month: period.month(),
        year: period.year(),
    };
    Ok(service.create_budget(owner, category, input).await?)
}

/// In-memory fixture: one owner with a salary and two expense categories.
pub struct Household {
    pub owner: OwnerId,
    pub salary: Category,
    pub food: Category,
    pub rent: Category,
}

impl Household {
    pub fn new() -> Self {
        let owner = uuid::Uuid::new_v4();
        Self {
            owner,
            salary: Category::new(owner, "Salary", Kind::Income).with_color("#27ae60"),
            food: Category::new(owner, "Food & Dining", Kind::Expense).with_color("#e74c3c"),
            rent: Category::new(owner, "Rent", Kind::Expense).with_color("#34495e"),
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        vec![self.salary.clone(), self.food.clone(), self.rent.clone()]
    }

    pub fn tx(&self, category: &Category, amount: Cents, on: NaiveDate) -> Transaction {
        Transaction::new(category, amount, "test", on)
    }
}

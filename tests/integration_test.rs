mod common;

use anyhow::Result;
use budgetwise::application::{
    AppError, CategoryUpdate, FinanceService, GoalUpdate, TransactionUpdate,
};
use budgetwise::domain::validation::{
    NewCategory, NewSavingsGoal, NewTransaction, ProfileUpdate,
};
use budgetwise::domain::{DateRange, Kind, ValidationError, DEFAULT_CATEGORIES};
use budgetwise::storage::TransactionFilter;
use common::{budget, date, month, record, test_owner, test_service};

// ========================
// Owners
// ========================

#[tokio::test]
async fn test_ensure_owner_seeds_default_categories_once() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let first = service.ensure_owner("ana").await?;
    let again = service.ensure_owner("ana").await?;
    assert_eq!(first.id, again.id);

    let categories = service.list_categories(first.id).await?;
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(categories.iter().filter(|c| c.kind == Kind::Income).count(), 3);

    // Income first, then by name
    assert_eq!(categories[0].name, "Freelance");
    assert_eq!(categories[3].name, "Bills & Utilities");

    let stats = service.owner_stats(first.id).await?;
    assert_eq!(stats.categories, 10);
    assert_eq!(stats.transactions, 0);
    assert_eq!(stats.budgets, 0);

    Ok(())
}

#[tokio::test]
async fn test_update_profile() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let updated = service
        .update_profile(
            &owner.username,
            ProfileUpdate {
                monthly_income: 350000,
                savings_goal: 50000,
            },
        )
        .await?;
    assert_eq!(updated.monthly_income, 350000);

    let stored = service.get_owner(&owner.username).await?;
    assert_eq!(stored.monthly_income, 350000);
    assert_eq!(stored.savings_goal, 50000);

    let result = service
        .update_profile(
            &owner.username,
            ProfileUpdate {
                monthly_income: -1,
                savings_goal: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = service.get_owner("nobody").await;
    assert!(matches!(result, Err(AppError::OwnerNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_reconnect_keeps_data() -> Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let path = db_path.to_str().unwrap();

    {
        let service = FinanceService::init(path).await?;
        let owner = service.ensure_owner("ana").await?;
        record(&service, owner.id, "Salary", 100000, date(2024, 3, 1)).await?;
    }

    let service = FinanceService::connect(path).await?;
    let owner = service.get_owner("ana").await?;
    assert_eq!(service.owner_stats(owner.id).await?.transactions, 1);

    Ok(())
}

// ========================
// Categories
// ========================

#[tokio::test]
async fn test_create_category_with_defaults() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let category = service
        .create_category(
            owner.id,
            NewCategory {
                name: "  Pets ".into(),
                kind: Some(Kind::Expense),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(category.name, "Pets");
    assert_eq!(category.icon, "💰");
    assert_eq!(category.color, "#007bff");

    let result = service
        .create_category(
            owner.id,
            NewCategory {
                name: "Pets".into(),
                kind: Some(Kind::Expense),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::CategoryAlreadyExists { .. })));

    // Same name, other kind is allowed
    service
        .create_category(
            owner.id,
            NewCategory {
                name: "Pets".into(),
                kind: Some(Kind::Income),
                ..Default::default()
            },
        )
        .await?;

    // ... but then looking it up needs the kind
    let result = service.find_category(owner.id, "Pets", None).await;
    assert!(matches!(result, Err(AppError::CategoryNotFound(_))));
    let income = service
        .find_category(owner.id, "pets", Some(Kind::Income))
        .await?;
    assert_eq!(income.kind, Kind::Income);

    Ok(())
}

#[tokio::test]
async fn test_category_names_unique_regardless_of_case() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let result = service
        .create_category(
            owner.id,
            NewCategory {
                name: "food & dining".into(),
                kind: Some(Kind::Expense),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::CategoryAlreadyExists { .. })));

    // The seeded category is still reachable by name
    let tx = record(&service, owner.id, "Food & Dining", 1200, date(2024, 3, 1)).await?;
    assert_eq!(tx.kind, Kind::Expense);

    // Changing only the case renames in place
    let renamed = service
        .update_category(
            owner.id,
            "food & dining",
            None,
            CategoryUpdate {
                name: Some("FOOD & DINING".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(renamed.name, "FOOD & DINING");
    assert_eq!(
        service.find_category(owner.id, "Food & Dining", None).await?.id,
        renamed.id
    );

    Ok(())
}

#[tokio::test]
async fn test_category_validation() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let result = service
        .create_category(
            owner.id,
            NewCategory {
                name: "x".repeat(101),
                kind: Some(Kind::Expense),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::TooLong { .. }))
    ));

    let result = service
        .create_category(
            owner.id,
            NewCategory {
                name: "Garden".into(),
                kind: Some(Kind::Expense),
                color: Some("green".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::InvalidColor(_)))
    ));

    Ok(())
}

#[tokio::test]
async fn test_update_category() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let updated = service
        .update_category(
            owner.id,
            "Shopping",
            None,
            CategoryUpdate {
                name: Some("Groceries".into()),
                color: Some("#ABCDEF".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.name, "Groceries");
    assert_eq!(updated.color, "#abcdef");
    assert_eq!(updated.icon, "🛍️");

    let result = service
        .update_category(
            owner.id,
            "Groceries",
            None,
            CategoryUpdate {
                name: Some("Healthcare".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::CategoryAlreadyExists { .. })));

    Ok(())
}

#[tokio::test]
async fn test_delete_category_refused_while_in_use() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    let tx = record(&service, owner.id, "Shopping", 1000, date(2024, 3, 1)).await?;
    budget(&service, owner.id, "Shopping", 5000, month(2024, 3)).await?;

    let result = service.delete_category(owner.id, "Shopping", None).await;
    match result {
        Err(AppError::CategoryInUse {
            transactions,
            budgets,
            ..
        }) => {
            assert_eq!(transactions, 1);
            assert_eq!(budgets, 1);
        }
        other => panic!("expected CategoryInUse, got {:?}", other.map(|c| c.name)),
    }

    service.delete_transaction(owner.id, tx.id).await?;
    let overview = service.budget_overview(owner.id, month(2024, 3)).await?;
    service
        .delete_budget(owner.id, overview.statuses[0].budget.id)
        .await?;

    service.delete_category(owner.id, "Shopping", None).await?;
    let result = service.find_category(owner.id, "Shopping", None).await;
    assert!(matches!(result, Err(AppError::CategoryNotFound(_))));

    Ok(())
}

// ========================
// Transactions
// ========================

#[tokio::test]
async fn test_record_transaction_copies_category_kind() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let income = record(&service, owner.id, "Salary", 320000, date(2024, 3, 1)).await?;
    let expense = record(&service, owner.id, "Healthcare", 4500, date(2024, 3, 2)).await?;
    assert_eq!(income.kind, Kind::Income);
    assert_eq!(expense.kind, Kind::Expense);

    let stored = service.get_transaction(owner.id, expense.id).await?;
    assert_eq!(stored, expense);

    Ok(())
}

#[tokio::test]
async fn test_record_transaction_validation() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let result = service
        .record_transaction(
            owner.id,
            "Shopping",
            None,
            NewTransaction {
                amount_cents: 0,
                description: "Free".into(),
                occurred_on: date(2024, 3, 1),
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::AmountTooSmall { .. }))
    ));

    let result = service
        .record_transaction(
            owner.id,
            "Shopping",
            None,
            NewTransaction {
                amount_cents: 100,
                description: "   ".into(),
                occurred_on: date(2024, 3, 1),
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Validation(ValidationError::Empty { .. }))
    ));

    let result = service
        .record_transaction(
            owner.id,
            "Unknown",
            None,
            NewTransaction {
                amount_cents: 100,
                description: "Thing".into(),
                occurred_on: date(2024, 3, 1),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::CategoryNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_transactions_filters() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    record(&service, owner.id, "Salary", 300000, date(2024, 2, 1)).await?;
    record(&service, owner.id, "Shopping", 2000, date(2024, 2, 14)).await?;
    record(&service, owner.id, "Shopping", 3000, date(2024, 3, 3)).await?;
    record(&service, owner.id, "Healthcare", 4000, date(2024, 3, 9)).await?;

    let all = service
        .list_transactions(owner.id, &TransactionFilter::default())
        .await?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].occurred_on, date(2024, 3, 9));
    assert_eq!(all[3].occurred_on, date(2024, 2, 1));

    let shopping = service.find_category(owner.id, "Shopping", None).await?;
    let filtered = service
        .list_transactions(
            owner.id,
            &TransactionFilter {
                category: Some(shopping.id),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(filtered.len(), 2);

    let march_expenses = service
        .list_transactions(
            owner.id,
            &TransactionFilter {
                range: Some(DateRange::month(month(2024, 3))),
                kind: Some(Kind::Expense),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(march_expenses.len(), 2);

    let since = service
        .list_transactions(
            owner.id,
            &TransactionFilter {
                range: Some(DateRange::since(date(2024, 2, 14))),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(since.len(), 3);

    let recent = service.recent_transactions(owner.id, 2).await?;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].amount_cents, 4000);

    Ok(())
}

#[tokio::test]
async fn test_update_transaction_moves_category() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    let tx = record(&service, owner.id, "Shopping", 2000, date(2024, 3, 3)).await?;

    let updated = service
        .update_transaction(
            owner.id,
            tx.id,
            TransactionUpdate {
                category: Some("Freelance".into()),
                amount_cents: Some(2500),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.kind, Kind::Income);
    assert_eq!(updated.amount_cents, 2500);
    assert_eq!(updated.description, tx.description);

    let summary = service.monthly_summary(owner.id, month(2024, 3)).await?;
    assert_eq!(summary.income_total, 2500);
    assert_eq!(summary.expense_total, 0);

    Ok(())
}

#[tokio::test]
async fn test_transactions_are_private_to_owner() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    let other = service.ensure_owner("other").await?;
    let tx = record(&service, owner.id, "Shopping", 2000, date(2024, 3, 3)).await?;

    let result = service.get_transaction(other.id, tx.id).await;
    assert!(matches!(result, Err(AppError::TransactionNotFound(_))));
    let result = service.delete_transaction(other.id, tx.id).await;
    assert!(matches!(result, Err(AppError::TransactionNotFound(_))));

    // Other user's category of the same name is distinct
    let result = record(&service, other.id, "Shopping", 500, date(2024, 3, 3)).await;
    assert!(result.is_ok());
    assert_eq!(
        service
            .monthly_summary(owner.id, month(2024, 3))
            .await?
            .expense_total,
        2000
    );

    Ok(())
}

// ========================
// Savings goals
// ========================

#[tokio::test]
async fn test_goal_lifecycle() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let goal = service
        .create_goal(
            owner.id,
            NewSavingsGoal {
                title: "Vacation".into(),
                target_amount: 200000,
                current_amount: 0,
                target_date: date(2024, 8, 1),
            },
        )
        .await?;

    let updated = service
        .update_goal(
            owner.id,
            goal.id,
            GoalUpdate {
                current_amount: Some(200000),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.current_amount, 200000);

    let progress = service.goal_progress(owner.id, date(2024, 7, 1)).await?;
    assert_eq!(progress.len(), 1);
    assert!(progress[0].is_completed);
    assert_eq!(progress[0].progress_pct, 100.0);
    assert_eq!(progress[0].days_remaining, 31);

    let result = service
        .update_goal(
            owner.id,
            goal.id,
            GoalUpdate {
                target_amount: Some(0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    service.delete_goal(owner.id, goal.id).await?;
    assert!(service.list_goals(owner.id).await?.is_empty());
    let result = service.get_goal(owner.id, goal.id).await;
    assert!(matches!(result, Err(AppError::GoalNotFound(_))));

    Ok(())
}

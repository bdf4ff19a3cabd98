mod common;

use anyhow::Result;
use budgetwise::application::{AppError, SummarySource, DASHBOARD_GOALS, DASHBOARD_TIPS};
use budgetwise::domain::validation::{NewFinancialTip, NewSavingsGoal};
use budgetwise::domain::{HealthStatus, Kind, TipPriority};
use budgetwise::io::{ExportFormat, Exporter};
use budgetwise::storage::TransactionFilter;
use common::{budget, date, month, record, test_owner};

#[tokio::test]
async fn test_dashboard_for_new_user() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    let dashboard = service.dashboard(owner.id, date(2024, 3, 15)).await?;

    assert_eq!(dashboard.summary.source, SummarySource::NoData);
    assert!(dashboard.summary.summary.is_empty());
    assert_eq!(dashboard.health.status, HealthStatus::NoData);
    assert_eq!(dashboard.transaction_count, 0);
    assert!(dashboard.recent_transactions.is_empty());
    assert!(dashboard.budgets.is_empty());
    assert!(dashboard.goals.is_empty());
    assert!(dashboard.financial_tips.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_dashboard_current_month() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    let today = date(2024, 3, 20);

    record(&service, owner.id, "Salary", 500000, date(2024, 3, 1)).await?;
    record(&service, owner.id, "Food & Dining", 40000, date(2024, 3, 5)).await?;
    record(&service, owner.id, "Bills & Utilities", 310000, date(2024, 3, 6)).await?;
    budget(&service, owner.id, "Food & Dining", 45000, month(2024, 3)).await?;
    budget(&service, owner.id, "Shopping", 20000, month(2024, 3)).await?;
    service
        .create_goal(
            owner.id,
            NewSavingsGoal {
                title: "Emergency fund".into(),
                target_amount: 300000,
                current_amount: 75000,
                target_date: date(2024, 12, 31),
            },
        )
        .await?;

    let dashboard = service.dashboard(owner.id, today).await?;

    assert_eq!(dashboard.summary.source, SummarySource::CurrentMonth);
    assert_eq!(dashboard.summary.summary.income_total, 500000);
    assert_eq!(dashboard.summary.summary.expense_total, 350000);
    // 30% saved
    assert_eq!(dashboard.health.status, HealthStatus::Excellent);
    assert_eq!(dashboard.expense_ratio, 70.0);
    assert_eq!(dashboard.transaction_count, 3);
    assert_eq!(dashboard.recent_transactions.len(), 3);
    assert_eq!(dashboard.recent_transactions[0].occurred_on, date(2024, 3, 6));

    assert_eq!(dashboard.budgets.len(), 2);
    // Food at 88.9% is alerted, Shopping at 0% is not
    assert_eq!(dashboard.budget_alerts.len(), 1);
    assert_eq!(dashboard.budget_alerts[0].category, "Food & Dining");

    assert_eq!(dashboard.goals.len(), 1);
    assert_eq!(dashboard.goals[0].progress_pct, 25.0);

    Ok(())
}

#[tokio::test]
async fn test_dashboard_limits_goals_and_tips() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;

    for i in 0..5 {
        service
            .create_goal(
                owner.id,
                NewSavingsGoal {
                    title: format!("Goal {}", i),
                    target_amount: 100000,
                    current_amount: 0,
                    target_date: date(2025, 1, 1),
                },
            )
            .await?;
    }

    let tips = [
        ("Automate Your Savings", TipPriority::Low),
        ("50/30/20 Budget Rule", TipPriority::High),
        ("Track Your Expenses Daily", TipPriority::Medium),
        ("Build an Emergency Fund", TipPriority::High),
        ("Review and Adjust Monthly", TipPriority::Medium),
    ];
    for (title, priority) in tips {
        service
            .add_tip(NewFinancialTip {
                title: title.into(),
                content: format!("{} content", title),
                priority: Some(priority),
            })
            .await?;
        // created_at orders tips of the same priority
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    let hidden = service
        .list_tips()
        .await?
        .into_iter()
        .find(|t| t.title == "Build an Emergency Fund")
        .ok_or_else(|| anyhow::anyhow!("tip missing"))?;
    service.set_tip_active(hidden.id, false).await?;

    let dashboard = service.dashboard(owner.id, date(2024, 3, 15)).await?;

    assert_eq!(dashboard.goals.len(), DASHBOARD_GOALS);
    assert_eq!(dashboard.financial_tips.len(), DASHBOARD_TIPS);
    let titles: Vec<&str> = dashboard
        .financial_tips
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    // High first, then newest first within a priority
    assert_eq!(
        titles,
        vec![
            "50/30/20 Budget Rule",
            "Review and Adjust Monthly",
            "Track Your Expenses Daily",
        ]
    );

    // All tips stay listed, the hidden one included
    assert_eq!(service.list_tips().await?.len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_financial_tip_lifecycle() -> Result<()> {
    let (service, _temp) = common::test_service().await?;

    let tip = service
        .add_tip(NewFinancialTip {
            title: "Pay yourself first".into(),
            content: "Move savings out on payday.".into(),
            priority: None,
        })
        .await?;
    assert_eq!(tip.priority, TipPriority::Medium);
    assert!(tip.is_active);

    let hidden = service.set_tip_active(tip.id, false).await?;
    assert!(!hidden.is_active);
    assert!(service.active_tips(DASHBOARD_TIPS).await?.is_empty());
    assert!(!service.get_tip(tip.id).await?.is_active);

    service.delete_tip(tip.id).await?;
    let result = service.get_tip(tip.id).await;
    assert!(matches!(result, Err(AppError::TipNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_dashboard_falls_back_to_last_month() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Salary", 250000, date(2024, 2, 25)).await?;
    record(&service, owner.id, "Shopping", 260000, date(2024, 2, 26)).await?;

    let dashboard = service.dashboard(owner.id, date(2024, 3, 2)).await?;

    assert_eq!(dashboard.summary.source, SummarySource::PreviousMonth);
    assert_eq!(dashboard.summary.summary.savings, -10000);
    assert_eq!(dashboard.health.status, HealthStatus::Warning);

    Ok(())
}

#[tokio::test]
async fn test_reports_bundle() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    let today = date(2024, 3, 20);

    record(&service, owner.id, "Salary", 400000, date(2023, 11, 1)).await?;
    record(&service, owner.id, "Salary", 400000, date(2024, 3, 1)).await?;
    record(&service, owner.id, "Transportation", 6000, date(2024, 3, 3)).await?;
    record(&service, owner.id, "Food & Dining", 9000, date(2024, 3, 4)).await?;
    record(&service, owner.id, "Healthcare", 20000, date(2024, 1, 15)).await?;
    // More than 90 days back
    record(&service, owner.id, "Education", 80000, date(2023, 12, 1)).await?;

    let reports = service.reports(owner.id, today).await?;

    let breakdown: Vec<&str> = reports
        .expense_breakdown
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(breakdown, vec!["Food & Dining", "Transportation"]);

    assert_eq!(reports.trend.len(), 6);
    assert_eq!(reports.trend[0].label, "10/2023");
    assert_eq!(reports.trend[1].income_total, 400000);
    assert_eq!(reports.trend[5].expense_total, 15000);

    let top: Vec<&str> = reports
        .top_categories
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(top, vec!["Healthcare", "Food & Dining", "Transportation"]);

    Ok(())
}

#[tokio::test]
async fn test_category_breakdown_income_and_range_errors() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Salary", 300000, date(2024, 3, 1)).await?;
    record(&service, owner.id, "Freelance", 45000, date(2024, 3, 12)).await?;
    record(&service, owner.id, "Freelance", 5000, date(2024, 3, 31)).await?;

    let income = service
        .category_breakdown(owner.id, Kind::Income, date(2024, 3, 1), date(2024, 3, 31))
        .await?;
    assert_eq!(income.len(), 2);
    assert_eq!(income[0].name, "Salary");
    assert_eq!(income[1].total, 50000);

    // Inclusive end bound
    let single_day = service
        .category_breakdown(owner.id, Kind::Income, date(2024, 3, 31), date(2024, 3, 31))
        .await?;
    assert_eq!(single_day.len(), 1);
    assert_eq!(single_day[0].total, 5000);

    let result = service
        .category_breakdown(owner.id, Kind::Income, date(2024, 4, 1), date(2024, 3, 1))
        .await;
    assert!(matches!(result, Err(AppError::InvalidRange { .. })));

    Ok(())
}

#[tokio::test]
async fn test_expense_chart_payload() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Shopping", 2599, date(2024, 3, 3)).await?;
    record(&service, owner.id, "Entertainment", 12000, date(2024, 3, 3)).await?;

    let chart = service.expense_chart(owner.id, month(2024, 3)).await?;
    assert_eq!(chart.labels, vec!["Entertainment", "Shopping"]);
    assert_eq!(chart.data, vec![120.0, 25.99]);
    assert_eq!(chart.colors, vec!["#3498db", "#9b59b6"]);

    let json = serde_json::to_value(&chart)?;
    assert!(json.get("labels").is_some());
    assert!(json.get("data").is_some());
    assert!(json.get("colors").is_some());

    Ok(())
}

#[tokio::test]
async fn test_health_uses_fallback_summary() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Salary", 100000, date(2024, 2, 1)).await?;
    record(&service, owner.id, "Shopping", 85000, date(2024, 2, 2)).await?;

    let (summary, health) = service.health(owner.id, date(2024, 3, 10)).await?;
    assert_eq!(summary.savings, 15000);
    assert_eq!(health.status, HealthStatus::Good);

    Ok(())
}

#[tokio::test]
async fn test_export_trend_csv() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Salary", 100000, date(2024, 2, 1)).await?;
    record(&service, owner.id, "Shopping", 2500, date(2024, 3, 2)).await?;

    let exporter = Exporter::new(&service, owner.id);
    let mut buffer = Vec::new();
    let count = exporter
        .export_trend(&mut buffer, 3, month(2024, 3), ExportFormat::Csv)
        .await?;

    assert_eq!(count, 3);
    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "month,income_cents,expense_cents,savings_cents",
            "2024-01,0,0,0",
            "2024-02,100000,0,100000",
            "2024-03,0,2500,-2500",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_export_transactions_json_and_csv() -> Result<()> {
    let (service, owner, _temp) = test_owner().await?;
    record(&service, owner.id, "Salary", 100000, date(2024, 2, 1)).await?;
    record(&service, owner.id, "Shopping", 2500, date(2024, 3, 2)).await?;

    let exporter = Exporter::new(&service, owner.id);

    let mut buffer = Vec::new();
    let count = exporter
        .export_transactions(&mut buffer, &TransactionFilter::default(), ExportFormat::Json)
        .await?;
    assert_eq!(count, 2);
    let records: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(records[0]["category"], "Shopping");
    assert_eq!(records[0]["amount"], "25.00");
    assert_eq!(records[1]["kind"], "income");

    let mut buffer = Vec::new();
    exporter
        .export_transactions(&mut buffer, &TransactionFilter::default(), ExportFormat::Csv)
        .await?;
    let csv = String::from_utf8(buffer)?;
    assert!(csv.starts_with("id,date,kind,category,description,amount_cents,amount"));
    assert!(csv.contains(",2024-03-02,expense,Shopping,"));

    Ok(())
}

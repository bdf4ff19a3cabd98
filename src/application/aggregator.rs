use chrono::NaiveDate;

use crate::domain::{
    days_before, AmountQuery, Budget, BudgetUsage, CategoryTotalsQuery, Cents, DateRange,
    GoalProgress, Kind, MonthYear, MonthlySummary, OwnerId, SavingsGoal, ValidationError,
};

use super::ledger::{Ledger, Result};
use super::reporting::{
    cents_to_units, BudgetAlert, BudgetOverview, BudgetProgress, BudgetStatus, CategoryTotal,
    ChartData, FallbackSummary, SummarySource, TrendPoint,
};
use super::AppError;

/// Size of the last-resort dashboard window, in days before "today".
pub const DEFAULT_FALLBACK_WINDOW_DAYS: i64 = 30;

/// Budgets above this share of use are reported as alerts.
pub const DEFAULT_ALERT_THRESHOLD_PCT: f64 = 80.0;

/// Longest trend series, one hundred years of months.
pub const MAX_TREND_MONTHS: usize = 1200;

/// Derives summaries, budget consumption, goal progress and trends from a
/// [`Ledger`].
///
/// Holds nothing but a borrowed ledger: every method is a read, and calling
/// one twice against an unchanged ledger gives the same answer. Anything that
/// depends on the current date takes it as a parameter.
pub struct FinancialAggregator<'a, L: ?Sized> {
    ledger: &'a L,
    fallback_window_days: i64,
}

impl<'a, L: Ledger + ?Sized> FinancialAggregator<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self {
            ledger,
            fallback_window_days: DEFAULT_FALLBACK_WINDOW_DAYS,
        }
    }

    pub fn with_fallback_window(mut self, days: i64) -> Self {
        self.fallback_window_days = days;
        self
    }

    // ========================
    // Monthly summaries
    // ========================

    /// Income and expense totals for one calendar month.
    pub async fn monthly_summary(&self, owner: OwnerId, period: MonthYear) -> Result<MonthlySummary> {
        self.summarize(owner, DateRange::month(period)).await
    }

    /// The dashboard summary: the requested month, or the most recent window
    /// that has data.
    ///
    /// 1. the requested month, if it has any income or expense;
    /// 2. all zeros if the owner has never recorded a transaction;
    /// 3. the previous calendar month, if it has any activity;
    /// 4. otherwise everything since `today - fallback window`.
    pub async fn monthly_summary_with_fallback(
        &self,
        owner: OwnerId,
        period: MonthYear,
        today: NaiveDate,
    ) -> Result<FallbackSummary> {
        let current = self.monthly_summary(owner, period).await?;
        if !current.is_empty() {
            return Ok(FallbackSummary {
                summary: current,
                source: SummarySource::CurrentMonth,
            });
        }

        if self.ledger.count_transactions(owner).await? == 0 {
            return Ok(FallbackSummary {
                summary: MonthlySummary::default(),
                source: SummarySource::NoData,
            });
        }

        let previous = self.monthly_summary(owner, period.previous()).await?;
        if !previous.is_empty() {
            return Ok(FallbackSummary {
                summary: previous,
                source: SummarySource::PreviousMonth,
            });
        }

        let window = DateRange::trailing_days(today, self.fallback_window_days)?;
        Ok(FallbackSummary {
            summary: self.summarize(owner, window).await?,
            source: SummarySource::RollingWindow,
        })
    }

    /// One summary per month for the `months_back` months ending at `end`,
    /// oldest first. Months without activity yield zero points.
    pub async fn trend_series(
        &self,
        owner: OwnerId,
        months_back: usize,
        end: MonthYear,
    ) -> Result<Vec<TrendPoint>> {
        if months_back > MAX_TREND_MONTHS {
            return Err(ValidationError::TooManyMonths {
                max: MAX_TREND_MONTHS,
                value: months_back,
            }
            .into());
        }

        let mut points = Vec::new();
        for period in end.trailing(months_back)? {
            let summary = self.monthly_summary(owner, period).await?;
            points.push(TrendPoint {
                period,
                label: period.label(),
                income_total: summary.income_total,
                expense_total: summary.expense_total,
                savings: summary.savings,
            });
        }
        Ok(points)
    }

    async fn summarize(&self, owner: OwnerId, range: DateRange) -> Result<MonthlySummary> {
        let income = AmountQuery::owner(owner).kind(Kind::Income).range(range);
        let expense = AmountQuery::owner(owner).kind(Kind::Expense).range(range);

        let (income_total, expense_total) = tokio::try_join!(
            self.ledger.sum_amounts(&income),
            self.ledger.sum_amounts(&expense)
        )?;

        Ok(MonthlySummary::new(
            non_negative("income total", income_total)?,
            non_negative("expense total", expense_total)?,
        ))
    }

    // ========================
    // Budgets
    // ========================

    /// How much of `budget` has been spent within its month.
    pub async fn budget_status(&self, budget: &Budget) -> Result<BudgetStatus> {
        let category = self
            .ledger
            .get_category(budget.category)
            .await?
            .ok_or_else(|| {
                AppError::Data(format!(
                    "budget {} references missing category {}",
                    budget.id, budget.category
                ))
            })?;

        if category.owner != budget.owner {
            return Err(AppError::Data(format!(
                "budget {} references a category of another user",
                budget.id
            )));
        }
        if category.kind != Kind::Expense {
            return Err(AppError::Data(format!(
                "budget {} is set on {} category '{}'",
                budget.id, category.kind, category.name
            )));
        }

        let query = AmountQuery::owner(budget.owner)
            .kind(Kind::Expense)
            .category(budget.category)
            .range(DateRange::month(budget.period));
        let spent = non_negative("budget spending", self.ledger.sum_amounts(&query).await?)?;

        Ok(BudgetStatus {
            budget: budget.clone(),
            category_name: category.name,
            category_icon: category.icon,
            category_color: category.color,
            usage: BudgetUsage::compute(budget.amount_cents, spent),
        })
    }

    /// Status of every budget the owner set for `period`.
    pub async fn budget_statuses(&self, owner: OwnerId, period: MonthYear) -> Result<Vec<BudgetStatus>> {
        let budgets = self.ledger.list_budgets(owner, period).await?;
        let mut statuses = Vec::with_capacity(budgets.len());
        for budget in &budgets {
            statuses.push(self.budget_status(budget).await?);
        }
        Ok(statuses)
    }

    pub async fn budget_overview(&self, owner: OwnerId, period: MonthYear) -> Result<BudgetOverview> {
        let statuses = self.budget_statuses(owner, period).await?;
        let total_budgeted: Cents = statuses.iter().map(|s| s.usage.budgeted).sum();
        let total_spent: Cents = statuses.iter().map(|s| s.usage.spent).sum();

        Ok(BudgetOverview {
            period,
            statuses,
            total_budgeted,
            total_spent,
            total_remaining: total_budgeted - total_spent,
        })
    }

    /// Budget figures shaped for the progress chart.
    pub async fn budget_progress(&self, owner: OwnerId, period: MonthYear) -> Result<Vec<BudgetProgress>> {
        let statuses = self.budget_statuses(owner, period).await?;
        Ok(statuses
            .into_iter()
            .map(|status| BudgetProgress {
                category: status.category_name,
                budgeted: cents_to_units(status.usage.budgeted),
                spent: cents_to_units(status.usage.spent),
                percentage: status.usage.percentage_used,
                over_budget: status.usage.is_over,
            })
            .collect())
    }

    // ========================
    // Savings goals
    // ========================

    pub fn goal_progress(&self, goal: &SavingsGoal, today: NaiveDate) -> GoalProgress {
        GoalProgress::compute(goal, today)
    }

    pub async fn goal_progress_for_owner(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<Vec<GoalProgress>> {
        let goals = self.ledger.list_goals(owner).await?;
        Ok(goals
            .iter()
            .map(|goal| GoalProgress::compute(goal, today))
            .collect())
    }

    // ========================
    // Category breakdowns
    // ========================

    /// Totals per category for `kind` between `start` and `end` (inclusive),
    /// largest first. An empty result is not an error.
    pub async fn category_breakdown(
        &self,
        owner: OwnerId,
        kind: Kind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryTotal>> {
        let range = DateRange::between(start, end)?;
        self.breakdown_over(owner, kind, range).await
    }

    /// The `limit` largest categories over the `days` days up to `today`.
    pub async fn top_categories(
        &self,
        owner: OwnerId,
        kind: Kind,
        today: NaiveDate,
        days: i64,
        limit: usize,
    ) -> Result<Vec<CategoryTotal>> {
        let mut totals = self
            .category_breakdown(owner, kind, days_before(today, days)?, today)
            .await?;
        totals.truncate(limit);
        Ok(totals)
    }

    /// This month's expenses by category, shaped for a pie chart.
    pub async fn expense_chart(&self, owner: OwnerId, period: MonthYear) -> Result<ChartData> {
        let totals = self
            .breakdown_over(owner, Kind::Expense, DateRange::month(period))
            .await?;

        let mut chart = ChartData::default();
        for total in totals {
            chart.labels.push(total.name);
            chart.data.push(cents_to_units(total.total));
            chart.colors.push(total.color);
        }
        Ok(chart)
    }

    pub async fn month_breakdown(
        &self,
        owner: OwnerId,
        kind: Kind,
        period: MonthYear,
    ) -> Result<Vec<CategoryTotal>> {
        self.breakdown_over(owner, kind, DateRange::month(period))
            .await
    }

    async fn breakdown_over(
        &self,
        owner: OwnerId,
        kind: Kind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>> {
        let query = CategoryTotalsQuery { owner, kind, range };
        let aggregates = self.ledger.category_totals(&query).await?;

        let mut totals = Vec::with_capacity(aggregates.len());
        for aggregate in aggregates {
            totals.push(CategoryTotal {
                total: non_negative("category total", aggregate.total)?,
                category_id: aggregate.category.id,
                name: aggregate.category.name,
                icon: aggregate.category.icon,
                color: aggregate.category.color,
            });
        }

        totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        Ok(totals)
    }
}

/// Budgets whose use is above `threshold_pct`.
pub fn budget_alerts(statuses: &[BudgetStatus], threshold_pct: f64) -> Vec<BudgetAlert> {
    statuses
        .iter()
        .filter(|status| status.usage.percentage_used > threshold_pct)
        .map(|status| BudgetAlert {
            category: status.category_name.clone(),
            percentage: status.usage.percentage_used,
            is_over: status.usage.is_over,
            over_amount: status.usage.over_amount,
        })
        .collect()
}

// Stored amounts are at least one cent, so a negative sum means the store is off.
fn non_negative(what: &str, value: Cents) -> Result<Cents> {
    if value < 0 {
        return Err(AppError::Data(format!("{} is negative: {}", what, value)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::Category;

    fn status(name: &str, budgeted: Cents, spent: Cents) -> BudgetStatus {
        let owner = Uuid::new_v4();
        let category = Category::new(owner, name, Kind::Expense);
        let period = MonthYear::new(3, 2024).unwrap();
        BudgetStatus {
            budget: Budget::new(owner, category.id, budgeted, period),
            category_name: category.name,
            category_icon: category.icon,
            category_color: category.color,
            usage: BudgetUsage::compute(budgeted, spent),
        }
    }

    #[test]
    fn test_budget_alerts_above_threshold_only() {
        let statuses = vec![
            status("Food", 10000, 8000),
            status("Rent", 10000, 8001),
            status("Fun", 10000, 12500),
            status("Books", 0, 500),
        ];

        let alerts = budget_alerts(&statuses, DEFAULT_ALERT_THRESHOLD_PCT);
        let names: Vec<&str> = alerts.iter().map(|a| a.category.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Fun"]);

        let fun = &alerts[1];
        assert!(fun.is_over);
        assert_eq!(fun.percentage, 100.0);
        assert_eq!(fun.over_amount, 2500);
    }

    #[test]
    fn test_non_negative_guard() {
        assert_eq!(non_negative("x", 0).unwrap(), 0);
        assert!(matches!(non_negative("x", -1), Err(AppError::Data(_))));
    }
}

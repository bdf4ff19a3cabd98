use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{
    Budget, BudgetId, Category, Cents, FinancialHealth, FinancialTip, GoalId, GoalProgress, Kind,
    MonthYear, MonthlySummary, Owner, OwnerId, SavingsGoal, TipId, Transaction, TransactionId,
    classify_financial_health, default_categories,
    validation::{
        NewBudget, NewCategory, NewFinancialTip, NewSavingsGoal, NewTransaction, ProfileUpdate,
    },
};
use crate::storage::{Repository, TransactionFilter};

use super::aggregator::{
    budget_alerts, FinancialAggregator, DEFAULT_ALERT_THRESHOLD_PCT, DEFAULT_FALLBACK_WINDOW_DAYS,
};
use super::reporting::{
    BudgetOverview, BudgetProgress, CategoryTotal, ChartData, Dashboard, OwnerStats, ReportBundle,
    TrendPoint,
};
use super::AppError;

/// Transactions shown on the dashboard.
pub const DASHBOARD_RECENT_TRANSACTIONS: usize = 5;

/// Savings goals shown on the dashboard.
pub const DASHBOARD_GOALS: usize = 3;

/// Active financial tips shown on the dashboard.
pub const DASHBOARD_TIPS: usize = 3;

/// Tunables for the derived views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub trend_months: usize,
    pub fallback_window_days: i64,
    pub alert_threshold_pct: f64,
    pub top_categories: usize,
    pub top_categories_days: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            trend_months: 6,
            fallback_window_days: DEFAULT_FALLBACK_WINDOW_DAYS,
            alert_threshold_pct: DEFAULT_ALERT_THRESHOLD_PCT,
            top_categories: 5,
            top_categories_days: 90,
        }
    }
}

/// Partial edit of a category. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Partial edit of a transaction. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    /// Name of the new category; the transaction takes over its kind
    pub category: Option<String>,
    pub amount_cents: Option<Cents>,
    pub description: Option<String>,
    pub occurred_on: Option<NaiveDate>,
}

/// Partial edit of a savings goal. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub target_amount: Option<Cents>,
    pub current_amount: Option<Cents>,
    pub target_date: Option<NaiveDate>,
}

/// Application service providing high-level operations over a user's finances.
/// This is the primary interface for any client (CLI, exporters).
pub struct FinanceService {
    repo: Repository,
    options: ReportOptions,
}

impl FinanceService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "initialized database");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        debug!(database = database_path, "connected to database");
        Ok(Self::new(repo))
    }

    fn aggregator(&self) -> FinancialAggregator<'_, Repository> {
        FinancialAggregator::new(&self.repo).with_fallback_window(self.options.fallback_window_days)
    }

    // ========================
    // Owner operations
    // ========================

    /// Get the user called `username`, creating it with the default categories
    /// on first use.
    pub async fn ensure_owner(&self, username: &str) -> Result<Owner, AppError> {
        if let Some(owner) = self.repo.get_owner_by_username(username).await? {
            return Ok(owner);
        }

        let owner = Owner::new(username);
        self.repo.save_owner(&owner).await?;
        let categories = default_categories(owner.id);
        for category in &categories {
            self.repo.save_category(category).await?;
        }

        info!(
            user = username,
            categories = categories.len(),
            "created user with default categories"
        );
        Ok(owner)
    }

    pub async fn get_owner(&self, username: &str) -> Result<Owner, AppError> {
        self.repo
            .get_owner_by_username(username)
            .await?
            .ok_or_else(|| AppError::OwnerNotFound(username.to_string()))
    }

    /// Set the monthly income and savings goal of a user's profile.
    pub async fn update_profile(
        &self,
        username: &str,
        update: ProfileUpdate,
    ) -> Result<Owner, AppError> {
        let update = update.validate()?;
        let mut owner = self.get_owner(username).await?;

        self.repo
            .update_owner_profile(owner.id, update.monthly_income, update.savings_goal)
            .await?;
        owner.monthly_income = update.monthly_income;
        owner.savings_goal = update.savings_goal;

        info!(user = username, "updated profile");
        Ok(owner)
    }

    pub async fn owner_stats(&self, owner: OwnerId) -> Result<OwnerStats, AppError> {
        Ok(OwnerStats {
            transactions: self.repo.count_transactions_for_owner(owner).await?,
            categories: self.repo.count_categories(owner).await?,
            budgets: self.repo.count_budgets(owner).await?,
        })
    }

    // ========================
    // Category operations
    // ========================

    pub async fn create_category(
        &self,
        owner: OwnerId,
        input: NewCategory,
    ) -> Result<Category, AppError> {
        let valid = input.validate()?;

        if self
            .repo
            .category_exists(owner, &valid.name, valid.kind)
            .await?
        {
            return Err(AppError::CategoryAlreadyExists {
                name: valid.name,
                kind: valid.kind.to_string(),
            });
        }

        let category = Category::new(owner, valid.name, valid.kind)
            .with_icon(valid.icon)
            .with_color(valid.color);
        self.repo.save_category(&category).await?;

        info!(category = %category.name, kind = %category.kind, "created category");
        Ok(category)
    }

    /// Look up a category by name. `kind` disambiguates when an income and an
    /// expense category share the name.
    pub async fn find_category(
        &self,
        owner: OwnerId,
        name: &str,
        kind: Option<Kind>,
    ) -> Result<Category, AppError> {
        let mut matches = self.repo.find_categories_by_name(owner, name).await?;
        if let Some(kind) = kind {
            matches.retain(|c| c.kind == kind);
        }

        match matches.len() {
            0 => Err(AppError::CategoryNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(AppError::CategoryNotFound(format!(
                "{} (both income and expense exist, specify the kind)",
                name
            ))),
        }
    }

    pub async fn list_categories(&self, owner: OwnerId) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories(owner).await?)
    }

    pub async fn update_category(
        &self,
        owner: OwnerId,
        name: &str,
        kind: Option<Kind>,
        update: CategoryUpdate,
    ) -> Result<Category, AppError> {
        let mut category = self.find_category(owner, name, kind).await?;

        let valid = NewCategory {
            name: update.name.unwrap_or_else(|| category.name.clone()),
            kind: Some(category.kind),
            icon: Some(update.icon.unwrap_or_else(|| category.icon.clone())),
            color: Some(update.color.unwrap_or_else(|| category.color.clone())),
        }
        .validate()?;

        // A change of case only is a rename of the same category.
        if !valid.name.eq_ignore_ascii_case(&category.name)
            && self
                .repo
                .category_exists(owner, &valid.name, category.kind)
                .await?
        {
            return Err(AppError::CategoryAlreadyExists {
                name: valid.name,
                kind: category.kind.to_string(),
            });
        }

        category.name = valid.name;
        category.icon = valid.icon;
        category.color = valid.color;
        self.repo.update_category(&category).await?;

        info!(category = %category.name, "updated category");
        Ok(category)
    }

    /// Delete a category nothing refers to any more.
    pub async fn delete_category(
        &self,
        owner: OwnerId,
        name: &str,
        kind: Option<Kind>,
    ) -> Result<Category, AppError> {
        let category = self.find_category(owner, name, kind).await?;

        let (transactions, budgets) = self.repo.category_usage(category.id).await?;
        if transactions > 0 || budgets > 0 {
            return Err(AppError::CategoryInUse {
                name: category.name,
                transactions,
                budgets,
            });
        }

        self.repo.delete_category(category.id).await?;
        info!(category = %category.name, "deleted category");
        Ok(category)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record an income or expense in the named category.
    pub async fn record_transaction(
        &self,
        owner: OwnerId,
        category_name: &str,
        kind: Option<Kind>,
        input: NewTransaction,
    ) -> Result<Transaction, AppError> {
        let valid = input.validate()?;
        let category = self.find_category(owner, category_name, kind).await?;

        let transaction = Transaction::new(
            &category,
            valid.amount_cents,
            valid.description,
            valid.occurred_on,
        );
        self.repo.save_transaction(&transaction).await?;

        info!(
            id = %transaction.id,
            category = %category.name,
            amount_cents = transaction.amount_cents,
            "recorded transaction"
        );
        Ok(transaction)
    }

    pub async fn get_transaction(
        &self,
        owner: OwnerId,
        id: TransactionId,
    ) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .filter(|t| t.owner == owner)
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    pub async fn update_transaction(
        &self,
        owner: OwnerId,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, AppError> {
        let mut transaction = self.get_transaction(owner, id).await?;

        let valid = NewTransaction {
            amount_cents: update.amount_cents.unwrap_or(transaction.amount_cents),
            description: update
                .description
                .unwrap_or_else(|| transaction.description.clone()),
            occurred_on: update.occurred_on.unwrap_or(transaction.occurred_on),
        }
        .validate()?;

        if let Some(name) = update.category {
            let category = self.find_category(owner, &name, None).await?;
            transaction.recategorize(&category);
        }
        transaction.amount_cents = valid.amount_cents;
        transaction.description = valid.description;
        transaction.occurred_on = valid.occurred_on;

        self.repo.update_transaction(&transaction).await?;
        info!(id = %transaction.id, "updated transaction");
        Ok(transaction)
    }

    pub async fn delete_transaction(
        &self,
        owner: OwnerId,
        id: TransactionId,
    ) -> Result<Transaction, AppError> {
        let transaction = self.get_transaction(owner, id).await?;
        self.repo.delete_transaction(id).await?;
        info!(id = %id, "deleted transaction");
        Ok(transaction)
    }

    /// Transactions matching `filter`, newest first.
    pub async fn list_transactions(
        &self,
        owner: OwnerId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        debug!(?filter, "listing transactions");
        Ok(self.repo.list_transactions(owner, filter).await?)
    }

    pub async fn recent_transactions(
        &self,
        owner: OwnerId,
        limit: usize,
    ) -> Result<Vec<Transaction>, AppError> {
        let filter = TransactionFilter {
            limit: Some(limit),
            ..Default::default()
        };
        self.list_transactions(owner, &filter).await
    }

    // ========================
    // Budget operations
    // ========================

    /// Set a monthly budget on an expense category. One budget per category
    /// and month.
    pub async fn create_budget(
        &self,
        owner: OwnerId,
        category_name: &str,
        input: NewBudget,
    ) -> Result<Budget, AppError> {
        let valid = input.validate()?;
        let category = match self
            .find_category(owner, category_name, Some(Kind::Expense))
            .await
        {
            Err(AppError::CategoryNotFound(name)) => {
                // Only an income category by that name: say so.
                return Err(match self.find_category(owner, category_name, None).await {
                    Ok(_) => AppError::NotAnExpenseCategory(category_name.to_string()),
                    Err(_) => AppError::CategoryNotFound(name),
                });
            }
            other => other?,
        };

        if self
            .repo
            .find_budget(owner, category.id, valid.period)
            .await?
            .is_some()
        {
            return Err(AppError::BudgetAlreadyExists {
                category: category.name,
                period: valid.period.label(),
            });
        }

        let budget = Budget::new(owner, category.id, valid.amount_cents, valid.period);
        self.repo.save_budget(&budget).await?;

        info!(
            category = %category.name,
            period = %valid.period,
            amount_cents = budget.amount_cents,
            "created budget"
        );
        Ok(budget)
    }

    pub async fn get_budget(&self, owner: OwnerId, id: BudgetId) -> Result<Budget, AppError> {
        self.repo
            .get_budget(id)
            .await?
            .filter(|b| b.owner == owner)
            .ok_or_else(|| AppError::BudgetNotFound(id.to_string()))
    }

    /// Change a budget's amount and, optionally, move it to another month.
    pub async fn update_budget(
        &self,
        owner: OwnerId,
        id: BudgetId,
        amount_cents: Option<Cents>,
        period: Option<MonthYear>,
    ) -> Result<Budget, AppError> {
        let mut budget = self.get_budget(owner, id).await?;
        let target = period.unwrap_or(budget.period);

        let valid = NewBudget {
            amount_cents: amount_cents.unwrap_or(budget.amount_cents),
            month: target.month(),
            year: target.year(),
        }
        .validate()?;

        if valid.period != budget.period {
            if self
                .repo
                .find_budget(owner, budget.category, valid.period)
                .await?
                .is_some()
            {
                let category = self
                    .repo
                    .fetch_category(budget.category)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_else(|| budget.category.to_string());
                return Err(AppError::BudgetAlreadyExists {
                    category,
                    period: valid.period.label(),
                });
            }
        }

        budget.amount_cents = valid.amount_cents;
        budget.period = valid.period;
        self.repo.update_budget(&budget).await?;

        info!(id = %budget.id, "updated budget");
        Ok(budget)
    }

    pub async fn delete_budget(&self, owner: OwnerId, id: BudgetId) -> Result<Budget, AppError> {
        let budget = self.get_budget(owner, id).await?;
        self.repo.delete_budget(id).await?;
        info!(id = %id, "deleted budget");
        Ok(budget)
    }

    // ========================
    // Savings goal operations
    // ========================

    pub async fn create_goal(
        &self,
        owner: OwnerId,
        input: NewSavingsGoal,
    ) -> Result<SavingsGoal, AppError> {
        let valid = input.validate()?;
        let goal = SavingsGoal::new(owner, valid.title, valid.target_amount, valid.target_date)
            .with_current_amount(valid.current_amount);
        self.repo.save_goal(&goal).await?;

        info!(goal = %goal.title, target_cents = goal.target_amount, "created savings goal");
        Ok(goal)
    }

    pub async fn get_goal(&self, owner: OwnerId, id: GoalId) -> Result<SavingsGoal, AppError> {
        self.repo
            .get_goal(id)
            .await?
            .filter(|g| g.owner == owner)
            .ok_or_else(|| AppError::GoalNotFound(id.to_string()))
    }

    pub async fn list_goals(&self, owner: OwnerId) -> Result<Vec<SavingsGoal>, AppError> {
        Ok(self.repo.list_goals_for_owner(owner).await?)
    }

    pub async fn update_goal(
        &self,
        owner: OwnerId,
        id: GoalId,
        update: GoalUpdate,
    ) -> Result<SavingsGoal, AppError> {
        let mut goal = self.get_goal(owner, id).await?;

        let valid = NewSavingsGoal {
            title: update.title.unwrap_or_else(|| goal.title.clone()),
            target_amount: update.target_amount.unwrap_or(goal.target_amount),
            current_amount: update.current_amount.unwrap_or(goal.current_amount),
            target_date: update.target_date.unwrap_or(goal.target_date),
        }
        .validate()?;

        goal.title = valid.title;
        goal.target_amount = valid.target_amount;
        goal.current_amount = valid.current_amount;
        goal.target_date = valid.target_date;
        self.repo.update_goal(&goal).await?;

        info!(goal = %goal.title, "updated savings goal");
        Ok(goal)
    }

    pub async fn delete_goal(&self, owner: OwnerId, id: GoalId) -> Result<SavingsGoal, AppError> {
        let goal = self.get_goal(owner, id).await?;
        self.repo.delete_goal(id).await?;
        info!(goal = %goal.title, "deleted savings goal");
        Ok(goal)
    }

    // ========================
    // Financial tip operations
    // ========================

    pub async fn add_tip(&self, input: NewFinancialTip) -> Result<FinancialTip, AppError> {
        let valid = input.validate()?;
        let tip = FinancialTip::new(valid.title, valid.content, valid.priority);
        self.repo.save_tip(&tip).await?;

        info!(tip = %tip.title, priority = %tip.priority, "added financial tip");
        Ok(tip)
    }

    pub async fn get_tip(&self, id: TipId) -> Result<FinancialTip, AppError> {
        self.repo
            .get_tip(id)
            .await?
            .ok_or_else(|| AppError::TipNotFound(id.to_string()))
    }

    /// Every tip, inactive ones included, highest priority first.
    pub async fn list_tips(&self) -> Result<Vec<FinancialTip>, AppError> {
        Ok(self.repo.list_tips(false, None).await?)
    }

    /// The `limit` most prominent active tips.
    pub async fn active_tips(&self, limit: usize) -> Result<Vec<FinancialTip>, AppError> {
        Ok(self.repo.list_tips(true, Some(limit)).await?)
    }

    /// Show or hide a tip on dashboards.
    pub async fn set_tip_active(&self, id: TipId, is_active: bool) -> Result<FinancialTip, AppError> {
        let mut tip = self.get_tip(id).await?;
        self.repo.set_tip_active(id, is_active).await?;
        tip.is_active = is_active;

        info!(tip = %tip.title, is_active, "changed financial tip visibility");
        Ok(tip)
    }

    pub async fn delete_tip(&self, id: TipId) -> Result<FinancialTip, AppError> {
        let tip = self.get_tip(id).await?;
        self.repo.delete_tip(id).await?;
        info!(tip = %tip.title, "deleted financial tip");
        Ok(tip)
    }

    // ========================
    // Views
    // ========================

    /// Everything the dashboard shows, as of `today`.
    pub async fn dashboard(&self, owner: OwnerId, today: NaiveDate) -> Result<Dashboard, AppError> {
        debug!(%owner, %today, "building dashboard");
        let aggregator = self.aggregator();
        let period = MonthYear::of(today);

        let summary = aggregator
            .monthly_summary_with_fallback(owner, period, today)
            .await?;
        let budgets = aggregator.budget_statuses(owner, period).await?;
        let budget_alerts = budget_alerts(&budgets, self.options.alert_threshold_pct);
        let mut goals = aggregator.goal_progress_for_owner(owner, today).await?;
        goals.truncate(DASHBOARD_GOALS);

        Ok(Dashboard {
            today,
            period,
            health: classify_financial_health(&summary.summary),
            expense_ratio: summary.summary.expense_ratio(),
            summary,
            transaction_count: self.repo.count_transactions_for_owner(owner).await?,
            recent_transactions: self
                .recent_transactions(owner, DASHBOARD_RECENT_TRANSACTIONS)
                .await?,
            budgets,
            budget_alerts,
            goals,
            financial_tips: self.active_tips(DASHBOARD_TIPS).await?,
        })
    }

    pub async fn budget_overview(
        &self,
        owner: OwnerId,
        period: MonthYear,
    ) -> Result<BudgetOverview, AppError> {
        debug!(%owner, %period, "building budget overview");
        self.aggregator().budget_overview(owner, period).await
    }

    /// Current-month expense breakdown, trend and top categories.
    pub async fn reports(&self, owner: OwnerId, today: NaiveDate) -> Result<ReportBundle, AppError> {
        debug!(%owner, %today, "building reports");
        let aggregator = self.aggregator();
        let period = MonthYear::of(today);

        Ok(ReportBundle {
            period,
            expense_breakdown: aggregator
                .month_breakdown(owner, Kind::Expense, period)
                .await?,
            trend: aggregator
                .trend_series(owner, self.options.trend_months, period)
                .await?,
            top_categories: self.top_categories(owner, Kind::Expense, today).await?,
        })
    }

    pub async fn monthly_summary(
        &self,
        owner: OwnerId,
        period: MonthYear,
    ) -> Result<MonthlySummary, AppError> {
        self.aggregator().monthly_summary(owner, period).await
    }

    /// Health of one month, using the dashboard fallback when it is empty.
    pub async fn health(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<(MonthlySummary, FinancialHealth), AppError> {
        let summary = self
            .aggregator()
            .monthly_summary_with_fallback(owner, MonthYear::of(today), today)
            .await?
            .summary;
        Ok((summary, classify_financial_health(&summary)))
    }

    pub async fn trend(
        &self,
        owner: OwnerId,
        months: usize,
        end: MonthYear,
    ) -> Result<Vec<TrendPoint>, AppError> {
        self.aggregator().trend_series(owner, months, end).await
    }

    pub async fn category_breakdown(
        &self,
        owner: OwnerId,
        kind: Kind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        self.aggregator()
            .category_breakdown(owner, kind, start, end)
            .await
    }

    pub async fn top_categories(
        &self,
        owner: OwnerId,
        kind: Kind,
        today: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        self.aggregator()
            .top_categories(
                owner,
                kind,
                today,
                self.options.top_categories_days,
                self.options.top_categories,
            )
            .await
    }

    pub async fn expense_chart(
        &self,
        owner: OwnerId,
        period: MonthYear,
    ) -> Result<ChartData, AppError> {
        self.aggregator().expense_chart(owner, period).await
    }

    pub async fn budget_progress(
        &self,
        owner: OwnerId,
        period: MonthYear,
    ) -> Result<Vec<BudgetProgress>, AppError> {
        self.aggregator().budget_progress(owner, period).await
    }

    pub async fn goal_progress(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<Vec<GoalProgress>, AppError> {
        self.aggregator().goal_progress_for_owner(owner, today).await
    }
}

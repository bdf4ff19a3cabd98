use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;
use uuid::Uuid;

use crate::application::{
    CategoryTotal, CategoryUpdate, FinanceService, GoalUpdate, TransactionUpdate,
};
use crate::config::{init_logging, Settings};
use crate::domain::{
    format_cents, parse_cents, percent_of, CategoryId, Cents, DateRange, Kind, MonthYear, Owner,
    TipPriority, Transaction,
    validation::{
        NewBudget, NewCategory, NewFinancialTip, NewSavingsGoal, NewTransaction, ProfileUpdate,
    },
};
use crate::io::{ExportFormat, Exporter};
use crate::storage::TransactionFilter;

/// Budgetwise - Personal Finance Tracker
#[derive(Parser)]
#[command(name = "budgetwise")]
#[command(about = "Track income and expenses, set monthly budgets and savings goals, and see where your money goes")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides the settings file)
    #[arg(short, long, env = "BUDGETWISE_DB")]
    pub database: Option<String>,

    /// User to act as (overrides the settings file)
    #[arg(short, long, env = "BUDGETWISE_USER")]
    pub user: Option<String>,

    /// Settings file (JSON)
    #[arg(long, env = "BUDGETWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database and create the user with default categories
    Init,

    /// Show or change the user profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Income and expense transactions
    #[command(subcommand)]
    Tx(TxCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Financial tips shown on every dashboard
    #[command(subcommand)]
    Tip(TipCommands),

    /// Overview of this month: summary, health, budgets, goals, recent activity
    Dashboard {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Generate reports and analytics
    #[command(subcommand)]
    Report(ReportCommands),

    /// Chart payloads as JSON
    #[command(subcommand)]
    Chart(ChartCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: trend, breakdown, transactions
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Months covered by a trend export
        #[arg(long)]
        months: Option<usize>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Category kind for a breakdown: income, expense
        #[arg(long, default_value = "expense")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile and record counts
    Show,

    /// Set the monthly income and savings goal
    Set {
        /// Expected monthly income (e.g., "3500.00")
        #[arg(long)]
        income: Option<String>,

        /// Monthly savings goal
        #[arg(long)]
        savings_goal: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category
    Add {
        /// Category name
        name: String,

        /// Kind: income, expense
        #[arg(short, long)]
        kind: String,

        /// Icon (emoji)
        #[arg(long)]
        icon: Option<String>,

        /// Color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
    },

    /// List categories
    List,

    /// Change a category's name, icon or color
    Edit {
        /// Current category name
        name: String,

        /// Kind, when an income and an expense category share the name
        #[arg(short, long)]
        kind: Option<String>,

        /// New name
        #[arg(long)]
        rename: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete an unused category
    Delete {
        name: String,

        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record an income or expense
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Kind, when an income and an expense category share the name
        #[arg(short, long)]
        kind: Option<String>,

        /// Description
        #[arg(short, long)]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions, newest first
    List {
        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Filter by category name
        #[arg(short, long)]
        category: Option<String>,

        /// Filter by kind: income, expense
        #[arg(short, long)]
        kind: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Change a transaction
    Edit {
        /// Transaction ID
        id: String,

        #[arg(long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a monthly budget on an expense category
    Set {
        /// Category name
        category: String,

        /// Budget amount
        amount: String,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// List budgets of a month
    List {
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Change a budget's amount or month
    Edit {
        /// Budget ID
        id: String,

        #[arg(long)]
        amount: Option<String>,

        #[arg(short, long)]
        month: Option<String>,
    },

    /// Delete a budget
    Delete {
        /// Budget ID
        id: String,
    },

    /// Show spending against each budget of a month
    Status {
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        /// Goal title
        title: String,

        /// Target amount
        #[arg(long)]
        target: String,

        /// Amount already saved
        #[arg(long)]
        saved: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        by: String,
    },

    /// List savings goals with progress
    List {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Change a savings goal
    Edit {
        /// Goal ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        saved: Option<String>,

        #[arg(long)]
        by: Option<String>,
    },

    /// Delete a savings goal
    Delete {
        /// Goal ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TipCommands {
    /// Add a financial tip
    Add {
        /// Tip title
        title: String,

        /// Tip text
        #[arg(long)]
        content: String,

        /// Priority: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// List every tip, hidden ones included
    List {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show a hidden tip on dashboards again
    Enable {
        /// Tip ID
        id: String,
    },

    /// Hide a tip from dashboards
    Disable {
        /// Tip ID
        id: String,
    },

    /// Delete a tip
    Delete {
        /// Tip ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expenses and savings of one month
    Summary {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Month by month income and expenses
    Trend {
        /// Number of months (defaults to the settings value)
        #[arg(long)]
        months: Option<usize>,

        /// Last month of the series (YYYY-MM, defaults to the current month)
        #[arg(long)]
        end: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Totals per category over a date range
    Breakdown {
        /// Kind: income, expense
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Start date (YYYY-MM-DD, defaults to the first of the month)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Largest categories over the recent past
    Top {
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Financial health rating with a tip
    Health {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ChartCommands {
    /// Expenses by category for a pie chart
    Expenses {
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Budgeted vs spent per category
    Budgets {
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// A connected service acting for one user.
struct Session {
    service: FinanceService,
    owner: Owner,
    today: NaiveDate,
    settings: Settings,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let filter = if self.verbose {
            "budgetwise=debug"
        } else {
            settings.log_filter.as_str()
        };
        init_logging(filter);

        let database = self
            .database
            .clone()
            .unwrap_or_else(|| settings.database.clone());
        let username = self
            .user
            .clone()
            .unwrap_or_else(|| settings.default_user.clone());
        debug!(database = %database, user = %username, "starting");

        if let Commands::Init = self.command {
            let service = FinanceService::init(&database).await?;
            let owner = service.ensure_owner(&username).await?;
            let stats = service.owner_stats(owner.id).await?;
            println!("Database initialized: {}", database);
            println!(
                "User '{}' ready with {} categories",
                owner.username, stats.categories
            );
            return Ok(());
        }

        let service = FinanceService::connect(&database)
            .await
            .with_context(|| {
                format!("Cannot open '{}'. Run 'budgetwise init' first", database)
            })?
            .with_options(settings.report_options());
        let owner = service.ensure_owner(&username).await?;
        let session = Session {
            service,
            owner,
            today: Local::now().date_naive(),
            settings,
        };

        match self.command {
            Commands::Init => {}
            Commands::Profile(cmd) => run_profile_command(&session, cmd).await?,
            Commands::Category(cmd) => run_category_command(&session, cmd).await?,
            Commands::Tx(cmd) => run_tx_command(&session, cmd).await?,
            Commands::Budget(cmd) => run_budget_command(&session, cmd).await?,
            Commands::Goal(cmd) => run_goal_command(&session, cmd).await?,
            Commands::Tip(cmd) => run_tip_command(&session, cmd).await?,
            Commands::Dashboard { format } => run_dashboard_command(&session, &format).await?,
            Commands::Report(cmd) => run_report_command(&session, cmd).await?,
            Commands::Chart(cmd) => run_chart_command(&session, cmd).await?,
            Commands::Export {
                export_type,
                output,
                format,
                months,
                from,
                to,
                kind,
            } => {
                let format = ExportFormat::from_str(&format).ok_or_else(|| {
                    anyhow::anyhow!("Invalid export format '{}'. Valid: csv, json", format)
                })?;
                let request = ExportRequest {
                    months,
                    from,
                    to,
                    kind,
                };
                run_export_command(&session, &export_type, output.as_deref(), format, request)
                    .await?;
            }
        }

        Ok(())
    }
}

async fn run_profile_command(session: &Session, cmd: ProfileCommands) -> Result<()> {
    let service = &session.service;
    match cmd {
        ProfileCommands::Show => {
            let owner = &session.owner;
            let stats = service.owner_stats(owner.id).await?;

            println!("User: {}", owner.username);
            println!("  Monthly income: {}", format_cents(owner.monthly_income));
            println!("  Savings goal:   {}", format_cents(owner.savings_goal));
            println!(
                "  Member since:   {}",
                owner.created_at.format("%Y-%m-%d")
            );
            println!();
            println!("  Transactions:   {}", stats.transactions);
            println!("  Categories:     {}", stats.categories);
            println!("  Budgets:        {}", stats.budgets);
        }

        ProfileCommands::Set {
            income,
            savings_goal,
        } => {
            let update = ProfileUpdate {
                monthly_income: match income {
                    Some(amount) => parse_amount(&amount)?,
                    None => session.owner.monthly_income,
                },
                savings_goal: match savings_goal {
                    Some(amount) => parse_amount(&amount)?,
                    None => session.owner.savings_goal,
                },
            };
            let owner = service
                .update_profile(&session.owner.username, update)
                .await?;
            println!(
                "Updated profile: income {}, savings goal {}",
                format_cents(owner.monthly_income),
                format_cents(owner.savings_goal)
            );
        }
    }
    Ok(())
}

async fn run_category_command(session: &Session, cmd: CategoryCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        CategoryCommands::Add {
            name,
            kind,
            icon,
            color,
        } => {
            let input = NewCategory {
                name,
                kind: Some(parse_kind(&kind)?),
                icon,
                color,
            };
            let category = service.create_category(owner, input).await?;
            println!(
                "Created category: {} {} ({})",
                category.icon, category.name, category.kind
            );
        }

        CategoryCommands::List => {
            let categories = service.list_categories(owner).await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<4} {:<24} {:<8} {:<8}", "", "NAME", "KIND", "COLOR");
                println!("{}", "-".repeat(46));
                for category in categories {
                    println!(
                        "{:<4} {:<24} {:<8} {:<8}",
                        category.icon,
                        truncate(&category.name, 24),
                        category.kind,
                        category.color
                    );
                }
            }
        }

        CategoryCommands::Edit {
            name,
            kind,
            rename,
            icon,
            color,
        } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let update = CategoryUpdate {
                name: rename,
                icon,
                color,
            };
            let category = service.update_category(owner, &name, kind, update).await?;
            println!("Updated category: {} {}", category.icon, category.name);
        }

        CategoryCommands::Delete { name, kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let category = service.delete_category(owner, &name, kind).await?;
            println!("Deleted category: {}", category.name);
        }
    }
    Ok(())
}

async fn run_tx_command(session: &Session, cmd: TxCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        TxCommands::Add {
            amount,
            category,
            kind,
            description,
            date,
        } => {
            let input = NewTransaction {
                amount_cents: parse_amount(&amount)?,
                description,
                occurred_on: date
                    .as_deref()
                    .map(parse_date)
                    .transpose()?
                    .unwrap_or(session.today),
            };
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let tx = service
                .record_transaction(owner, &category, kind, input)
                .await?;
            println!(
                "Recorded {}: {} {} on {} ({})",
                tx.kind,
                format_cents(tx.amount_cents),
                category,
                tx.occurred_on,
                tx.id
            );
        }

        TxCommands::List {
            from,
            to,
            category,
            kind,
            limit,
        } => {
            let range = match (from, to) {
                (None, None) => None,
                (from, to) => Some(DateRange {
                    start: from.as_deref().map(parse_date).transpose()?,
                    end: to.as_deref().map(parse_date).transpose()?,
                }),
            };
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let category = match category {
                Some(name) => Some(service.find_category(owner, &name, kind).await?.id),
                None => None,
            };
            let filter = TransactionFilter {
                range,
                category,
                kind,
                limit,
            };

            let transactions = service.list_transactions(owner, &filter).await?;
            let names = category_names(session).await?;
            print_transactions(&transactions, &names);
        }

        TxCommands::Edit {
            id,
            amount,
            category,
            description,
            date,
        } => {
            let update = TransactionUpdate {
                category,
                amount_cents: amount.as_deref().map(parse_amount).transpose()?,
                description,
                occurred_on: date.as_deref().map(parse_date).transpose()?,
            };
            let tx = service
                .update_transaction(owner, parse_id(&id, "transaction")?, update)
                .await?;
            println!(
                "Updated transaction {}: {} on {}",
                tx.id,
                format_cents(tx.amount_cents),
                tx.occurred_on
            );
        }

        TxCommands::Delete { id } => {
            let tx = service
                .delete_transaction(owner, parse_id(&id, "transaction")?)
                .await?;
            println!(
                "Deleted transaction: {} {} ({})",
                format_cents(tx.amount_cents),
                tx.description,
                tx.occurred_on
            );
        }
    }
    Ok(())
}

async fn run_budget_command(session: &Session, cmd: BudgetCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            month,
        } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let input = NewBudget {
                amount_cents: parse_amount(&amount)?,
                month: period.month(),
                year: period.year(),
            };
            let budget = service.create_budget(owner, &category, input).await?;
            println!(
                "Set budget: {} {} for {} ({})",
                category,
                format_cents(budget.amount_cents),
                budget.period.label(),
                budget.id
            );
        }

        BudgetCommands::List { month } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let overview = service.budget_overview(owner, period).await?;
            if overview.statuses.is_empty() {
                println!("No budgets for {}.", period.label());
            } else {
                println!("{:<36} {:<20} {:>12}", "ID", "CATEGORY", "AMOUNT");
                println!("{}", "-".repeat(70));
                for status in &overview.statuses {
                    println!(
                        "{:<36} {:<20} {:>12}",
                        status.budget.id,
                        truncate(&status.category_name, 20),
                        format_cents(status.budget.amount_cents)
                    );
                }
            }
        }

        BudgetCommands::Edit { id, amount, month } => {
            let amount_cents = amount.as_deref().map(parse_amount).transpose()?;
            let period = month
                .as_deref()
                .map(|m| parse_month(Some(m), session.today))
                .transpose()?;
            let budget = service
                .update_budget(owner, parse_id(&id, "budget")?, amount_cents, period)
                .await?;
            println!(
                "Updated budget {}: {} for {}",
                budget.id,
                format_cents(budget.amount_cents),
                budget.period.label()
            );
        }

        BudgetCommands::Delete { id } => {
            let budget = service.delete_budget(owner, parse_id(&id, "budget")?).await?;
            println!(
                "Deleted budget of {} for {}",
                format_cents(budget.amount_cents),
                budget.period.label()
            );
        }

        BudgetCommands::Status { month, format } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let overview = service.budget_overview(owner, period).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&overview)?);
                }
                "csv" => {
                    println!("category,budgeted,spent,remaining,percentage,over_budget");
                    for status in &overview.statuses {
                        println!(
                            "{},{},{},{},{:.2},{}",
                            status.category_name,
                            status.usage.budgeted,
                            status.usage.spent,
                            status.usage.remaining,
                            status.usage.percentage_used,
                            status.usage.is_over
                        );
                    }
                }
                _ => {
                    println!("Budget Status: {}", period.label());
                    println!();
                    if overview.statuses.is_empty() {
                        println!("No budgets set for this month.");
                        return Ok(());
                    }
                    println!(
                        "{:<22} {:>12} {:>12} {:>12} {:>8}",
                        "CATEGORY", "BUDGET", "SPENT", "REMAINING", "USED"
                    );
                    println!("{}", "-".repeat(70));
                    for status in &overview.statuses {
                        let flag = if status.usage.is_over { " OVER" } else { "" };
                        println!(
                            "{:<22} {:>12} {:>12} {:>12} {:>7.1}%{}",
                            truncate(
                                &format!("{} {}", status.category_icon, status.category_name),
                                22
                            ),
                            format_cents(status.usage.budgeted),
                            format_cents(status.usage.spent),
                            format_cents(status.usage.remaining),
                            status.usage.percentage_used,
                            flag
                        );
                    }
                    println!("{}", "-".repeat(70));
                    println!(
                        "{:<22} {:>12} {:>12} {:>12}",
                        "TOTAL",
                        format_cents(overview.total_budgeted),
                        format_cents(overview.total_spent),
                        format_cents(overview.total_remaining)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_goal_command(session: &Session, cmd: GoalCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        GoalCommands::Add {
            title,
            target,
            saved,
            by,
        } => {
            let input = NewSavingsGoal {
                title,
                target_amount: parse_amount(&target)?,
                current_amount: saved.as_deref().map(parse_amount).transpose()?.unwrap_or(0),
                target_date: parse_date(&by)?,
            };
            let goal = service.create_goal(owner, input).await?;
            println!(
                "Created goal: {} ({} by {}) ({})",
                goal.title,
                format_cents(goal.target_amount),
                goal.target_date,
                goal.id
            );
        }

        GoalCommands::List { format } => {
            let progress = service.goal_progress(owner, session.today).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&progress)?);
                return Ok(());
            }
            if progress.is_empty() {
                println!("No savings goals.");
                return Ok(());
            }
            println!(
                "{:<36} {:<20} {:>12} {:>12} {:>7} {:>6}",
                "ID", "TITLE", "SAVED", "TARGET", "DONE", "DAYS"
            );
            println!("{}", "-".repeat(98));
            for item in &progress {
                println!(
                    "{:<36} {:<20} {:>12} {:>12} {:>6.1}% {:>6}",
                    item.goal.id,
                    truncate(&item.goal.title, 20),
                    format_cents(item.goal.current_amount),
                    format_cents(item.goal.target_amount),
                    item.progress_pct,
                    item.days_remaining
                );
            }
        }

        GoalCommands::Edit {
            id,
            title,
            target,
            saved,
            by,
        } => {
            let update = GoalUpdate {
                title,
                target_amount: target.as_deref().map(parse_amount).transpose()?,
                current_amount: saved.as_deref().map(parse_amount).transpose()?,
                target_date: by.as_deref().map(parse_date).transpose()?,
            };
            let goal = service
                .update_goal(owner, parse_id(&id, "goal")?, update)
                .await?;
            println!(
                "Updated goal: {} ({} of {})",
                goal.title,
                format_cents(goal.current_amount),
                format_cents(goal.target_amount)
            );
        }

        GoalCommands::Delete { id } => {
            let goal = service.delete_goal(owner, parse_id(&id, "goal")?).await?;
            println!("Deleted goal: {}", goal.title);
        }
    }
    Ok(())
}

async fn run_tip_command(session: &Session, cmd: TipCommands) -> Result<()> {
    let service = &session.service;

    match cmd {
        TipCommands::Add {
            title,
            content,
            priority,
        } => {
            let input = NewFinancialTip {
                title,
                content,
                priority: Some(parse_priority(&priority)?),
            };
            let tip = service.add_tip(input).await?;
            println!("Added tip: {} [{}] ({})", tip.title, tip.priority, tip.id);
        }

        TipCommands::List { format } => {
            let tips = service.list_tips().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&tips)?);
                return Ok(());
            }
            if tips.is_empty() {
                println!("No financial tips.");
                return Ok(());
            }
            println!("{:<36} {:<8} {:<7} {:<30}", "ID", "PRIORITY", "ACTIVE", "TITLE");
            println!("{}", "-".repeat(84));
            for tip in &tips {
                println!(
                    "{:<36} {:<8} {:<7} {:<30}",
                    tip.id,
                    tip.priority,
                    if tip.is_active { "yes" } else { "no" },
                    truncate(&tip.title, 30)
                );
            }
        }

        TipCommands::Enable { id } => {
            let tip = service.set_tip_active(parse_id(&id, "tip")?, true).await?;
            println!("Enabled tip: {}", tip.title);
        }

        TipCommands::Disable { id } => {
            let tip = service.set_tip_active(parse_id(&id, "tip")?, false).await?;
            println!("Disabled tip: {}", tip.title);
        }

        TipCommands::Delete { id } => {
            let tip = service.delete_tip(parse_id(&id, "tip")?).await?;
            println!("Deleted tip: {}", tip.title);
        }
    }
    Ok(())
}

async fn run_dashboard_command(session: &Session, format: &str) -> Result<()> {
    let dashboard = session
        .service
        .dashboard(session.owner.id, session.today)
        .await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let summary = &dashboard.summary.summary;
    println!(
        "Dashboard for {} ({})",
        session.owner.username,
        dashboard.period.label()
    );
    println!("Showing {}", dashboard.summary.source.describe());
    println!();
    println!("Income:         {:>15}", format_cents(summary.income_total));
    println!("Expenses:       {:>15}", format_cents(summary.expense_total));
    println!("{}", "-".repeat(32));
    println!("Savings:        {:>15}", format_cents(summary.savings));
    println!("Savings rate:   {:>14.1}%", summary.savings_rate);
    println!("Expense ratio:  {:>14.1}%", dashboard.expense_ratio);
    println!();
    println!(
        "Health: {} - {}",
        dashboard.health.status, dashboard.health.message
    );
    println!("  Tip: {}", dashboard.health.tip);

    if !dashboard.budget_alerts.is_empty() {
        println!();
        println!("Budget alerts:");
        for alert in &dashboard.budget_alerts {
            if alert.is_over {
                println!(
                    "  ! {} is over budget by {}",
                    alert.category,
                    format_cents(alert.over_amount)
                );
            } else {
                println!("  ! {} at {:.1}%", alert.category, alert.percentage);
            }
        }
    }

    if !dashboard.budgets.is_empty() {
        println!();
        println!("Budgets:");
        for status in &dashboard.budgets {
            println!(
                "  {:<20} {:>12} of {:>12} ({:.1}%)",
                truncate(&status.category_name, 20),
                format_cents(status.usage.spent),
                format_cents(status.usage.budgeted),
                status.usage.percentage_used
            );
        }
    }

    if !dashboard.goals.is_empty() {
        println!();
        println!("Savings goals:");
        for item in &dashboard.goals {
            let state = if item.is_completed {
                "completed".to_string()
            } else {
                format!("{} days left", item.days_remaining)
            };
            println!(
                "  {:<20} {:>6.1}% ({})",
                truncate(&item.goal.title, 20),
                item.progress_pct,
                state
            );
        }
    }

    if !dashboard.financial_tips.is_empty() {
        println!();
        println!("Tips:");
        for tip in &dashboard.financial_tips {
            println!("  * {}: {}", tip.title, tip.content);
        }
    }

    println!();
    println!(
        "Recent transactions ({} total):",
        dashboard.transaction_count
    );
    let names = category_names(session).await?;
    print_transactions(&dashboard.recent_transactions, &names);
    Ok(())
}

async fn run_report_command(session: &Session, cmd: ReportCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        ReportCommands::Summary { month, format } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let summary = service.monthly_summary(owner, period).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                "csv" => {
                    println!("type,amount");
                    println!("income,{}", summary.income_total);
                    println!("expense,{}", summary.expense_total);
                    println!("savings,{}", summary.savings);
                }
                _ => {
                    println!("Monthly Summary: {}", period.label());
                    println!();
                    println!("Total Income:   {:>15}", format_cents(summary.income_total));
                    println!("Total Expense:  {:>15}", format_cents(summary.expense_total));
                    println!("{}", "-".repeat(32));
                    println!("Savings:        {:>15}", format_cents(summary.savings));
                    println!("Savings rate:   {:>14.1}%", summary.savings_rate);
                }
            }
        }

        ReportCommands::Trend {
            months,
            end,
            format,
        } => {
            let months = months.unwrap_or(session.settings.trend_months);
            let end = parse_month(end.as_deref(), session.today)?;
            let points = service.trend(owner, months, end).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&points)?);
                }
                "csv" => {
                    println!("month,income,expense,savings");
                    for point in &points {
                        println!(
                            "{},{},{},{}",
                            point.period, point.income_total, point.expense_total, point.savings
                        );
                    }
                }
                _ => {
                    println!("Income and Expense Trend ({} months)", months);
                    println!();
                    println!(
                        "{:<10} {:>12} {:>12} {:>12}",
                        "MONTH", "INCOME", "EXPENSE", "SAVINGS"
                    );
                    println!("{}", "-".repeat(49));
                    for point in &points {
                        println!(
                            "{:<10} {:>12} {:>12} {:>12}",
                            point.label,
                            format_cents(point.income_total),
                            format_cents(point.expense_total),
                            format_cents(point.savings)
                        );
                    }
                }
            }
        }

        ReportCommands::Breakdown {
            kind,
            from,
            to,
            format,
        } => {
            let kind = parse_kind(&kind)?;
            let start = match from {
                Some(date) => parse_date(&date)?,
                None => MonthYear::of(session.today).first_day(),
            };
            let end = match to {
                Some(date) => parse_date(&date)?,
                None => session.today,
            };
            let totals = service.category_breakdown(owner, kind, start, end).await?;
            let title = format!("{} by category, {} to {}", kind, start, end);
            print_category_totals(&title, &totals, &format)?;
        }

        ReportCommands::Top { kind, format } => {
            let kind = parse_kind(&kind)?;
            let totals = service.top_categories(owner, kind, session.today).await?;
            let title = format!(
                "Top {} categories, last {} days",
                kind, session.settings.top_categories_days
            );
            print_category_totals(&title, &totals, &format)?;
        }

        ReportCommands::Health { format } => {
            let (summary, health) = service.health(owner, session.today).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&health)?);
                return Ok(());
            }
            println!("Financial health: {}", health.status);
            println!("  {}", health.message);
            println!("  Tip: {}", health.tip);
            println!();
            println!("  Savings rate: {:.1}%", summary.savings_rate);
        }
    }
    Ok(())
}

async fn run_chart_command(session: &Session, cmd: ChartCommands) -> Result<()> {
    let service = &session.service;
    let owner = session.owner.id;

    match cmd {
        ChartCommands::Expenses { month } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let chart = service.expense_chart(owner, period).await?;
            println!("{}", serde_json::to_string_pretty(&chart)?);
        }
        ChartCommands::Budgets { month } => {
            let period = parse_month(month.as_deref(), session.today)?;
            let progress = service.budget_progress(owner, period).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
    }
    Ok(())
}

struct ExportRequest {
    months: Option<usize>,
    from: Option<String>,
    to: Option<String>,
    kind: String,
}

async fn run_export_command(
    session: &Session,
    export_type: &str,
    output: Option<&str>,
    format: ExportFormat,
    request: ExportRequest,
) -> Result<()> {
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(&session.service, session.owner.id);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let to = request.to.as_deref().map(parse_date).transpose()?;
    let (count, what) = match export_type {
        "trend" => {
            let months = request.months.unwrap_or(session.settings.trend_months);
            let end = MonthYear::of(to.unwrap_or(session.today));
            let count = exporter.export_trend(writer, months, end, format).await?;
            (count, "months")
        }
        "breakdown" => {
            let kind = parse_kind(&request.kind)?;
            let start = match request.from.as_deref() {
                Some(date) => parse_date(date)?,
                None => MonthYear::of(session.today).first_day(),
            };
            let end = to.unwrap_or(session.today);
            let count = exporter
                .export_breakdown(writer, kind, start, end, format)
                .await?;
            (count, "categories")
        }
        "transactions" => {
            let start = request.from.as_deref().map(parse_date).transpose()?;
            let filter = TransactionFilter {
                range: (start.is_some() || to.is_some()).then_some(DateRange { start, end: to }),
                ..Default::default()
            };
            let count = exporter.export_transactions(writer, &filter, format).await?;
            (count, "transactions")
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: trend, breakdown, transactions",
                export_type
            );
        }
    };

    if output.is_some() {
        eprintln!("Exported {} {} as {}", count, what, format.as_str());
    }
    Ok(())
}

fn print_category_totals(
    title: &str,
    totals: &[CategoryTotal],
    format: &str,
) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(totals)?);
        }
        "csv" => {
            println!("category,total");
            for total in totals {
                println!("{},{}", total.name, total.total);
            }
        }
        _ => {
            println!("{}", title);
            println!();
            if totals.is_empty() {
                println!("No transactions in this period.");
                return Ok(());
            }
            let sum: Cents = totals.iter().map(|t| t.total).sum();
            println!("{:<24} {:>12} {:>8}", "CATEGORY", "TOTAL", "SHARE");
            println!("{}", "-".repeat(46));
            for total in totals {
                println!(
                    "{:<24} {:>12} {:>7.1}%",
                    truncate(&format!("{} {}", total.icon, total.name), 24),
                    format_cents(total.total),
                    percent_of(total.total, sum)
                );
            }
            println!("{}", "-".repeat(46));
            println!("{:<24} {:>12}", "TOTAL", format_cents(sum));
        }
    }
    Ok(())
}

fn print_transactions(transactions: &[Transaction], names: &HashMap<CategoryId, String>) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<36} {:<10} {:<18} {:<24} {:>12}",
        "ID", "DATE", "CATEGORY", "DESCRIPTION", "AMOUNT"
    );
    println!("{}", "-".repeat(104));
    for tx in transactions {
        let category = names.get(&tx.category).map(String::as_str).unwrap_or("?");
        println!(
            "{:<36} {:<10} {:<18} {:<24} {:>12}",
            tx.id,
            tx.occurred_on,
            truncate(category, 18),
            truncate(&tx.description, 24),
            format_cents(tx.signed_amount())
        );
    }
}

async fn category_names(session: &Session) -> Result<HashMap<CategoryId, String>> {
    Ok(session
        .service
        .list_categories(session.owner.id)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", input))
}

fn parse_month(input: Option<&str>, today: NaiveDate) -> Result<MonthYear> {
    match input {
        Some(month) => month
            .parse()
            .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month)),
        None => Ok(MonthYear::of(today)),
    }
}

fn parse_kind(input: &str) -> Result<Kind> {
    Kind::from_str(input)
        .ok_or_else(|| anyhow::anyhow!("Invalid kind '{}'. Valid: income, expense", input))
}

fn parse_priority(input: &str) -> Result<TipPriority> {
    TipPriority::from_str(input).ok_or_else(|| {
        anyhow::anyhow!("Invalid priority '{}'. Valid: low, medium, high", input)
    })
}

fn parse_id(input: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(input).with_context(|| format!("Invalid {} ID format (expected UUID)", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Entertainment and leisure", 10), "Enterta...");
        assert_eq!(truncate("Café Café Café", 8), "Café ...");
    }

    #[test]
    fn test_parse_month_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            parse_month(None, today).unwrap(),
            MonthYear::new(3, 2024).unwrap()
        );
        assert_eq!(
            parse_month(Some("2023-11"), today).unwrap(),
            MonthYear::new(11, 2023).unwrap()
        );
        assert!(parse_month(Some("2023-13"), today).is_err());
    }

    #[test]
    fn test_cli_parses_env_style_overrides() {
        let cli = Cli::try_parse_from([
            "budgetwise",
            "--database",
            "/tmp/x.db",
            "--user",
            "ana",
            "report",
            "trend",
            "--months",
            "12",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("/tmp/x.db"));
        assert_eq!(cli.user.as_deref(), Some("ana"));
        assert!(matches!(
            cli.command,
            Commands::Report(ReportCommands::Trend {
                months: Some(12),
                ..
            })
        ));
    }
}

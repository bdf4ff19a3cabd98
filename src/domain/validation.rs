// Input validation for data entry.
//
// Raw input structs (as a form or the CLI would fill them) are checked here
// and turned into their `Valid*` counterparts before anything is written to
// the store.

use chrono::NaiveDate;
use thiserror::Error;

use super::{Cents, Kind, MonthYear, TipPriority, DEFAULT_COLOR, DEFAULT_ICON};

pub const MAX_CATEGORY_NAME: usize = 100;
pub const MAX_ICON: usize = 50;
pub const MAX_DESCRIPTION: usize = 200;
pub const MAX_GOAL_TITLE: usize = 200;
pub const MAX_TIP_TITLE: usize = 200;
pub const MIN_BUDGET_YEAR: i32 = 2020;
pub const MAX_BUDGET_YEAR: i32 = 2030;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} cents, got {value}")]
    AmountTooSmall {
        field: &'static str,
        min: Cents,
        value: Cents,
    },

    #[error("color must be a hex value like #1abc9c, got '{0}'")]
    InvalidColor(String),

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("year must be between 2020 and 2030, got {0}")]
    YearOutOfRange(i32),

    #[error("at most {max} months can be shown, got {value}")]
    TooManyMonths { max: usize, value: usize },

    #[error("a window of {0} days is out of range")]
    WindowOutOfRange(i64),

    #[error("year {0} is outside the supported calendar")]
    UnsupportedYear(i32),
}

fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

fn require_min(field: &'static str, value: Cents, min: Cents) -> Result<Cents, ValidationError> {
    if value < min {
        return Err(ValidationError::AmountTooSmall { field, min, value });
    }
    Ok(value)
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub kind: Option<Kind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCategory {
    pub name: String,
    pub kind: Kind,
    pub icon: String,
    pub color: String,
}

impl NewCategory {
    pub fn validate(&self) -> Result<ValidCategory, ValidationError> {
        let name = require_text("name", &self.name, MAX_CATEGORY_NAME)?;
        let kind = self.kind.ok_or(ValidationError::Empty { field: "kind" })?;

        let icon = match self.icon.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_ICON.to_string(),
            Some(icon) => require_text("icon", icon, MAX_ICON)?,
        };
        let color = match self.color.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_COLOR.to_string(),
            Some(color) if is_hex_color(color) => color.to_lowercase(),
            Some(color) => return Err(ValidationError::InvalidColor(color.to_string())),
        };

        Ok(ValidCategory {
            name,
            kind,
            icon,
            color,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount_cents: Cents,
    pub description: String,
    pub occurred_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTransaction {
    pub amount_cents: Cents,
    pub description: String,
    pub occurred_on: NaiveDate,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<ValidTransaction, ValidationError> {
        Ok(ValidTransaction {
            amount_cents: require_min("amount", self.amount_cents, 1)?,
            description: require_text("description", &self.description, MAX_DESCRIPTION)?,
            occurred_on: self.occurred_on,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub amount_cents: Cents,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBudget {
    pub amount_cents: Cents,
    pub period: MonthYear,
}

impl NewBudget {
    pub fn validate(&self) -> Result<ValidBudget, ValidationError> {
        let amount_cents = require_min("amount", self.amount_cents, 0)?;
        if !(MIN_BUDGET_YEAR..=MAX_BUDGET_YEAR).contains(&self.year) {
            return Err(ValidationError::YearOutOfRange(self.year));
        }
        let period = MonthYear::new(self.month, self.year)
            .map_err(|_| ValidationError::InvalidMonth(self.month))?;
        Ok(ValidBudget {
            amount_cents,
            period,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub title: String,
    pub target_amount: Cents,
    pub current_amount: Cents,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSavingsGoal {
    pub title: String,
    pub target_amount: Cents,
    pub current_amount: Cents,
    pub target_date: NaiveDate,
}

impl NewSavingsGoal {
    pub fn validate(&self) -> Result<ValidSavingsGoal, ValidationError> {
        Ok(ValidSavingsGoal {
            title: require_text("title", &self.title, MAX_GOAL_TITLE)?,
            target_amount: require_min("target amount", self.target_amount, 1)?,
            current_amount: require_min("current amount", self.current_amount, 0)?,
            target_date: self.target_date,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewFinancialTip {
    pub title: String,
    pub content: String,
    pub priority: Option<TipPriority>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFinancialTip {
    pub title: String,
    pub content: String,
    pub priority: TipPriority,
}

impl NewFinancialTip {
    pub fn validate(&self) -> Result<ValidFinancialTip, ValidationError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        Ok(ValidFinancialTip {
            title: require_text("title", &self.title, MAX_TIP_TITLE)?,
            content: content.to_string(),
            priority: self.priority.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileUpdate {
    pub monthly_income: Cents,
    pub savings_goal: Cents,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<Self, ValidationError> {
        require_min("monthly income", self.monthly_income, 0)?;
        require_min("savings goal", self.savings_goal, 0)?;
        Ok(*self)
    }
}

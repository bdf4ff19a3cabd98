use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OwnerId;

pub type CategoryId = Uuid;

pub const DEFAULT_ICON: &str = "💰";
pub const DEFAULT_COLOR: &str = "#007bff";

/// Income or expense. Shared by categories and the transactions filed under them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Kind::Income),
            "expense" => Some(Kind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined bucket for transactions. `(owner, name, kind)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner: OwnerId,
    pub name: String,
    pub kind: Kind,
    /// Emoji shown next to the name
    pub icon: String,
    /// Hex color (`#RRGGBB`) used by charts
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(owner: OwnerId, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            kind,
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Categories every new owner starts with: (name, kind, icon, color).
pub const DEFAULT_CATEGORIES: &[(&str, Kind, &str, &str)] = &[
    ("Food & Dining", Kind::Expense, "🍽️", "#e74c3c"),
    ("Transportation", Kind::Expense, "🚗", "#f39c12"),
    ("Shopping", Kind::Expense, "🛍️", "#9b59b6"),
    ("Entertainment", Kind::Expense, "🎬", "#3498db"),
    ("Bills & Utilities", Kind::Expense, "💡", "#e67e22"),
    ("Healthcare", Kind::Expense, "🏥", "#1abc9c"),
    ("Education", Kind::Expense, "📚", "#34495e"),
    ("Salary", Kind::Income, "💼", "#27ae60"),
    ("Freelance", Kind::Income, "💻", "#2ecc71"),
    ("Investment", Kind::Income, "📈", "#16a085"),
];

/// Build the default category set for `owner`.
pub fn default_categories(owner: OwnerId) -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, kind, icon, color)| {
            Category::new(owner, *name, *kind)
                .with_icon(*icon)
                .with_color(*color)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [Kind::Income, Kind::Expense] {
            assert_eq!(Kind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(Kind::from_str("EXPENSE"), Some(Kind::Expense));
        assert_eq!(Kind::from_str("transfer"), None);
    }

    #[test]
    fn test_default_categories() {
        let owner = Uuid::new_v4();
        let categories = default_categories(owner);
        assert_eq!(categories.len(), 10);
        assert_eq!(
            categories.iter().filter(|c| c.kind == Kind::Income).count(),
            3
        );
        assert!(categories.iter().all(|c| c.owner == owner));
        assert!(categories.iter().all(|c| c.color.starts_with('#')));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TipId = Uuid;

/// How prominently a tip is shown. Ordered low to high.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TipPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TipPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipPriority::Low => "low",
            TipPriority::Medium => "medium",
            TipPriority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(TipPriority::Low),
            "medium" => Some(TipPriority::Medium),
            "high" => Some(TipPriority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for TipPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of general advice shown on every user's dashboard while active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTip {
    pub id: TipId,
    pub title: String,
    pub content: String,
    pub priority: TipPriority,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl FinancialTip {
    pub fn new(title: impl Into<String>, content: impl Into<String>, priority: TipPriority) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            priority,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

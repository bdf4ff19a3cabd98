use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type OwnerId = Uuid;

/// The user whose data is tracked, with the profile figures they set for
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub username: String,
    /// Expected monthly income, as entered by the user
    pub monthly_income: Cents,
    /// Amount the user wants to put aside each month
    pub savings_goal: Cents,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            monthly_income: 0,
            savings_goal: 0,
            created_at: Utc::now(),
        }
    }
}

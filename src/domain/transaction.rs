use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, CategoryId, Cents, Kind, OwnerId};

pub type TransactionId = Uuid;

/// A single income or expense entry.
///
/// `kind` always mirrors the kind of `category`; [`Transaction::new`] copies it
/// from the category so the two can't disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: OwnerId,
    pub category: CategoryId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub kind: Kind,
    pub description: String,
    /// The day the money moved
    pub occurred_on: NaiveDate,
    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        category: &Category,
        amount_cents: Cents,
        description: impl Into<String>,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: category.owner,
            category: category.id,
            amount_cents,
            kind: category.kind,
            description: description.into(),
            occurred_on,
            created_at: Utc::now(),
        }
    }

    /// Move the transaction to another category, taking over its kind.
    pub fn recategorize(&mut self, category: &Category) {
        self.category = category.id;
        self.kind = category.kind;
    }

    /// Signed contribution to savings: income counts positive, expense negative.
    pub fn signed_amount(&self) -> Cents {
        match self.kind {
            Kind::Income => self.amount_cents,
            Kind::Expense => -self.amount_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_kind_follows_category() {
        let owner = Uuid::new_v4();
        let salary = Category::new(owner, "Salary", Kind::Income);
        let rent = Category::new(owner, "Rent", Kind::Expense);

        let mut tx = Transaction::new(&salary, 500000, "March salary", day(1));
        assert_eq!(tx.kind, Kind::Income);
        assert_eq!(tx.owner, owner);
        assert_eq!(tx.signed_amount(), 500000);

        tx.recategorize(&rent);
        assert_eq!(tx.kind, Kind::Expense);
        assert_eq!(tx.category, rent.id);
        assert_eq!(tx.signed_amount(), -500000);
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{CategoryId, Cents, DateRange, Kind, OwnerId, Transaction};

/// Filter for a summed amount. Every `None` field matches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountQuery {
    pub owner: OwnerId,
    pub kind: Option<Kind>,
    pub category: Option<CategoryId>,
    pub range: Option<DateRange>,
}

impl AmountQuery {
    pub fn owner(owner: OwnerId) -> Self {
        Self {
            owner,
            kind: None,
            category: None,
            range: None,
        }
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        transaction.owner == self.owner
            && self.kind.is_none_or(|kind| transaction.kind == kind)
            && self
                .category
                .is_none_or(|category| transaction.category == category)
            && self
                .range
                .is_none_or(|range| range.contains(transaction.occurred_on))
    }
}

/// Filter for per-category totals of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotalsQuery {
    pub owner: OwnerId,
    pub kind: Kind,
    pub range: DateRange,
}

impl CategoryTotalsQuery {
    fn as_amount_query(&self) -> AmountQuery {
        AmountQuery::owner(self.owner)
            .kind(self.kind)
            .range(self.range)
    }
}

/// Sum the amounts of all transactions matching `query`. 0 when nothing matches.
pub fn sum_amounts(query: &AmountQuery, transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .filter(|t| query.matches(t))
        .map(|t| t.amount_cents)
        .sum()
}

/// Sum matching transactions per category. Categories without matches are absent.
pub fn category_totals(
    query: &CategoryTotalsQuery,
    transactions: &[Transaction],
) -> HashMap<CategoryId, Cents> {
    let filter = query.as_amount_query();
    let mut totals: HashMap<CategoryId, Cents> = HashMap::new();

    for transaction in transactions.iter().filter(|t| filter.matches(t)) {
        *totals.entry(transaction.category).or_insert(0) += transaction.amount_cents;
    }

    totals
}

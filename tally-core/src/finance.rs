//! Finance record types for budgeting: transactions and spending categories

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single expense as produced by an input adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Free-text description ("Monthly rent", "Pizza night")
    pub description: String,
    /// Positive = money spent. Negative values are kept and reduce totals.
    pub amount: f64,
}

impl Transaction {
    /// Create a new Transaction
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Spending categories matched deterministically from descriptions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Rent,
    Groceries,
    Transport,
    Dining,
    Entertainment,
    Utilities,
    Shopping,
    Health,
    Other,
}

/// Ordered keyword table. The first category with a matching keyword wins,
/// so the order here is observable behavior.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Rent, &["rent", "apartment", "lease"]),
    (Category::Groceries, &["grocery", "supermarket", "store"]),
    (
        Category::Transport,
        &["uber", "ola", "taxi", "bus", "train", "fuel"],
    ),
    (Category::Dining, &["restaurant", "cafe", "pizza", "burger"]),
    (Category::Entertainment, &["netflix", "spotify", "movie"]),
    (
        Category::Utilities,
        &["electricity", "water", "internet", "phone"],
    ),
    (Category::Shopping, &["amazon", "mall", "shop"]),
    (Category::Health, &["pharmacy", "hospital", "doctor"]),
];

impl Category {
    /// All categories in table order, `Other` last
    pub fn all() -> &'static [Category] {
        &[
            Category::Rent,
            Category::Groceries,
            Category::Transport,
            Category::Dining,
            Category::Entertainment,
            Category::Utilities,
            Category::Shopping,
            Category::Health,
            Category::Other,
        ]
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Rent => "Rent",
            Category::Groceries => "Groceries",
            Category::Transport => "Transport",
            Category::Dining => "Dining",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }

    /// Keywords that select this category (empty for `Other`)
    pub fn keywords(&self) -> &'static [&'static str] {
        CATEGORY_KEYWORDS
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, kws)| *kws)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

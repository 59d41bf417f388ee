//! Deterministic category rules mapping transaction descriptions to
//! Tally's fixed spending categories.
//!
//! Lowercase substring match over the ordered keyword table; the first
//! category with a hit wins and anything else is `Other`.

use tally_core::{CATEGORY_KEYWORDS, Category, Transaction};

/// A transaction paired with its assigned category
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CategorizedTransaction {
    pub description: String,
    pub amount: f64,
    pub category: Category,
}

impl CategorizedTransaction {
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            description: txn.description.clone(),
            amount: txn.amount,
            category: categorize(&txn.description),
        }
    }
}

/// Categorize a free-text description.
pub fn categorize(description: &str) -> Category {
    let desc = description.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

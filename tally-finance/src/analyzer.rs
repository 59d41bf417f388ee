//! Budget analyzer: categorizes transactions, aggregates per-category
//! subtotals and derives savings from an optional income figure.

use serde::Serialize;
use std::collections::HashMap;
use tally_core::{Category, Transaction};

use crate::category_rules::CategorizedTransaction;
use crate::summary::format_summary;

/// Spend total for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

/// Result of analyzing one transaction list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAnalysis {
    pub total_expense: f64,
    /// Descending by amount; categories without transactions are omitted
    pub by_category: Vec<CategoryTotal>,
    pub savings: Option<f64>,
    pub savings_rate: Option<f64>,
    /// Every input record with its category, in input order
    pub categorized: Vec<CategorizedTransaction>,
}

impl BudgetAnalysis {
    /// The `n` largest category subtotals
    pub fn top_categories(&self, n: usize) -> &[CategoryTotal] {
        &self.by_category[..n.min(self.by_category.len())]
    }

    /// Subtotal for a category, if it had any transactions
    pub fn category_total(&self, category: Category) -> Option<f64> {
        self.by_category
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.amount)
    }

    /// Render the text report with the top `top_n` categories.
    pub fn summary(&self, income: Option<f64>, top_n: usize) -> String {
        format_summary(
            income,
            self.total_expense,
            self.savings,
            self.savings_rate,
            self.top_categories(top_n),
        )
    }
}

/// Analyze a transaction list against an optional income.
pub fn analyze(records: &[Transaction], income: Option<f64>) -> BudgetAnalysis {
    let categorized: Vec<CategorizedTransaction> = records
        .iter()
        .map(CategorizedTransaction::from_transaction)
        .collect();

    let mut groups: HashMap<Category, f64> = HashMap::new();
    for txn in &categorized {
        *groups.entry(txn.category).or_insert(0.0) += txn.amount;
    }

    let mut by_category: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();

    // Descending by amount, ties in keyword-table order
    by_category.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    // Summed from the subtotals so they add back to the total exactly.
    let total_expense: f64 = by_category.iter().map(|c| c.amount).sum();

    let (savings, savings_rate) = match income {
        Some(income) => {
            let savings = income - total_expense;
            let rate = if income > 0.0 { savings / income } else { 0.0 };
            (Some(savings), Some(rate))
        }
        None => (None, None),
    };

    BudgetAnalysis {
        total_expense,
        by_category,
        savings,
        savings_rate,
        categorized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txns(items: &[(&str, f64)]) -> Vec<Transaction> {
        items.iter().map(|(d, a)| Transaction::new(*d, *a)).collect()
    }

    #[test]
    fn test_empty_with_income() {
        let a = analyze(&[], Some(1000.0));
        assert_eq!(a.total_expense, 0.0);
        assert!(a.by_category.is_empty());
        assert_eq!(a.savings, Some(1000.0));
        assert_eq!(a.savings_rate, Some(1.0));
    }

    #[test]
    fn test_rent_and_pizza() {
        let a = analyze(&txns(&[("rent", 1000.0), ("pizza", 50.0)]), Some(2000.0));
        assert_eq!(a.total_expense, 1050.0);
        assert_eq!(
            a.by_category,
            vec![
                CategoryTotal { category: Category::Rent, amount: 1000.0 },
                CategoryTotal { category: Category::Dining, amount: 50.0 },
            ]
        );
        assert_eq!(a.savings, Some(950.0));
        assert_eq!(a.savings_rate, Some(0.475));
    }

    #[test]
    fn test_no_income_means_no_savings() {
        let a = analyze(&txns(&[("rent", 1000.0), ("uber", 20.0)]), None);
        assert_eq!(a.savings, None);
        assert_eq!(a.savings_rate, None);

        let empty = analyze(&[], None);
        assert_eq!(empty.savings, None);
        assert_eq!(empty.savings_rate, None);
    }

    #[test]
    fn test_zero_income_rate_is_zero() {
        let a = analyze(&txns(&[("pizza", 30.0)]), Some(0.0));
        assert_eq!(a.savings, Some(-30.0));
        assert_eq!(a.savings_rate, Some(0.0));
    }

    #[test]
    fn test_subtotals_sum_to_total() {
        let records = txns(&[
            ("Grocery store", 0.1),
            ("Uber ride", 0.2),
            ("Cafe latte", 0.3),
            ("Water bill", 19.99),
            ("Amazon", 7.77),
            ("mystery", 3.33),
            ("Grocery again", 1e-3),
            ("Refund from mall", -12.5),
            ("Movie", 0.7),
        ]);
        let a = analyze(&records, Some(100.0));
        let sum: f64 = a.by_category.iter().map(|c| c.amount).sum();
        assert_eq!(sum, a.total_expense);
        assert_eq!(a.categorized.len(), records.len());
    }

    #[test]
    fn test_grouping_and_descending_order() {
        let a = analyze(
            &txns(&[
                ("Pizza", 20.0),
                ("Burger", 25.0),
                ("Netflix", 15.0),
                ("Rent", 800.0),
                ("Lottery", 60.0),
            ]),
            None,
        );
        let order: Vec<Category> = a.by_category.iter().map(|c| c.category).collect();
        assert_eq!(
            order,
            vec![Category::Rent, Category::Other, Category::Dining, Category::Entertainment]
        );
        assert_eq!(a.category_total(Category::Dining), Some(45.0));
        assert_eq!(a.category_total(Category::Health), None);
    }

    #[test]
    fn test_ties_follow_table_order() {
        let a = analyze(&txns(&[("doctor", 10.0), ("taxi", 10.0), ("bingo", 10.0)]), None);
        let order: Vec<Category> = a.by_category.iter().map(|c| c.category).collect();
        assert_eq!(order, vec![Category::Transport, Category::Health, Category::Other]);
    }

    #[test]
    fn test_negative_amounts_reduce_total() {
        let a = analyze(&txns(&[("Amazon order", 100.0), ("Amazon refund", -40.0)]), Some(500.0));
        assert_eq!(a.total_expense, 60.0);
        assert_eq!(a.savings, Some(440.0));
    }

    #[test]
    fn test_top_categories_clamps() {
        let a = analyze(&txns(&[("rent", 1.0), ("pizza", 2.0)]), None);
        assert_eq!(a.top_categories(5).len(), 2);
        assert_eq!(a.top_categories(1)[0].category, Category::Dining);
        assert!(a.top_categories(0).is_empty());
    }
}

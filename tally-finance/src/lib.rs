//! tally-finance: category rules, budget analyzer and summary formatter

pub mod analyzer;
pub mod category_rules;
pub mod summary;

pub use analyzer::{BudgetAnalysis, CategoryTotal, analyze};
pub use category_rules::{CategorizedTransaction, categorize};
pub use summary::{DEFAULT_TOP_CATEGORIES, format_summary};

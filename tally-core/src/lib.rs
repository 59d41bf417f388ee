//! tally-core: Core types for the Tally budgeting helper

pub mod finance;

pub use finance::{CATEGORY_KEYWORDS, Category, Transaction};

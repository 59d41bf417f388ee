//! Fixed-template text report for a budget analysis.

use crate::analyzer::CategoryTotal;

/// Number of categories shown in a summary unless the caller asks otherwise
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Savings rate below which the summary nudges the user to save more
pub const TARGET_SAVINGS_RATE: f64 = 0.20;

const TIP_SAVE_MORE: &str = "Try to save at least 20% of your income.";
const TIP_GOOD_JOB: &str = "Good job! You're saving well.";

/// Render the budget summary. Absent values print as `N/A`.
pub fn format_summary(
    income: Option<f64>,
    total_expense: f64,
    savings: Option<f64>,
    savings_rate: Option<f64>,
    top_categories: &[CategoryTotal],
) -> String {
    let mut s = String::new();
    s.push_str("--- Budget Summary ---\n");
    s.push_str(&format!("Income: {}\n", money_or_na(income)));
    s.push_str(&format!("Total Expenses: {:.2}\n", total_expense));
    s.push_str(&format!("Savings: {}\n", money_or_na(savings)));
    let rate = match savings_rate {
        Some(r) => format!("{:.2}%", r * 100.0),
        None => "N/A".to_string(),
    };
    s.push_str(&format!("Savings Rate: {}\n", rate));

    s.push_str("\nTop Categories:\n");
    if top_categories.is_empty() {
        s.push_str("  (none)\n");
    }
    for c in top_categories {
        s.push_str(&format!("  {}: {:.2}\n", c.category, c.amount));
    }

    s.push_str(&format!("\nTip: {}\n", tip(savings_rate)));
    s
}

fn tip(savings_rate: Option<f64>) -> &'static str {
    match savings_rate {
        Some(r) if r < TARGET_SAVINGS_RATE => TIP_SAVE_MORE,
        _ => TIP_GOOD_JOB,
    }
}

fn money_or_na(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

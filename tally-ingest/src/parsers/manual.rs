//! Manual entry parser
//!
//! One transaction per line:
//!   Monthly rent,1200
//!   Pizza night, 18.50
//!   done
//!
//! Lines must split into exactly two comma-separated fields and the amount
//! must parse; anything else is skipped. `done` (any case) ends the entry.

use tally_core::Transaction;
use tracing::debug;

/// Outcome of reading one manual-entry line
#[derive(Debug, Clone, PartialEq)]
pub enum ManualLine {
    /// The `done` sentinel
    Done,
    /// Blank or malformed line
    Skip,
    Record(Transaction),
}

pub fn parse_manual_line(line: &str) -> ManualLine {
    let line = line.trim();
    if line.is_empty() {
        return ManualLine::Skip;
    }
    if line.eq_ignore_ascii_case("done") {
        return ManualLine::Done;
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 2 {
        debug!(line, fields = parts.len(), "skipping line: expected description,amount");
        return ManualLine::Skip;
    }

    match parts[1].trim().parse::<f64>() {
        Ok(amount) => ManualLine::Record(Transaction::new(parts[0].trim(), amount)),
        Err(_) => {
            debug!(line, "skipping line: amount is not a number");
            ManualLine::Skip
        }
    }
}

/// Parse a block of manual entries, stopping at the `done` sentinel.
pub fn parse_manual_entries(text: &str) -> Vec<Transaction> {
    let mut out = Vec::new();
    for line in text.lines() {
        match parse_manual_line(line) {
            ManualLine::Done => break,
            ManualLine::Skip => continue,
            ManualLine::Record(txn) => out.push(txn),
        }
    }
    out
}

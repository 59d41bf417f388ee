//! tally-ingest: input adapters turning CSV files and manual entry lines
//! into normalized transaction lists.

pub mod parsers;

pub use parsers::csv_file::{parse_transactions_csv, parse_transactions_csv_path};
pub use parsers::manual::{ManualLine, parse_manual_entries, parse_manual_line};

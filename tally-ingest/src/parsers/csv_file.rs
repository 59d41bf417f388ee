//! Parse `description,amount` CSV exports into transactions.
//!
//! The header row must name a `description` and an `amount` column (any
//! case, any position). Extra columns are ignored. Rows whose amount is
//! missing or not a number are skipped. Text that is not valid UTF-8 (a
//! Latin-1 export, say) is decoded lossily rather than rejected.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;
use tally_core::Transaction;
use tracing::debug;

/// Parse a transactions CSV from any reader (file, upload body, stdin).
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .context("reading CSV header")?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let (desc_idx, amount_idx) = match (column("description"), column("amount")) {
        (Some(d), Some(a)) => (d, a),
        _ => bail!(
            "CSV must have 'description' and 'amount' columns (found: {})",
            headers.join(",")
        ),
    };

    let mut txns = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("reading CSV row {}", i + 2))?;
        let field = |idx: usize| record.get(idx).map(String::from_utf8_lossy);

        let amount = match field(amount_idx).map(|s| s.parse::<f64>()) {
            Some(Ok(a)) => a,
            _ => {
                debug!(row = i + 2, "skipping CSV row: missing or non-numeric amount");
                continue;
            }
        };

        let description = field(desc_idx).unwrap_or_default();
        txns.push(Transaction::new(description.into_owned(), amount));
    }

    Ok(txns)
}

/// Parse a transactions CSV file.
pub fn parse_transactions_csv_path(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_transactions_csv(file).with_context(|| format!("parsing {}", path.display()))
}

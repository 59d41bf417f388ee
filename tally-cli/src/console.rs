use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use tally_core::Transaction;
use tally_finance::{DEFAULT_TOP_CATEGORIES, analyze};
use tally_ingest::{ManualLine, parse_manual_line, parse_transactions_csv_path};

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{}", label)?;
    out.flush().ok();
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

/// Ask for monthly income until it parses. Blank means "not provided".
fn prompt_income<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<f64>> {
    loop {
        let Some(s) = prompt(input, out, "Enter your monthly income (blank to skip): ")? else {
            bail!("input closed before income was entered");
        };
        if s.is_empty() {
            return Ok(None);
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => return Ok(Some(v)),
            _ => writeln!(out, "Please enter a non-negative number.")?,
        }
    }
}

fn read_manual_entries<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Vec<Transaction>> {
    writeln!(out, "Enter transactions (type 'done' to finish). Format: description,amount")?;
    let mut rows = Vec::new();
    while let Some(line) = prompt(input, out, "> ")? {
        match parse_manual_line(&line) {
            ManualLine::Done => break,
            ManualLine::Skip => continue,
            ManualLine::Record(txn) => rows.push(txn),
        }
    }
    Ok(rows)
}

/// Line-based console session: income, then a CSV path or manual entries,
/// then the budget summary.
pub fn run_console<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<()> {
    writeln!(out, "Tally - personal budget summary\n")?;
    let income = prompt_income(input, out)?;

    let choice = prompt(input, out, "Do you have a CSV file with transactions? (y/n): ")?
        .unwrap_or_default()
        .to_lowercase();

    let txns = if choice == "y" || choice == "yes" {
        let path = prompt(input, out, "Enter CSV file path (must have 'description,amount' columns): ")?
            .unwrap_or_default();
        parse_transactions_csv_path(&path).with_context(|| format!("loading {}", path))?
    } else {
        read_manual_entries(input, out)?
    };

    if txns.is_empty() {
        writeln!(out, "\nNo transactions entered; nothing to summarize.")?;
        return Ok(());
    }

    let analysis = analyze(&txns, income);
    writeln!(out, "\n{}", analysis.summary(income, DEFAULT_TOP_CATEGORIES))?;
    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tally_core::Transaction;
use tally_finance::{DEFAULT_TOP_CATEGORIES, analyze};
use tally_ingest::{parse_manual_entries, parse_transactions_csv_path};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod console;
mod llm;
mod web;

use llm::{Advisor, OpenAiAdvisor};

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Personal budget summaries and a finance Q&A relay")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize transactions from a CSV file or manual entry lines
    Summary {
        /// CSV with description,amount columns
        #[arg(long, conflicts_with = "entries")]
        csv: Option<PathBuf>,

        /// File of `description,amount` lines ("-" or omitted reads stdin)
        #[arg(long)]
        entries: Option<PathBuf>,

        /// Monthly income; enables savings and savings rate
        #[arg(long)]
        income: Option<f64>,

        /// Number of categories to list
        #[arg(long, default_value_t = DEFAULT_TOP_CATEGORIES)]
        top: usize,
    },

    /// Interactive console session (prompts for income and transactions)
    Interactive,

    /// Ask the finance advisor a question
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Request timeout in seconds (overrides TALLY_ADVISOR_TIMEOUT_SECS)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Serve the browser form and JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8501)]
        port: u16,

        /// Advisor request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Number of categories to list in summaries
        #[arg(long, default_value_t = DEFAULT_TOP_CATEGORIES)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr).compact())
        .init();

    match cli.command {
        Command::Summary {
            csv,
            entries,
            income,
            top,
        } => {
            summary(csv, entries, income, top)?;
        }

        Command::Interactive => {
            let stdin = io::stdin();
            console::run_console(&mut stdin.lock(), &mut io::stdout())?;
        }

        Command::Ask {
            question,
            timeout_secs,
        } => {
            let cfg = config::load_config()?.with_timeout_secs(timeout_secs);
            let question = question.join(" ");
            if question.trim().is_empty() {
                bail!("question must not be empty");
            }

            let advisor = OpenAiAdvisor::new(&cfg)?;
            debug!(model = advisor.model(), "asking advisor");
            let answer = advisor
                .ask(question.trim())
                .await
                .context("advisor request failed")?;
            println!("{}", answer);
        }

        Command::Serve {
            host,
            port,
            timeout_secs,
            top,
        } => {
            let cfg = config::load_config()?.with_timeout_secs(timeout_secs);
            let advisor: Option<Arc<dyn Advisor>> = match OpenAiAdvisor::new(&cfg) {
                Ok(a) => {
                    info!("Advisor configured (model: {})", a.model());
                    Some(Arc::new(a) as Arc<dyn Advisor>)
                }
                Err(e) => {
                    info!("Advisor disabled: {}", e);
                    None
                }
            };

            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;
            web::serve(addr, web::AppState { advisor, top_n: top }).await?;
        }
    }

    Ok(())
}

fn summary(
    csv: Option<PathBuf>,
    entries: Option<PathBuf>,
    income: Option<f64>,
    top: usize,
) -> Result<()> {
    if let Some(v) = income {
        if !v.is_finite() || v < 0.0 {
            bail!("--income must be a non-negative number, got {v}");
        }
    }

    let txns = match csv {
        Some(path) => {
            if !path.exists() {
                bail!("CSV not found: {} (pass --csv <path>)", path.display());
            }
            parse_transactions_csv_path(&path)?
        }
        None => {
            let text = match entries {
                Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(&p)
                    .with_context(|| format!("read {}", p.display()))?,
                _ => {
                    let mut s = String::new();
                    io::stdin().read_to_string(&mut s).context("read stdin")?;
                    s
                }
            };
            parse_manual_entries(&text)
        }
    };

    info!("Parsed {} transactions", txns.len());
    println!("{}", summary_text(&txns, income, top));
    Ok(())
}

/// Summary for `txns`, or a notice when nothing parsed.
fn summary_text(txns: &[Transaction], income: Option<f64>, top: usize) -> String {
    if txns.is_empty() {
        return "No valid transactions found (expected description,amount rows); nothing to summarize."
            .to_string();
    }
    analyze(txns, income).summary(income, top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_a_notice() {
        let text = summary_text(&[], Some(1000.0), DEFAULT_TOP_CATEGORIES);
        assert!(text.contains("nothing to summarize"));
        assert!(!text.contains("Budget Summary"));
    }

    #[test]
    fn test_summary_text_renders_rows() {
        let txns = parse_manual_entries("rent,1000\npizza,50\ndone\n");
        let text = summary_text(&txns, Some(2000.0), DEFAULT_TOP_CATEGORIES);
        assert!(text.contains("Total Expenses: 1050.00"));
        assert!(text.contains("Savings Rate: 47.50%"));
    }

    #[test]
    fn test_summary_with_empty_entries_file_succeeds() {
        let f = tempfile::NamedTempFile::new().unwrap();
        summary(None, Some(f.path().to_path_buf()), None, DEFAULT_TOP_CATEGORIES).unwrap();
    }

    #[test]
    fn test_summary_rejects_negative_income() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(summary(None, Some(f.path().to_path_buf()), Some(-1.0), 5).is_err());
    }
}

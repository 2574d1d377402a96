//! Transaction batch CLI
//!
//! Inspects and edits a fixed-width transaction batch file. Each invocation
//! performs one operation; every successful change rewrites the file.
//!
//! # Usage
//!
//! ```bash
//! txn-batch task_data.txt show
//! txn-batch task_data.txt get footer "Control Sum"
//! txn-batch task_data.txt set 10 Amount 4123.22
//! txn-batch task_data.txt set header Name John
//! txn-batch task_data.txt append 23412.12 PLN
//! txn-batch task_data.txt check
//! txn-batch task_data.txt export > transactions.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to see commits and rewrites

use std::env;
use std::io::{self, Write};
use std::process;
use txn_batch::layout::{AMOUNT, CURRENCY, RESERVED};
use txn_batch::{BatchError, Result, Store, Target};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let path = args
        .first()
        .ok_or_else(|| BatchError::Usage("Missing input file argument".to_string()))?;
    let command = args
        .get(1)
        .ok_or_else(|| BatchError::Usage("Missing command".to_string()))?;
    let params = &args[2..];

    let mut store = Store::load(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command.as_str() {
        "show" => {
            writeln!(out, "Header: {}", store.header())?;
            for (index, transaction) in store.transactions().iter().enumerate() {
                writeln!(out, "{}: {}", index, transaction)?;
            }
            writeln!(out, "Footer: {}", store.footer())?;
        }
        "get" => {
            let [target, field] = expect_params::<2>(params, "get <target> <field>")?;
            let value = store.field(parse_target(target)?, field)?;
            writeln!(out, "{}", value)?;
        }
        "set" => {
            let [target, field, value] =
                expect_params::<3>(params, "set <target> <field> <value>")?;
            let outcome = store.change_field(parse_target(target)?, field, value)?;
            writeln!(out, "{}", outcome)?;
        }
        "append" => {
            let (amount, currency, reserved) = match params {
                [amount, currency] => (amount.as_str(), currency.as_str(), ""),
                [amount, currency, reserved] => {
                    (amount.as_str(), currency.as_str(), reserved.as_str())
                }
                _ => {
                    return Err(BatchError::Usage(
                        "Expected: append <amount> <currency> [reserved]".to_string(),
                    ))
                }
            };
            let outcome = store.append_transaction(&[
                (AMOUNT, amount),
                (CURRENCY, currency),
                (RESERVED, reserved),
            ])?;
            writeln!(out, "{}", outcome)?;
        }
        "check" => {
            let findings = store.audit();
            for finding in &findings {
                writeln!(out, "{}", finding)?;
            }
            if !findings.is_empty() {
                return Err(BatchError::AuditFailed {
                    count: findings.len(),
                });
            }
            writeln!(out, "No discrepancies found")?;
        }
        "export" => store.export_csv(&mut out)?,
        other => {
            return Err(BatchError::Usage(format!("Unknown command \"{}\"", other)));
        }
    }

    out.flush()?;
    Ok(())
}

/// `header`, `footer`, or a zero-based transaction index.
fn parse_target(s: &str) -> Result<Target> {
    match s {
        "header" => Ok(Target::Header),
        "footer" => Ok(Target::Footer),
        _ => s
            .parse::<usize>()
            .map(Target::Transaction)
            .map_err(|_| BatchError::Usage(format!("Invalid target \"{}\"", s))),
    }
}

fn expect_params<'a, const N: usize>(params: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    let refs: Vec<&str> = params.iter().map(String::as_str).collect();
    <[&str; N]>::try_from(refs).map_err(|_| BatchError::Usage(format!("Expected: {}", usage)))
}

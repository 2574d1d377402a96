//! In-memory transaction store.
//!
//! Holds the parsed header, transaction table and footer of one batch file.
//! Every mutation is validated, applied, followed by an aggregate recompute
//! and a rewrite of the whole file.

use crate::amount::{Amount, AmountParseError};
use crate::codec::{self, Batch};
use crate::config::Config;
use crate::error::{BatchError, Result, ValidationError};
use crate::layout::{
    Layout, AMOUNT, CONTROL_SUM, COUNTER, CURRENCY, FIELD_ID, FOOTER, RESERVED, TOTAL_COUNTER,
    TRANSACTION,
};
use crate::record::{Record, Value};
use crate::report::{LogReporter, Reporter};
use crate::validate::{
    is_decimal, is_known_currency, is_positive_integer, is_unlocked_field, within_length,
};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

/// Which record a field edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Header,
    /// Zero-based position in the transaction table.
    Transaction(usize),
    Footer,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Header => f.write_str("header"),
            Target::Transaction(index) => write!(f, "transaction {}", index),
            Target::Footer => f.write_str("footer"),
        }
    }
}

/// A committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    FieldChanged {
        target: Target,
        field: &'static str,
        value: Value,
    },
    TransactionAppended {
        counter: i64,
        amount: Amount,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::FieldChanged {
                target,
                field,
                value,
            } => write!(
                f,
                "Value in field \"{}\" of {} changed successfully to \"{}\"",
                field, target, value
            ),
            Outcome::TransactionAppended { counter, amount } => write!(
                f,
                "Transaction {} with amount {} appended successfully",
                counter, amount
            ),
        }
    }
}

/// Something in the loaded file that disagrees with the batch rules.
///
/// Loading never re-validates, so a corrupt file can be edited; `audit`
/// lists what a rewrite would fix or what still needs a manual edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    UnexpectedFieldId {
        target: Target,
        expected: String,
        found: String,
    },
    CounterOutOfSequence {
        index: usize,
        expected: i64,
        found: Option<i64>,
    },
    UnknownCurrency {
        index: usize,
        found: String,
    },
    TotalCounterMismatch {
        expected: i64,
        found: String,
    },
    ControlSumMismatch {
        expected: i64,
        found: String,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::UnexpectedFieldId {
                target,
                expected,
                found,
            } => write!(
                f,
                "{}: Field id is \"{}\", expected \"{}\"",
                target, found, expected
            ),
            Discrepancy::CounterOutOfSequence {
                index,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "transaction {}: Counter is {}, expected {}",
                    index, found, expected
                ),
                None => write!(f, "transaction {}: Counter is missing", index),
            },
            Discrepancy::UnknownCurrency { index, found } => {
                write!(f, "transaction {}: unknown currency \"{}\"", index, found)
            }
            Discrepancy::TotalCounterMismatch { expected, found } => write!(
                f,
                "footer: Total Counter is \"{}\", table holds {}",
                found, expected
            ),
            Discrepancy::ControlSumMismatch { expected, found } => write!(
                f,
                "footer: Control Sum is \"{}\", transactions sum to {}",
                found, expected
            ),
        }
    }
}

/// One CSV export row.
#[derive(Debug, Serialize)]
struct TransactionRow {
    counter: Option<i64>,
    amount: Option<Amount>,
    currency: String,
    reserved: String,
}

/// The transaction store for one batch file.
///
/// # Invariants
///
/// After every successful mutation:
/// - transaction counters are exactly `1..=N` in table order
/// - footer `Total Counter == N`
/// - footer `Control Sum` equals the sum of all amounts in minor units
/// - the file on disk matches the in-memory state
///
/// A failed rewrite rolls the in-memory change back, so memory and disk
/// never diverge.
pub struct Store {
    path: PathBuf,
    batch: Batch,
    config: Config,
    reporter: Box<dyn Reporter>,
}

impl Store {
    /// Loads a batch file with the default configuration, reporting through
    /// the `log` crate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, Config::default(), Box::new(LogReporter))
    }

    /// Loads a batch file with an explicit configuration and reporter.
    pub fn load_with<P: AsRef<Path>>(
        path: P,
        config: Config,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BatchError::FileNotFound { path: path.clone() },
            _ => BatchError::Io(e),
        })?;

        let batch = codec::read_batch(BufReader::new(file))?;
        info!(
            "Loaded {} transactions from {}",
            batch.transactions.len(),
            path.display()
        );

        Ok(Self::from_batch(path, batch, config, reporter))
    }

    /// Wraps an already-parsed batch that will be persisted to `path`.
    pub fn from_batch<P: Into<PathBuf>>(
        path: P,
        batch: Batch,
        config: Config,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Store {
            path: path.into(),
            batch,
            config,
            reporter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn header(&self) -> &Record {
        &self.batch.header
    }

    pub fn transactions(&self) -> &[Record] {
        &self.batch.transactions
    }

    pub fn footer(&self) -> &Record {
        &self.batch.footer
    }

    /// Returns the record a target points at.
    pub fn record(&self, target: Target) -> std::result::Result<&Record, ValidationError> {
        match target {
            Target::Header => Ok(&self.batch.header),
            Target::Footer => Ok(&self.batch.footer),
            Target::Transaction(index) => {
                let len = self.batch.transactions.len();
                self.batch
                    .transactions
                    .get(index)
                    .ok_or(ValidationError::NoSuchTransaction { index, len })
            }
        }
    }

    fn record_mut(&mut self, target: Target) -> std::result::Result<&mut Record, ValidationError> {
        match target {
            Target::Header => Ok(&mut self.batch.header),
            Target::Footer => Ok(&mut self.batch.footer),
            Target::Transaction(index) => {
                let len = self.batch.transactions.len();
                self.batch
                    .transactions
                    .get_mut(index)
                    .ok_or(ValidationError::NoSuchTransaction { index, len })
            }
        }
    }

    /// Reads one field of one record.
    pub fn field(&self, target: Target, field: &str) -> Result<&Value> {
        let record = self.record(target)?;
        record.get(field).ok_or_else(|| {
            ValidationError::UnknownField {
                field: field.to_string(),
            }
            .into()
        })
    }

    /// Runs the per-field rules against a proposed raw value.
    ///
    /// Returns the value to store: amounts are parsed and rounded to 2
    /// places, everything else is kept as text. An amount is measured in its
    /// shortest form, so `9999999999` counts as `"9999999999.0"`. Nothing is
    /// modified.
    pub fn validate_field(
        &self,
        layout: &Layout,
        field: &str,
        raw: &str,
    ) -> std::result::Result<Value, ValidationError> {
        self.check_field(layout, field, raw).map(|(_, value)| value)
    }

    fn check_field(
        &self,
        layout: &Layout,
        field: &str,
        raw: &str,
    ) -> std::result::Result<(&'static str, Value), ValidationError> {
        if !is_unlocked_field(field, layout.locked_fields()) {
            return Err(ValidationError::LockedField {
                field: field.to_string(),
            });
        }
        let column = layout
            .column(field)
            .ok_or_else(|| ValidationError::UnknownField {
                field: field.to_string(),
            })?;
        let name = column.spec.name;

        let value = match name {
            AMOUNT => Value::Amount(parse_amount(name, raw, column.width)?),
            CURRENCY if !is_known_currency(raw, self.config.currencies.as_slice()) => {
                return Err(ValidationError::Type {
                    field: name,
                    value: raw.to_string(),
                    expected: format!(
                        "an available currency ({})",
                        self.config.currencies.join(", ")
                    ),
                });
            }
            _ => Value::Text(raw.to_string()),
        };

        let text = match &value {
            Value::Amount(amount) => amount.to_compact_string(),
            other => other.to_string(),
        };
        if !within_length(&text, column.width) {
            return Err(ValidationError::Length {
                field: name,
                value: text,
                max: column.width,
            });
        }

        Ok((name, value))
    }

    /// Changes one field of one record and rewrites the file.
    ///
    /// On a validation failure nothing changes and the error names the rule
    /// and the offending value.
    pub fn change_field(&mut self, target: Target, field: &str, raw: &str) -> Result<Outcome> {
        let checked = self
            .record(target)
            .and_then(|record| self.check_field(record.layout(), field, raw));
        let (name, value) = match checked {
            Ok(checked) => checked,
            Err(e) => return Err(self.reject(e.into())),
        };

        let footer = self.batch.footer.clone();
        let previous = self.record_mut(target)?.set(name, value.clone());

        if let Err(e) = self.save() {
            if let (Ok(record), Some(previous)) = (self.record_mut(target), previous) {
                record.set(name, previous);
            }
            self.batch.footer = footer;
            return Err(self.reject(e));
        }

        Ok(self.commit(Outcome::FieldChanged {
            target,
            field: name,
            value,
        }))
    }

    /// Appends a transaction built from its business fields and rewrites the
    /// file.
    ///
    /// Every field of the transaction layout that is not locked must be
    /// supplied exactly once. `Field id` and `Counter` are assigned by the
    /// store; if any value fails validation nothing is appended.
    pub fn append_transaction(&mut self, values: &[(&str, &str)]) -> Result<Outcome> {
        let mut validated: HashMap<&'static str, Value> = HashMap::new();
        for (field, raw) in values {
            match self.check_field(&TRANSACTION, field, raw) {
                Ok((name, value)) => {
                    if validated.insert(name, value).is_some() {
                        let duplicate = ValidationError::DuplicateField { field: name };
                        return Err(self.reject(duplicate.into()));
                    }
                }
                Err(e) => return Err(self.reject(e.into())),
            }
        }

        let counter = self.batch.transactions.len() as i64 + 1;
        let mut fields = Vec::with_capacity(TRANSACTION.len());
        for column in TRANSACTION.columns() {
            let value = match column.spec.name {
                FIELD_ID => Value::Text(self.config.transaction_marker.clone()),
                COUNTER => Value::Integer(counter),
                name => match validated.remove(name) {
                    Some(value) => value,
                    None => {
                        return Err(self.reject(ValidationError::MissingField { field: name }.into()))
                    }
                },
            };
            fields.push(value);
        }

        let record = Record::from_values(&TRANSACTION, fields);
        let amount = record.amount().unwrap_or(Amount::ZERO);
        let footer = self.batch.footer.clone();
        self.batch.transactions.push(record);

        if let Err(e) = self.save() {
            self.batch.transactions.pop();
            self.batch.footer = footer;
            return Err(self.reject(e));
        }

        Ok(self.commit(Outcome::TransactionAppended { counter, amount }))
    }

    /// Sets the footer aggregates from the current table.
    ///
    /// Each amount is converted to minor units exactly once and the total is
    /// summed as integers.
    pub fn recompute_aggregates(&mut self) -> Result<()> {
        let total = self.batch.transactions.len() as i64;
        let control_sum = self.control_sum()?;

        self.batch.footer.set(TOTAL_COUNTER, Value::Integer(total));
        self.batch.footer.set(CONTROL_SUM, Value::Integer(control_sum));
        debug!(
            "Recomputed aggregates: total counter {}, control sum {}",
            total, control_sum
        );
        Ok(())
    }

    fn control_sum(&self) -> Result<i64> {
        let width = FOOTER.column(CONTROL_SUM).map_or(0, |c| c.width);
        let mut sum: i64 = 0;
        for record in &self.batch.transactions {
            let Some(amount) = record.amount() else {
                continue;
            };
            let overflow = || BatchError::FieldOverflow {
                field: CONTROL_SUM,
                value: amount.to_string(),
                width,
            };
            let units = amount.to_minor_units().ok_or_else(overflow)?;
            sum = sum.checked_add(units).ok_or_else(overflow)?;
        }
        Ok(sum)
    }

    /// Recomputes aggregates and rewrites the whole file.
    ///
    /// The batch is fully serialized before the file is opened, so a
    /// serialization error leaves the file untouched.
    pub fn save(&mut self) -> Result<()> {
        self.recompute_aggregates()?;

        let mut buffer = Vec::new();
        codec::write_batch(&mut buffer, &self.batch)?;
        fs::write(&self.path, &buffer).map_err(|source| BatchError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "Rewrote {} ({} bytes, {} transactions)",
            self.path.display(),
            buffer.len(),
            self.batch.transactions.len()
        );
        Ok(())
    }

    /// Lists every place where the loaded data breaks the batch rules.
    /// Read-only.
    pub fn audit(&self) -> Vec<Discrepancy> {
        let mut findings = Vec::new();

        self.check_field_id(Target::Header, &self.config.header_marker, &mut findings);
        for (index, record) in self.batch.transactions.iter().enumerate() {
            let target = Target::Transaction(index);
            self.check_field_id(target, &self.config.transaction_marker, &mut findings);

            let expected = index as i64 + 1;
            if record.counter() != Some(expected) {
                findings.push(Discrepancy::CounterOutOfSequence {
                    index,
                    expected,
                    found: record.counter(),
                });
            }

            let currency = record.get(CURRENCY).map(Value::to_string).unwrap_or_default();
            if !is_known_currency(&currency, self.config.currencies.as_slice()) {
                findings.push(Discrepancy::UnknownCurrency {
                    index,
                    found: currency,
                });
            }
        }
        self.check_field_id(Target::Footer, &self.config.footer_marker, &mut findings);

        let expected_total = self.batch.transactions.len() as i64;
        let found_total = self.footer_text(TOTAL_COUNTER);
        let total_matches = found_total.parse::<i64>().ok() == Some(expected_total)
            && (expected_total == 0 || is_positive_integer(&found_total));
        if !total_matches {
            findings.push(Discrepancy::TotalCounterMismatch {
                expected: expected_total,
                found: found_total,
            });
        }

        if let Ok(expected_sum) = self.control_sum() {
            let found_sum = self.footer_text(CONTROL_SUM);
            if found_sum.parse::<i64>().ok() != Some(expected_sum) {
                findings.push(Discrepancy::ControlSumMismatch {
                    expected: expected_sum,
                    found: found_sum,
                });
            }
        }

        findings
    }

    fn check_field_id(&self, target: Target, expected: &str, findings: &mut Vec<Discrepancy>) {
        let found = self
            .record(target)
            .ok()
            .and_then(|record| record.get(FIELD_ID))
            .map(Value::to_string)
            .unwrap_or_default();
        if found != expected {
            findings.push(Discrepancy::UnexpectedFieldId {
                target,
                expected: expected.to_string(),
                found,
            });
        }
    }

    fn footer_text(&self, field: &str) -> String {
        self.batch
            .footer
            .get(field)
            .map(Value::to_string)
            .unwrap_or_default()
    }

    /// Writes the transaction table as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for record in &self.batch.transactions {
            let text = |field: &str| record.get(field).map(Value::to_string).unwrap_or_default();
            csv_writer.serialize(TransactionRow {
                counter: record.counter(),
                amount: record.amount(),
                currency: text(CURRENCY),
                reserved: text(RESERVED),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    fn commit(&self, outcome: Outcome) -> Outcome {
        self.reporter.committed(&outcome);
        outcome
    }

    fn reject(&self, error: BatchError) -> BatchError {
        self.reporter.rejected(&error);
        error
    }
}

/// Parses and rounds an amount, mapping failures to the rule they break.
fn parse_amount(
    field: &'static str,
    raw: &str,
    width: usize,
) -> std::result::Result<Amount, ValidationError> {
    let not_a_decimal = || ValidationError::Type {
        field,
        value: raw.to_string(),
        expected: "a decimal number".to_string(),
    };
    if !is_decimal(raw) {
        return Err(not_a_decimal());
    }

    let amount = Amount::parse_rounded(raw).map_err(|e| match e {
        AmountParseError::NotANumber => not_a_decimal(),
        // anything beyond decimal range is far wider than any column
        AmountParseError::OutOfRange => ValidationError::Length {
            field,
            value: raw.to_string(),
            max: width,
        },
    })?;

    if amount.is_negative() {
        return Err(ValidationError::Type {
            field,
            value: raw.to_string(),
            expected: "a non-negative amount".to_string(),
        });
    }
    Ok(amount)
}

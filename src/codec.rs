//! Fixed-width record codec.
//!
//! Splits lines into records by column boundaries, coerces transaction
//! fields to their typed forms and renders records back to their exact
//! fixed-width layout.

use crate::amount::Amount;
use crate::error::{BatchError, Result};
use crate::layout::{Layout, AMOUNT, COUNTER, FOOTER, HEADER, TRANSACTION};
use crate::record::{Record, Value};
use log::debug;
use std::io::{BufRead, Write};

/// Line terminator written after every record.
pub const LINE_TERMINATOR: char = '\n';

/// A whole batch file: header, transaction table, footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub header: Record,
    pub transactions: Vec<Record>,
    pub footer: Record,
}

/// Slices a line at the layout's column boundaries and trims each slice.
///
/// Columns past the end of a short line come out empty. Values are not
/// validated here.
pub fn parse_line(line: &str, layout: &'static Layout) -> Record {
    let chars: Vec<char> = line.chars().collect();
    let values = layout.columns().map(|column| {
        let start = column.start.min(chars.len());
        let end = column.spec.end.min(chars.len());
        let slice: String = chars[start..end].iter().collect();
        Value::Text(slice.trim().to_string())
    });
    Record::from_values(layout, values)
}

/// Converts `Counter` to an integer and `Amount` from minor units to an
/// [`Amount`]. Already-typed values are left as they are.
pub fn coerce_transaction_types(record: &mut Record) -> Result<()> {
    let counter = match record.get(COUNTER) {
        Some(Value::Text(text)) => Some(parse_integer(COUNTER, text)?),
        _ => None,
    };
    let minor_units = match record.get(AMOUNT) {
        Some(Value::Text(text)) => Some(parse_integer(AMOUNT, text)?),
        _ => None,
    };

    if let Some(counter) = counter {
        record.set(COUNTER, Value::Integer(counter));
    }
    if let Some(units) = minor_units {
        record.set(AMOUNT, Value::Amount(Amount::from_minor_units(units)));
    }
    Ok(())
}

fn parse_integer(field: &'static str, text: &str) -> Result<i64> {
    text.parse::<i64>().map_err(|_| BatchError::Coercion {
        field,
        value: text.to_string(),
    })
}

/// Keeps the leading `width` characters of `value`, then left-pads with
/// `fill` to exactly `width` characters.
pub fn format_field(value: &str, width: usize, fill: char) -> String {
    let truncated: String = value.chars().take(width).collect();
    let padding = width - truncated.chars().count();
    let mut field = String::with_capacity(width);
    field.extend(std::iter::repeat(fill).take(padding));
    field.push_str(&truncated);
    field
}

/// Renders a record as one fixed-width line including the terminator.
///
/// Text columns are silently truncated to their width. A numeric column
/// whose value does not fit is an error instead, since truncating digits
/// would change the number.
pub fn serialize_record(record: &Record) -> Result<String> {
    let layout = record.layout();
    let mut line = String::with_capacity(layout.line_width() + 1);

    for (column, (_, value)) in layout.columns().zip(record.iter()) {
        let text = value
            .to_field_text()
            .ok_or_else(|| overflow(column.spec.name, value, column.width))?;
        if column.spec.is_numeric() && text.chars().count() > column.width {
            return Err(overflow(column.spec.name, value, column.width));
        }
        line.push_str(&format_field(&text, column.width, column.spec.fill));
    }

    line.push(LINE_TERMINATOR);
    Ok(line)
}

fn overflow(field: &'static str, value: &Value, width: usize) -> BatchError {
    BatchError::FieldOverflow {
        field,
        value: value.to_string(),
        width,
    }
}

/// Renders the header, every transaction in order, then the footer.
pub fn serialize_table(
    header: &Record,
    transactions: &[Record],
    footer: &Record,
) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(transactions.len() + 2);
    lines.push(serialize_record(header)?);
    for transaction in transactions {
        lines.push(serialize_record(transaction)?);
    }
    lines.push(serialize_record(footer)?);
    Ok(lines)
}

/// Reads a whole batch: first line header, last line footer, transactions
/// in between. Trailing blank lines are ignored.
pub fn read_batch<R: BufRead>(reader: R) -> Result<Batch> {
    let mut lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.len() < 2 {
        return Err(BatchError::MalformedFile {
            line: lines.len() + 1,
            message: "expected a header line and a footer line".to_string(),
        });
    }

    let header = parse_line(&lines[0], &HEADER);
    let footer = parse_line(&lines[lines.len() - 1], &FOOTER);

    let mut transactions = Vec::with_capacity(lines.len() - 2);
    for (idx, line) in lines[1..lines.len() - 1].iter().enumerate() {
        let line_num = idx + 2;
        let mut record = parse_line(line, &TRANSACTION);
        coerce_transaction_types(&mut record).map_err(|e| BatchError::MalformedFile {
            line: line_num,
            message: e.to_string(),
        })?;
        transactions.push(record);
    }

    debug!("Parsed batch with {} transactions", transactions.len());

    Ok(Batch {
        header,
        transactions,
        footer,
    })
}

/// Writes every line of the batch.
pub fn write_batch<W: Write>(mut writer: W, batch: &Batch) -> Result<()> {
    for line in serialize_table(&batch.header, &batch.transactions, &batch.footer)? {
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

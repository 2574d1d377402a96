//! Record model: one parsed line as a field-name-to-value mapping.

use crate::amount::Amount;
use crate::layout::{Layout, RecordKind, AMOUNT, COUNTER};
use std::fmt;

/// A single field value.
///
/// Lines are parsed into `Text`; transaction coercion turns `Counter` into
/// `Integer` and `Amount` into `Amount`. Footer aggregates become `Integer`
/// once recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Amount(Amount),
}

impl Value {
    /// Renders the value the way it is written to disk.
    ///
    /// Amounts become integer minor units. Returns `None` if an amount does
    /// not fit in an `i64` count of minor units.
    pub fn to_field_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Amount(a) => a.to_minor_units().map(|units| units.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Amount(a) => write!(f, "{}", a),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<Amount> for Value {
    fn from(a: Amount) -> Self {
        Value::Amount(a)
    }
}

/// One record: a value for every field of its layout, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    layout: &'static Layout,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record from values given in layout order.
    ///
    /// Missing trailing values are filled with empty text; extra values are
    /// dropped.
    pub fn from_values<I>(layout: &'static Layout, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut values: Vec<Value> = values.into_iter().take(layout.len()).collect();
        values.resize(layout.len(), Value::Text(String::new()));
        Record { layout, values }
    }

    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    pub fn kind(&self) -> RecordKind {
        self.layout.kind
    }

    /// Returns the value of a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let column = self.layout.column(field)?;
        self.values.get(column.index)
    }

    /// Replaces a field's value, returning the previous one.
    ///
    /// Returns `None` and leaves the record untouched if the layout has no
    /// such field.
    pub fn set(&mut self, field: &str, value: Value) -> Option<Value> {
        let column = self.layout.column(field)?;
        let slot = self.values.get_mut(column.index)?;
        Some(std::mem::replace(slot, value))
    }

    /// Iterates over `(field name, value)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.layout.field_names().zip(self.values.iter())
    }

    /// The transaction counter, if coerced.
    pub fn counter(&self) -> Option<i64> {
        match self.get(COUNTER)? {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The transaction amount, if coerced.
    pub fn amount(&self) -> Option<Amount> {
        match self.get(AMOUNT)? {
            Value::Amount(a) => Some(*a),
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{}: {}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

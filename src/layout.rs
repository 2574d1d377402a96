//! Static column layouts for the three record kinds.
//!
//! Each layout is an ordered list of fields with strictly increasing end
//! offsets. A field's width is the distance from the previous field's end
//! (or column 0 for the first field).

use std::fmt;

/// Fill character for numeric columns.
pub const DIGIT_FILL: char = '0';

/// Fill character for text columns.
pub const TEXT_FILL: char = ' ';

pub const FIELD_ID: &str = "Field id";
pub const NAME: &str = "Name";
pub const SURNAME: &str = "Surname";
pub const PATRONYMIC: &str = "Patronymic";
pub const ADDRESS: &str = "Address";
pub const COUNTER: &str = "Counter";
pub const AMOUNT: &str = "Amount";
pub const CURRENCY: &str = "Currency";
pub const RESERVED: &str = "Reserved";
pub const TOTAL_COUNTER: &str = "Total Counter";
pub const CONTROL_SUM: &str = "Control Sum";

/// Which of the three line kinds a layout describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Header,
    Transaction,
    Footer,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Header => "header",
            RecordKind::Transaction => "transaction",
            RecordKind::Footer => "footer",
        };
        f.write_str(name)
    }
}

/// One column of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Exclusive end column.
    pub end: usize,
    pub fill: char,
    /// Store-managed; refused by field edits.
    pub locked: bool,
}

impl FieldSpec {
    const fn text(name: &'static str, end: usize) -> Self {
        FieldSpec {
            name,
            end,
            fill: TEXT_FILL,
            locked: false,
        }
    }

    const fn digits(name: &'static str, end: usize, locked: bool) -> Self {
        FieldSpec {
            name,
            end,
            fill: DIGIT_FILL,
            locked,
        }
    }

    /// Returns `true` for zero-filled numeric columns.
    pub fn is_numeric(&self) -> bool {
        self.fill == DIGIT_FILL
    }
}

/// A resolved field: its spec plus computed start column and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub spec: FieldSpec,
    pub index: usize,
    pub start: usize,
    pub width: usize,
}

/// Column schema for one record kind.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    pub kind: RecordKind,
    fields: &'static [FieldSpec],
}

pub static HEADER: Layout = Layout {
    kind: RecordKind::Header,
    fields: &[
        FieldSpec::digits(FIELD_ID, 2, true),
        FieldSpec::text(NAME, 30),
        FieldSpec::text(SURNAME, 60),
        FieldSpec::text(PATRONYMIC, 90),
        FieldSpec::text(ADDRESS, 120),
    ],
};

pub static TRANSACTION: Layout = Layout {
    kind: RecordKind::Transaction,
    fields: &[
        FieldSpec::digits(FIELD_ID, 2, true),
        FieldSpec::digits(COUNTER, 8, true),
        FieldSpec::digits(AMOUNT, 20, false),
        FieldSpec::text(CURRENCY, 23),
        FieldSpec::text(RESERVED, 120),
    ],
};

pub static FOOTER: Layout = Layout {
    kind: RecordKind::Footer,
    fields: &[
        FieldSpec::digits(FIELD_ID, 2, true),
        FieldSpec::digits(TOTAL_COUNTER, 8, true),
        FieldSpec::digits(CONTROL_SUM, 20, true),
        FieldSpec::text(RESERVED, 120),
    ],
};

impl Layout {
    /// Returns the static layout for a record kind.
    pub fn of(kind: RecordKind) -> &'static Layout {
        match kind {
            RecordKind::Header => &HEADER,
            RecordKind::Transaction => &TRANSACTION,
            RecordKind::Footer => &FOOTER,
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total line width without the terminator.
    pub fn line_width(&self) -> usize {
        self.fields.last().map(|f| f.end).unwrap_or(0)
    }

    /// Iterates over the columns in layout order.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.fields.iter().enumerate().scan(0, |start, (index, spec)| {
            let column = Column {
                spec: *spec,
                index,
                start: *start,
                width: spec.end - *start,
            };
            *start = spec.end;
            Some(column)
        })
    }

    /// Looks up a column by field name.
    pub fn column(&self, name: &str) -> Option<Column> {
        self.columns().find(|c| c.spec.name == name)
    }

    /// Field names in layout order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Names of the locked fields.
    pub fn locked_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.locked).map(|f| f.name)
    }
}

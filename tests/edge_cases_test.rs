//! Store scenarios against the sample batch file.
//!
//! Every test works on a scratch copy of `tests/data/task_data.txt` so the
//! fixture itself is never rewritten.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;
use txn_batch::codec::{read_batch, serialize_table};
use txn_batch::layout::{
    AMOUNT, CONTROL_SUM, COUNTER, CURRENCY, FIELD_ID, NAME, RESERVED, SURNAME, TOTAL_COUNTER,
};
use txn_batch::{BatchError, Discrepancy, Store, Target, ValidationError, Value};

const FIXTURE: &str = "tests/data/task_data.txt";

const FIXTURE_AMOUNTS: [&str; 12] = [
    "20.00", "120.00", "220.00", "320.00", "420.00", "4212.35", "4142.59", "720.00", "424.87",
    "920.00", "1020.00", "53.53",
];

fn scratch_copy() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task_data.txt");
    fs::copy(FIXTURE, &path).unwrap();
    (dir, path)
}

fn amounts(store: &Store) -> Vec<String> {
    store
        .transactions()
        .iter()
        .map(|t| t.amount().unwrap().to_string())
        .collect()
}

fn assert_validation<F>(result: txn_batch::Result<txn_batch::Outcome>, check: F)
where
    F: FnOnce(&ValidationError) -> bool,
{
    match result {
        Err(BatchError::Validation(e)) => assert!(check(&e), "unexpected rejection: {:?}", e),
        other => panic!("Expected a validation error, got {:?}", other),
    }
}

fn assert_aggregates_match(store: &Store) {
    let expected_sum: i64 = store
        .transactions()
        .iter()
        .map(|t| t.amount().unwrap().to_minor_units().unwrap())
        .sum();
    assert_eq!(
        store.footer().get(TOTAL_COUNTER),
        Some(&Value::Integer(store.transactions().len() as i64))
    );
    assert_eq!(
        store.footer().get(CONTROL_SUM),
        Some(&Value::Integer(expected_sum))
    );
    for (index, transaction) in store.transactions().iter().enumerate() {
        assert_eq!(transaction.counter(), Some(index as i64 + 1));
    }
}

// ==================== LOADING ====================

#[test]
fn test_load_fixture() {
    let store = Store::load(FIXTURE).unwrap();

    assert_eq!(store.header().get(FIELD_ID), Some(&Value::from("01")));
    assert_eq!(store.header().get(NAME), Some(&Value::from("name")));
    assert_eq!(store.header().get(SURNAME), Some(&Value::from("surname")));
    assert_eq!(store.header().get("Patronymic"), Some(&Value::from("patronymic")));
    assert_eq!(store.header().get("Address"), Some(&Value::from("address")));

    assert_eq!(store.transactions().len(), 12);
    assert_eq!(amounts(&store), FIXTURE_AMOUNTS);
    let counters: Vec<i64> = store.transactions().iter().filter_map(|t| t.counter()).collect();
    assert_eq!(counters, (1..=12).collect::<Vec<_>>());
    assert_eq!(store.transactions()[11].get(CURRENCY), Some(&Value::from("EUR")));
    assert_eq!(store.transactions()[0].get(RESERVED), Some(&Value::from("")));

    // footer aggregates are loaded as written, not re-validated
    assert_eq!(store.footer().get(FIELD_ID), Some(&Value::from("03")));
    assert_eq!(store.footer().get(TOTAL_COUNTER), Some(&Value::from("000011")));
    assert_eq!(store.footer().get(CONTROL_SUM), Some(&Value::from("000001259334")));
    assert_eq!(store.footer().get(RESERVED), Some(&Value::from("reserved")));
}

#[test]
fn test_load_missing_file() {
    let err = Store::load("tests/data/no_such_file.txt").err().unwrap();
    assert!(matches!(err, BatchError::FileNotFound { .. }));
}

#[test]
fn test_load_corrupt_amount() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.txt");
    let text = fs::read_to_string(FIXTURE).unwrap().replacen("000000002000", "0000000020.0", 1);
    fs::write(&path, text).unwrap();

    let err = Store::load(&path).err().unwrap();
    assert!(matches!(err, BatchError::MalformedFile { line: 2, .. }));
}

#[test]
fn test_load_single_line_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.txt");
    let header = fs::read_to_string(FIXTURE).unwrap().lines().next().unwrap().to_string();
    fs::write(&path, header).unwrap();

    let err = Store::load(&path).err().unwrap();
    assert!(matches!(err, BatchError::MalformedFile { .. }));
}

#[test]
fn test_serialize_table_round_trip() {
    let text = fs::read_to_string(FIXTURE).unwrap();
    let batch = read_batch(Cursor::new(text.clone())).unwrap();
    let lines = serialize_table(&batch.header, &batch.transactions, &batch.footer).unwrap();

    assert_eq!(lines.concat(), text);
    assert_eq!(read_batch(Cursor::new(lines.concat())).unwrap(), batch);
}

// ==================== APPEND ====================

#[test]
fn test_append_rounds_amount_and_updates_footer() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    store
        .append_transaction(&[
            (AMOUNT, "23412.124112313131312312313421411"),
            (CURRENCY, "PLN"),
            (RESERVED, ""),
        ])
        .unwrap();

    let reloaded = Store::load(&path).unwrap();
    assert_eq!(reloaded.transactions().len(), 13);
    let last = &reloaded.transactions()[12];
    assert_eq!(last.counter(), Some(13));
    assert_eq!(last.amount().unwrap().to_string(), "23412.12");
    assert_eq!(last.get(FIELD_ID), Some(&Value::from("02")));
    assert_eq!(last.get(CURRENCY), Some(&Value::from("PLN")));
    assert_eq!(reloaded.footer().get(TOTAL_COUNTER), Some(&Value::from("000013")));
    assert_eq!(
        reloaded.footer().get(CONTROL_SUM),
        Some(&Value::from("000003600546"))
    );
    assert_aggregates_match(&store);
}

#[test]
fn test_append_rejects_too_long_reserved() {
    let (_dir, path) = scratch_copy();
    let before = fs::read_to_string(&path).unwrap();
    let mut store = Store::load(&path).unwrap();

    let reserved = "r".repeat(98);
    assert_validation(
        store.append_transaction(&[(AMOUNT, "1"), (CURRENCY, "PLN"), (RESERVED, &reserved)]),
        |e| matches!(e, ValidationError::Length { field: "Reserved", max: 97, .. }),
    );

    assert_eq!(store.transactions().len(), 12);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_append_rejects_unknown_currency() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    assert_validation(
        store.append_transaction(&[(AMOUNT, "1"), (CURRENCY, "GBP"), (RESERVED, "")]),
        |e| matches!(e, ValidationError::Type { field: "Currency", .. }),
    );
    assert_eq!(store.transactions().len(), 12);
}

// ==================== CHANGE FIELD ====================

#[test]
fn test_change_field_scenario() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();
    let target = Target::Transaction(10);

    store.change_field(target, AMOUNT, "4123.223").unwrap();
    assert_eq!(store.transactions()[10].amount().unwrap().to_string(), "4123.22");

    assert_validation(store.change_field(target, COUNTER, "4123.223"), |e| {
        matches!(e, ValidationError::LockedField { .. })
    });
    assert_validation(store.change_field(target, AMOUNT, "asd.223"), |e| {
        matches!(e, ValidationError::Type { field: "Amount", .. })
    });
    assert_validation(
        store.change_field(target, AMOUNT, "1241241242141231543673526342532352352325.5123"),
        |e| matches!(e, ValidationError::Length { field: "Amount", max: 12, .. }),
    );
    assert_validation(store.change_field(target, CURRENCY, "AUS"), |e| {
        matches!(e, ValidationError::Type { field: "Currency", .. })
    });

    let reloaded = Store::load(&path).unwrap();
    let mut expected = FIXTURE_AMOUNTS.to_vec();
    expected[10] = "4123.22";
    assert_eq!(amounts(&reloaded), expected);
    let currencies: Vec<String> = reloaded
        .transactions()
        .iter()
        .map(|t| t.get(CURRENCY).unwrap().to_string())
        .collect();
    assert_eq!(currencies.iter().filter(|c| *c == "PLN").count(), 11);
    assert_eq!(currencies[11], "EUR");
}

#[test]
fn test_amount_length_counts_rounded_value() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    // 12 characters once rounded
    store
        .change_field(Target::Transaction(0), AMOUNT, "999999999.994")
        .unwrap();
    assert_validation(
        store.change_field(Target::Transaction(0), AMOUNT, "9999999999.99"),
        |e| matches!(e, ValidationError::Length { .. }),
    );

    // trailing zero decimals are not counted
    store
        .change_field(Target::Transaction(0), AMOUNT, "1234567890.1")
        .unwrap();
    assert_validation(
        store.change_field(Target::Transaction(0), AMOUNT, "12345678901.1"),
        |e| matches!(e, ValidationError::Length { max: 12, .. }),
    );

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("02000001123456789010PLN"));
    assert_eq!(
        Store::load(&path).unwrap().transactions()[0].amount().unwrap().to_string(),
        "1234567890.10"
    );
}

#[test]
fn test_change_currency_to_each_known_code() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    for code in ["USD", "EUR", "PLN"] {
        store
            .change_field(Target::Transaction(3), CURRENCY, code)
            .unwrap();
        assert_eq!(
            Store::load(&path).unwrap().transactions()[3].get(CURRENCY),
            Some(&Value::from(code))
        );
    }
    assert_validation(store.change_field(Target::Transaction(3), CURRENCY, "pln"), |e| {
        matches!(e, ValidationError::Type { .. })
    });
}

#[test]
fn test_locked_fields_leave_state_unchanged() {
    let (_dir, path) = scratch_copy();
    let before = fs::read_to_string(&path).unwrap();
    let mut store = Store::load(&path).unwrap();

    for (target, field) in [
        (Target::Header, FIELD_ID),
        (Target::Transaction(0), FIELD_ID),
        (Target::Transaction(0), COUNTER),
        (Target::Footer, TOTAL_COUNTER),
        (Target::Footer, CONTROL_SUM),
    ] {
        assert_validation(store.change_field(target, field, "1"), |e| {
            matches!(e, ValidationError::LockedField { .. })
        });
    }

    assert_eq!(store.footer().get(TOTAL_COUNTER), Some(&Value::from("000011")));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_header_and_footer_text_fields() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    store.change_field(Target::Header, NAME, "Jan").unwrap();
    store
        .change_field(Target::Footer, RESERVED, &"x".repeat(100))
        .unwrap();
    assert_validation(
        store.change_field(Target::Footer, RESERVED, &"x".repeat(101)),
        |e| matches!(e, ValidationError::Length { max: 100, .. }),
    );

    let reloaded = Store::load(&path).unwrap();
    assert_eq!(reloaded.header().get(NAME), Some(&Value::from("Jan")));
    assert_eq!(
        reloaded.footer().get(RESERVED),
        Some(&Value::Text("x".repeat(100)))
    );
}

#[test]
fn test_every_line_stays_120_columns() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    store.change_field(Target::Header, SURNAME, "Kowalski").unwrap();
    store
        .append_transaction(&[(AMOUNT, "0.01"), (CURRENCY, "USD"), (RESERVED, "note")])
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.ends_with('\n'));
    assert_eq!(text.lines().count(), 15);
    assert!(text.lines().all(|l| l.chars().count() == 120));
}

// ==================== AGGREGATES ====================

#[test]
fn test_aggregates_after_mixed_operations() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();

    store.change_field(Target::Transaction(0), AMOUNT, "0.1").unwrap();
    store
        .append_transaction(&[(AMOUNT, "0.2"), (CURRENCY, "EUR"), (RESERVED, "")])
        .unwrap();
    assert_validation(store.change_field(Target::Transaction(1), AMOUNT, "oops"), |e| {
        matches!(e, ValidationError::Type { field: "Amount", .. })
    });
    assert_eq!(store.transactions()[1].amount().unwrap().to_string(), "120.00");
    assert_aggregates_match(&store);
    store.change_field(Target::Transaction(12), AMOUNT, "1e2").unwrap();
    store
        .append_transaction(&[(AMOUNT, "33.335"), (CURRENCY, "USD"), (RESERVED, "x")])
        .unwrap();

    assert_eq!(store.transactions().len(), 14);
    assert_aggregates_match(&store);

    let reloaded = Store::load(&path).unwrap();
    assert!(reloaded.audit().is_empty());
}

// ==================== AUDIT ====================

#[test]
fn test_audit_reports_stale_total_counter() {
    let store = Store::load(FIXTURE).unwrap();
    assert_eq!(
        store.audit(),
        vec![Discrepancy::TotalCounterMismatch {
            expected: 12,
            found: "000011".to_string(),
        }]
    );
}

#[test]
fn test_any_write_repairs_footer() {
    let (_dir, path) = scratch_copy();
    let mut store = Store::load(&path).unwrap();
    store.change_field(Target::Header, NAME, "name").unwrap();

    assert!(store.audit().is_empty());
    assert!(Store::load(&path).unwrap().audit().is_empty());
}

// ==================== EXPORT ====================

#[test]
fn test_export_csv_lists_every_transaction() {
    let store = Store::load(FIXTURE).unwrap();
    let mut output = Vec::new();
    store.export_csv(&mut output).unwrap();
    let output = String::from_utf8(output).unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[0], "counter,amount,currency,reserved");
    assert_eq!(lines[6], "6,4212.35,PLN,");
    assert_eq!(lines[12], "12,53.53,EUR,");
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use outlay_app::{ExpenseController, ExpenseId, ExpenseUpdate, Gateway, GatewayOp, SubmitOutcome};
use outlay_db::{Store, validate_db_path};
use outlay_testkit::{ExpenseFaker, fixture_date, new_expense, temp_db_path};
use time::Month;

fn memory_store() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/outlay.db").is_ok());
}

#[test]
fn create_assigns_distinct_non_empty_ids() -> Result<()> {
    let store = memory_store()?;
    let date = fixture_date(2024, Month::January, 5)?;

    let first = store.create_expense(&new_expense(date, "Coffee", "4.50"))?;
    let second = store.create_expense(&new_expense(date, "Coffee", "4.50"))?;

    assert!(!first.is_empty());
    assert_ne!(first, second);
    assert_eq!(store.count_expenses()?, 2);
    Ok(())
}

#[test]
fn list_returns_records_in_insertion_order() -> Result<()> {
    let store = memory_store()?;
    let expenses = ExpenseFaker::new(11).expenses(6);
    for expense in &expenses {
        store.create_expense(expense)?;
    }

    let listed = store.list_expenses()?;
    let descriptions: Vec<_> = listed.iter().map(|r| r.description.clone()).collect();
    let expected: Vec<_> = expenses.iter().map(|e| e.description.clone()).collect();
    assert_eq!(descriptions, expected);
    assert_eq!(listed[3].date, expenses[3].date);
    assert_eq!(listed[3].amount, expenses[3].amount);
    Ok(())
}

#[test]
fn amount_text_is_stored_verbatim() -> Result<()> {
    let store = memory_store()?;
    let date = fixture_date(2024, Month::June, 1)?;
    store.create_expense(&new_expense(date, "Cash", " 12,00 "))?;

    let listed = store.list_expenses()?;
    assert_eq!(listed[0].amount, " 12,00 ");
    assert_eq!(listed[0].amount_value(), None);
    Ok(())
}

#[test]
fn partial_update_keeps_other_fields() -> Result<()> {
    let store = memory_store()?;
    let date = fixture_date(2024, Month::January, 5)?;
    let id = store.create_expense(&new_expense(date, "Coffee", "4.50"))?;

    store.update_expense(
        &id,
        &ExpenseUpdate {
            amount: Some("5.00".to_owned()),
            ..ExpenseUpdate::default()
        },
    )?;

    let record = &store.list_expenses()?[0];
    assert_eq!(record.amount, "5.00");
    assert_eq!(record.description, "Coffee");
    assert_eq!(record.date, date);
    Ok(())
}

#[test]
fn update_of_missing_id_fails() -> Result<()> {
    let mut store = memory_store()?;
    let error = store
        .update(&ExpenseId::new("nope"), &ExpenseUpdate::default())
        .expect_err("missing id should fail");
    assert_eq!(error.operation(), GatewayOp::Update);
    assert!(error.detail().contains("not found"));
    Ok(())
}

#[test]
fn remove_of_missing_id_succeeds() -> Result<()> {
    let mut store = memory_store()?;
    store.remove(&ExpenseId::new("nope"))?;
    store.remove(&ExpenseId::new("nope"))?;
    assert_eq!(store.count_expenses()?, 0);
    Ok(())
}

#[test]
fn bootstrap_is_idempotent_on_a_file() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        let date = fixture_date(2024, Month::March, 3)?;
        store.create_expense(&new_expense(date, "Books", "20"))?;
    }

    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.count_expenses()?, 1);
    Ok(())
}

#[test]
fn bootstrap_rejects_table_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.raw_connection().execute_batch(
        "
        CREATE TABLE expenses (
          id TEXT PRIMARY KEY,
          date TEXT NOT NULL,
          description TEXT NOT NULL
        );
        ",
    )?;

    let error = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = error.to_string();
    assert!(message.contains("table `expenses` is missing required columns"));
    assert!(message.contains("amount"));
    Ok(())
}

#[test]
fn controller_round_trips_through_sqlite() -> Result<()> {
    let mut controller = ExpenseController::new(memory_store()?);

    let outcome = controller.submit_new_expense("01/05/2024", "Coffee", "4.50")?;
    assert_eq!(outcome, SubmitOutcome::Created);
    assert_eq!(controller.expenses().len(), 1);

    let mut edited = controller.expenses()[0].clone();
    edited.description = "Espresso".to_owned();
    controller.commit_row_edit(&edited)?;
    assert_eq!(controller.expenses()[0].description, "Espresso");
    assert_eq!(controller.expenses()[0].id, edited.id);

    controller.delete_expense(&edited.id)?;
    assert!(controller.expenses().is_empty());
    Ok(())
}

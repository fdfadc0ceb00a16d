// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use outlay_app::{
    ControllerEvent, ExpenseController, ExpenseFormInput, ExpenseId, ExpenseIntent,
    ExpenseRecord, FieldValidity, FormField, GatewayOp, RowMode, SubmitOutcome,
};
use outlay_testkit::{GatewayCall, InMemoryGateway, fixture_date, new_expense};
use time::Month;

fn seeded_controller() -> Result<ExpenseController<InMemoryGateway>> {
    let date = fixture_date(2024, Month::January, 2)?;
    let gateway = InMemoryGateway::with_expenses([
        new_expense(date, "Groceries", "54.10"),
        new_expense(date, "Bus pass", "30"),
    ]);
    let mut controller = ExpenseController::new(gateway);
    controller.refresh()?;
    controller.gateway_mut().clear_calls();
    controller.take_events();
    Ok(controller)
}

#[test]
fn submit_creates_then_refreshes_from_empty() -> Result<()> {
    let mut controller = ExpenseController::new(InMemoryGateway::new());
    assert!(controller.expenses().is_empty());

    let outcome = controller.submit_new_expense("2024-01-05", "Coffee", "4.50")?;
    assert_eq!(outcome, SubmitOutcome::Created);

    let date = fixture_date(2024, Month::January, 5)?;
    assert_eq!(
        controller.gateway().calls(),
        &[
            GatewayCall::Create(new_expense(date, "Coffee", "4.50")),
            GatewayCall::ListAll,
        ]
    );
    assert_eq!(controller.expenses().len(), 1);
    assert_eq!(controller.expenses()[0].description, "Coffee");
    assert_eq!(controller.expenses()[0].amount, "4.50");
    assert!(!controller.expenses()[0].id.is_empty());
    assert!(!controller.is_busy());
    Ok(())
}

#[test]
fn submit_with_any_empty_field_never_reaches_the_store() -> Result<()> {
    let mut controller = seeded_controller()?;
    let before = controller.expenses().to_vec();

    for field in FormField::ALL {
        let mut input = ExpenseFormInput::new("2024-01-05", "Coffee", "4.50");
        input.value_mut(field).clear();

        let outcome = controller.submit_form(&input)?;
        let SubmitOutcome::Rejected(validity) = outcome else {
            panic!("submit with empty {field:?} should be rejected");
        };
        assert_eq!(validity.invalid_fields(), vec![field]);
        assert_eq!(controller.field_validity(), validity);
    }

    assert_eq!(controller.gateway().count_calls(GatewayOp::Create), 0);
    assert!(controller.gateway().calls().is_empty());
    assert_eq!(controller.expenses(), before.as_slice());
    Ok(())
}

#[test]
fn successful_submit_clears_field_markers() -> Result<()> {
    let mut controller = seeded_controller()?;
    controller.submit_new_expense("", "", "")?;
    assert!(!controller.field_validity().all_valid());

    controller.submit_new_expense("2024-01-05", "Coffee", "4.50")?;
    assert_eq!(controller.field_validity(), FieldValidity::default());
    Ok(())
}

#[test]
fn snapshot_matches_store_after_every_mutation() -> Result<()> {
    let mut controller = seeded_controller()?;

    controller.submit_new_expense("2024-01-05", "Coffee", "4.50")?;
    assert_eq!(controller.expenses(), controller.gateway().records());

    let mut edited = controller.expenses()[0].clone();
    edited.description = "Weekly groceries".to_owned();
    controller.commit_row_edit(&edited)?;
    assert_eq!(controller.expenses(), controller.gateway().records());

    let id = controller.expenses()[1].id.clone();
    controller.delete_expense(&id)?;
    assert_eq!(controller.expenses(), controller.gateway().records());
    Ok(())
}

#[test]
fn refresh_picks_up_changes_made_by_other_clients() -> Result<()> {
    let mut controller = seeded_controller()?;
    let date = fixture_date(2024, Month::February, 1)?;
    controller
        .gateway_mut()
        .insert_external(new_expense(date, "Cinema", "12"));

    assert_eq!(controller.expenses().len(), 2);
    controller.refresh()?;
    assert_eq!(controller.expenses().len(), 3);
    assert_eq!(controller.expenses()[2].description, "Cinema");
    Ok(())
}

#[test]
fn begin_then_cancel_returns_to_view_and_signals_discard() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();

    assert!(controller.begin_edit(&id));
    assert_eq!(controller.row_mode(&id), RowMode::Edit);

    assert!(controller.cancel_edit(&id));
    let mode = controller.row_mode(&id);
    assert!(!mode.is_editing());
    assert!(mode.discards_modifications());
    assert!(controller.gateway().calls().is_empty());
    Ok(())
}

#[test]
fn save_edit_only_changes_the_mode() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();

    controller.begin_edit(&id);
    assert!(controller.save_edit(&id));
    assert_eq!(
        controller.row_mode(&id),
        RowMode::View {
            ignore_modifications: false
        }
    );
    assert!(controller.gateway().calls().is_empty());
    Ok(())
}

#[test]
fn begin_edit_ignores_unknown_ids() -> Result<()> {
    let mut controller = seeded_controller()?;
    let ghost = ExpenseId::new("ghost");

    assert!(!controller.begin_edit(&ghost));
    assert_eq!(controller.row_mode(&ghost), RowMode::default());
    assert!(controller.take_events().is_empty());
    Ok(())
}

#[test]
fn commit_row_edit_updates_then_refreshes() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();
    let date = fixture_date(2024, Month::January, 9)?;
    let edited = ExpenseRecord {
        id: id.clone(),
        date,
        description: "Lunch".to_owned(),
        amount: "12.50".to_owned(),
    };

    controller.commit_row_edit(&edited)?;

    assert_eq!(
        controller.gateway().calls(),
        &[
            GatewayCall::Update(id.clone(), edited.to_update()),
            GatewayCall::ListAll,
        ]
    );
    let stored = controller.expense(&id).expect("edited record present");
    assert_eq!(stored, &edited);
    Ok(())
}

#[test]
fn failed_commit_keeps_previous_snapshot_and_skips_refresh() -> Result<()> {
    let mut controller = seeded_controller()?;
    let before = controller.expenses().to_vec();
    let id = before[0].id.clone();
    controller.begin_edit(&id);
    controller.save_edit(&id);

    let mut edited = before[0].clone();
    edited.amount = "99".to_owned();
    controller.gateway_mut().fail_on(GatewayOp::Update);

    let error = controller
        .commit_row_edit(&edited)
        .expect_err("update should fail");
    assert_eq!(error.operation(), GatewayOp::Update);
    assert_eq!(controller.gateway().count_calls(GatewayOp::ListAll), 0);
    assert_eq!(controller.expenses(), before.as_slice());
    assert!(!controller.row_mode(&id).is_editing());
    assert!(!controller.is_busy());
    assert!(
        controller
            .last_failure()
            .is_some_and(|message| message.contains("update failed"))
    );
    Ok(())
}

#[test]
fn commit_of_a_vanished_record_fails() -> Result<()> {
    let mut controller = seeded_controller()?;
    let record = controller.expenses()[0].clone();
    controller.gateway_mut().remove_external(&record.id);

    let error = controller
        .commit_row_edit(&record)
        .expect_err("update of missing id should fail");
    assert_eq!(error.operation(), GatewayOp::Update);
    Ok(())
}

#[test]
fn delete_twice_is_safe() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();

    controller.delete_expense(&id)?;
    assert!(controller.expense(&id).is_none());
    let after_first = controller.expenses().to_vec();

    controller.delete_expense(&id)?;
    assert_eq!(controller.expenses(), after_first.as_slice());
    assert_eq!(controller.gateway().count_calls(GatewayOp::Remove), 2);
    Ok(())
}

#[test]
fn refresh_prunes_row_modes_of_deleted_records() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();
    controller.begin_edit(&id);

    controller.delete_expense(&id)?;
    assert_eq!(controller.row_mode(&id), RowMode::default());
    assert!(!controller.save_edit(&id));
    Ok(())
}

#[test]
fn failed_refresh_leaves_state_intact_and_clears_busy() -> Result<()> {
    let mut controller = seeded_controller()?;
    let before = controller.expenses().to_vec();
    controller.gateway_mut().fail_on(GatewayOp::ListAll);

    assert!(controller.refresh().is_err());
    assert_eq!(controller.expenses(), before.as_slice());
    assert!(!controller.is_busy());

    controller.gateway_mut().recover();
    controller.refresh()?;
    assert!(controller.last_failure().is_none());
    Ok(())
}

#[test]
fn failed_create_propagates_without_refresh() -> Result<()> {
    let mut controller = seeded_controller()?;
    controller.gateway_mut().fail_on(GatewayOp::Create);

    let error = controller
        .submit_new_expense("2024-01-05", "Coffee", "4.50")
        .expect_err("create should fail");
    assert_eq!(error.operation(), GatewayOp::Create);
    assert_eq!(controller.gateway().count_calls(GatewayOp::ListAll), 0);
    assert_eq!(controller.expenses().len(), 2);
    Ok(())
}

#[test]
fn dispatch_reports_busy_around_store_calls() -> Result<()> {
    let mut controller = seeded_controller()?;

    let events = controller.dispatch(ExpenseIntent::Submit(ExpenseFormInput::new(
        "2024-01-05",
        "Coffee",
        "4.50",
    )));
    assert_eq!(
        events,
        vec![
            ControllerEvent::BusyChanged(true),
            ControllerEvent::ExpensesReplaced { count: 3 },
            ControllerEvent::BusyChanged(false),
        ]
    );
    Ok(())
}

#[test]
fn dispatch_turns_store_failures_into_events() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[0].id.clone();
    controller.gateway_mut().fail_on(GatewayOp::Remove);

    let events = controller.dispatch(ExpenseIntent::Delete(id));
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], ControllerEvent::BusyChanged(true));
    assert!(matches!(
        &events[1],
        ControllerEvent::Failed {
            operation: GatewayOp::Remove,
            message,
        } if message.contains("simulated outage")
    ));
    assert_eq!(events[2], ControllerEvent::BusyChanged(false));
    assert!(controller.last_failure().is_some());
    Ok(())
}

#[test]
fn every_failing_intent_leaves_a_visible_failure() -> Result<()> {
    let mut controller = seeded_controller()?;
    let first = controller.expenses()[0].clone();
    let cases = [
        (GatewayOp::ListAll, ExpenseIntent::Refresh),
        (
            GatewayOp::Create,
            ExpenseIntent::Submit(ExpenseFormInput::new("2024-01-05", "Coffee", "4.50")),
        ),
        (
            GatewayOp::Update,
            ExpenseIntent::CommitRowEdit(ExpenseRecord {
                description: "Market".to_owned(),
                ..first.clone()
            }),
        ),
        (GatewayOp::Remove, ExpenseIntent::Delete(first.id.clone())),
    ];

    for (operation, intent) in cases {
        controller.clear_failure();
        controller.gateway_mut().recover();
        controller.gateway_mut().fail_on(operation);

        let events = controller.dispatch(intent);
        assert!(
            events.iter().any(|event| matches!(
                event,
                ControllerEvent::Failed { operation: failed, .. } if *failed == operation
            )),
            "{operation} produced {events:?}"
        );
        assert_eq!(events.last(), Some(&ControllerEvent::BusyChanged(false)));
        assert!(controller.last_failure().is_some(), "{operation}");
        assert!(!controller.is_busy());
        assert_eq!(controller.expenses().len(), 2);
    }
    Ok(())
}

#[test]
fn dispatch_reports_rejected_fields_and_row_modes() -> Result<()> {
    let mut controller = seeded_controller()?;
    let id = controller.expenses()[1].id.clone();

    let rejected = controller.dispatch(ExpenseIntent::Submit(ExpenseFormInput::new(
        "2024-01-05",
        "",
        "4.50",
    )));
    assert_eq!(
        rejected,
        vec![ControllerEvent::FieldsRejected(FieldValidity {
            date: true,
            description: false,
            amount: true,
        })]
    );

    let begun = controller.dispatch(ExpenseIntent::BeginEdit(id.clone()));
    assert_eq!(
        begun,
        vec![ControllerEvent::RowModeChanged {
            id: id.clone(),
            mode: RowMode::Edit,
        }]
    );

    let cancelled = controller.dispatch(ExpenseIntent::CancelEdit(id.clone()));
    assert_eq!(
        cancelled,
        vec![ControllerEvent::RowModeChanged {
            id,
            mode: RowMode::View {
                ignore_modifications: true,
            },
        }]
    );
    Ok(())
}

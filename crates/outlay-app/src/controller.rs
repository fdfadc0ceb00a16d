// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::forms::{ExpenseFormInput, FieldValidity};
use crate::gateway::{Gateway, GatewayOp, StoreUnavailable};
use crate::ids::ExpenseId;
use crate::model::{ExpenseRecord, NewExpense, RowMode};

/// A user intent forwarded by the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseIntent {
    Refresh,
    Submit(ExpenseFormInput),
    BeginEdit(ExpenseId),
    SaveEdit(ExpenseId),
    CancelEdit(ExpenseId),
    CommitRowEdit(ExpenseRecord),
    Delete(ExpenseId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    BusyChanged(bool),
    ExpensesReplaced { count: usize },
    RowModeChanged { id: ExpenseId, mode: RowMode },
    FieldsRejected(FieldValidity),
    Failed { operation: GatewayOp, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Rejected(FieldValidity),
}

/// Owns the expense snapshot and the row modes, and turns every intent into
/// a store call followed by a full re-read.
///
/// Operations take `&mut self`, so two of them never overlap on the same
/// controller. The snapshot is only ever replaced wholesale by
/// [`ExpenseController::refresh`]; nothing patches it in place.
pub struct ExpenseController<G> {
    gateway: G,
    expenses: Vec<ExpenseRecord>,
    row_modes: HashMap<ExpenseId, RowMode>,
    busy_depth: usize,
    field_validity: FieldValidity,
    last_failure: Option<String>,
    events: Vec<ControllerEvent>,
}

impl<G: Gateway> ExpenseController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            expenses: Vec::new(),
            row_modes: HashMap::new(),
            busy_depth: 0,
            field_validity: FieldValidity::default(),
            last_failure: None,
            events: Vec::new(),
        }
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn expense(&self, id: &ExpenseId) -> Option<&ExpenseRecord> {
        self.expenses.iter().find(|expense| &expense.id == id)
    }

    /// Mode of the row with `id`; unknown ids read as plain view.
    pub fn row_mode(&self, id: &ExpenseId) -> RowMode {
        self.row_modes.get(id).copied().unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy_depth > 0
    }

    pub fn field_validity(&self) -> FieldValidity {
        self.field_validity
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn clear_failure(&mut self) {
        self.last_failure = None;
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Events produced since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Runs one intent. Store failures are already recorded as a
    /// [`ControllerEvent::Failed`] and in [`ExpenseController::last_failure`],
    /// so the result is not returned separately.
    pub fn dispatch(&mut self, intent: ExpenseIntent) -> Vec<ControllerEvent> {
        match intent {
            // Errors are dropped here on purpose: `fail` has already queued a
            // Failed event and set `last_failure` for each of them.
            ExpenseIntent::Refresh => {
                self.refresh().ok();
            }
            ExpenseIntent::Submit(input) => {
                self.submit_form(&input).ok();
            }
            ExpenseIntent::BeginEdit(id) => {
                self.begin_edit(&id);
            }
            ExpenseIntent::SaveEdit(id) => {
                self.save_edit(&id);
            }
            ExpenseIntent::CancelEdit(id) => {
                self.cancel_edit(&id);
            }
            ExpenseIntent::CommitRowEdit(record) => {
                self.commit_row_edit(&record).ok();
            }
            ExpenseIntent::Delete(id) => {
                self.delete_expense(&id).ok();
            }
        }
        self.take_events()
    }

    pub fn refresh(&mut self) -> Result<(), StoreUnavailable> {
        self.begin_busy();
        let result = self.reload();
        self.end_busy();
        result
    }

    pub fn submit_new_expense(
        &mut self,
        date: &str,
        description: &str,
        amount: &str,
    ) -> Result<SubmitOutcome, StoreUnavailable> {
        self.submit_form(&ExpenseFormInput::new(date, description, amount))
    }

    pub fn submit_form(
        &mut self,
        input: &ExpenseFormInput,
    ) -> Result<SubmitOutcome, StoreUnavailable> {
        let expense = match input.validate() {
            Ok(expense) => expense,
            Err(validity) => {
                debug!(invalid = ?validity.invalid_fields(), "expense form rejected");
                self.field_validity = validity;
                self.events.push(ControllerEvent::FieldsRejected(validity));
                return Ok(SubmitOutcome::Rejected(validity));
            }
        };
        self.field_validity = FieldValidity::default();

        self.begin_busy();
        let result = self.create_and_reload(&expense);
        self.end_busy();
        result.map(|()| SubmitOutcome::Created)
    }

    /// Puts a row into edit mode. Ids missing from the snapshot are ignored.
    pub fn begin_edit(&mut self, id: &ExpenseId) -> bool {
        self.set_row_mode(id, RowMode::Edit)
    }

    /// Returns the row to view mode. This does not write anything; the edited
    /// values reach the store through [`ExpenseController::commit_row_edit`].
    pub fn save_edit(&mut self, id: &ExpenseId) -> bool {
        self.set_row_mode(
            id,
            RowMode::View {
                ignore_modifications: false,
            },
        )
    }

    /// Returns the row to view mode and tells the surface to drop unsaved
    /// in-row changes.
    pub fn cancel_edit(&mut self, id: &ExpenseId) -> bool {
        self.set_row_mode(
            id,
            RowMode::View {
                ignore_modifications: true,
            },
        )
    }

    /// Writes an edited row back and re-reads the collection. When the write
    /// fails the refresh is skipped and the previous snapshot stays, even
    /// though it may no longer match the store.
    pub fn commit_row_edit(&mut self, updated: &ExpenseRecord) -> Result<(), StoreUnavailable> {
        self.begin_busy();
        let result = self.update_and_reload(updated);
        self.end_busy();
        result
    }

    pub fn delete_expense(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        self.begin_busy();
        let result = self.remove_and_reload(id);
        self.end_busy();
        result
    }

    fn create_and_reload(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable> {
        debug!(description = %expense.description, "creating expense");
        if let Err(error) = self.gateway.create(expense) {
            return Err(self.fail(error));
        }
        self.reload()
    }

    fn update_and_reload(&mut self, updated: &ExpenseRecord) -> Result<(), StoreUnavailable> {
        debug!(id = %updated.id, "committing row edit");
        if let Err(error) = self.gateway.update(&updated.id, &updated.to_update()) {
            return Err(self.fail(error));
        }
        self.reload()
    }

    fn remove_and_reload(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        debug!(%id, "deleting expense");
        if let Err(error) = self.gateway.remove(id) {
            return Err(self.fail(error));
        }
        self.reload()
    }

    fn reload(&mut self) -> Result<(), StoreUnavailable> {
        let records = match self.gateway.list_all() {
            Ok(records) => records,
            Err(error) => return Err(self.fail(error)),
        };
        self.replace_snapshot(records);
        Ok(())
    }

    fn replace_snapshot(&mut self, mut records: Vec<ExpenseRecord>) {
        let before = records.len();
        records.retain(|record| !record.id.is_empty());
        if records.len() != before {
            warn!(
                dropped = before - records.len(),
                "store returned expenses without an id"
            );
        }

        let live: HashSet<&ExpenseId> = records.iter().map(|record| &record.id).collect();
        self.row_modes.retain(|id, _| live.contains(id));

        debug!(count = records.len(), "expense snapshot replaced");
        self.expenses = records;
        self.last_failure = None;
        self.events.push(ControllerEvent::ExpensesReplaced {
            count: self.expenses.len(),
        });
    }

    fn set_row_mode(&mut self, id: &ExpenseId, mode: RowMode) -> bool {
        if self.expense(id).is_none() {
            debug!(%id, mode = mode.label(), "ignoring row mode change for unknown id");
            return false;
        }
        self.row_modes.insert(id.clone(), mode);
        self.events.push(ControllerEvent::RowModeChanged {
            id: id.clone(),
            mode,
        });
        true
    }

    fn fail(&mut self, error: StoreUnavailable) -> StoreUnavailable {
        let message = error.detail();
        warn!(operation = %error.operation(), "{message}");
        self.last_failure = Some(message.clone());
        self.events.push(ControllerEvent::Failed {
            operation: error.operation(),
            message,
        });
        error
    }

    fn begin_busy(&mut self) {
        self.busy_depth += 1;
        if self.busy_depth == 1 {
            self.events.push(ControllerEvent::BusyChanged(true));
        }
    }

    fn end_busy(&mut self) {
        self.busy_depth = self.busy_depth.saturating_sub(1);
        if self.busy_depth == 0 {
            self.events.push(ControllerEvent::BusyChanged(false));
        }
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod render;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use outlay_app::{
    ControllerEvent, ExpenseController, ExpenseFormInput, ExpenseId, ExpenseIntent, ExpenseRecord,
    FormField, Gateway, format_date, parse_date,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Form,
    Table,
}

/// Unsaved text of the row being edited inline.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowDraft {
    id: ExpenseId,
    input: ExpenseFormInput,
    field: FormField,
}

impl RowDraft {
    fn from_record(record: &ExpenseRecord) -> Self {
        Self {
            id: record.id.clone(),
            input: ExpenseFormInput::new(
                format_date(record.date),
                record.description.clone(),
                record.amount.clone(),
            ),
            field: FormField::Description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    focus: Focus,
    form: ExpenseFormInput,
    form_field: FormField,
    selected_row: usize,
    draft: Option<RowDraft>,
    busy: bool,
    status: Option<String>,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            focus: Focus::Form,
            form: ExpenseFormInput::default(),
            form_field: FormField::Date,
            selected_row: 0,
            draft: None,
            busy: false,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    Dispatch(Vec<ExpenseIntent>),
}

pub fn run_app<G: Gateway>(controller: &mut ExpenseController<G>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    apply_intents(controller, &mut view_data, vec![ExpenseIntent::Refresh]);

    let mut result = Ok(());
    loop {
        if let Err(error) =
            terminal.draw(|frame| render::render(frame, controller, &view_data))
        {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }

        let key = match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => key,
            Ok(_) => continue,
            Err(error) => {
                result = Err(error);
                break;
            }
        };

        match handle_key_event(controller, &mut view_data, key) {
            KeyAction::None => {}
            KeyAction::Quit => break,
            KeyAction::Dispatch(intents) => {
                if intents.iter().any(calls_store) {
                    // Draw once more so the busy marker shows while the store call blocks.
                    view_data.busy = true;
                    if let Err(error) =
                        terminal.draw(|frame| render::render(frame, controller, &view_data))
                    {
                        result = Err(error).context("draw frame");
                        break;
                    }
                }
                apply_intents(controller, &mut view_data, intents);
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn calls_store(intent: &ExpenseIntent) -> bool {
    matches!(
        intent,
        ExpenseIntent::Refresh
            | ExpenseIntent::Submit(_)
            | ExpenseIntent::CommitRowEdit(_)
            | ExpenseIntent::Delete(_)
    )
}

fn apply_intents<G: Gateway>(
    controller: &mut ExpenseController<G>,
    view_data: &mut ViewData,
    intents: Vec<ExpenseIntent>,
) {
    for intent in intents {
        for event in controller.dispatch(intent) {
            apply_event(controller, view_data, event);
        }
    }
}

fn apply_event<G: Gateway>(
    controller: &ExpenseController<G>,
    view_data: &mut ViewData,
    event: ControllerEvent,
) {
    debug!(?event, "controller event");
    match event {
        ControllerEvent::BusyChanged(busy) => view_data.busy = busy,
        ControllerEvent::ExpensesReplaced { count } => {
            view_data.selected_row = view_data.selected_row.min(count.saturating_sub(1));
        }
        ControllerEvent::RowModeChanged { id, mode } => {
            if mode.is_editing() {
                view_data.draft = controller.expense(&id).map(RowDraft::from_record);
                view_data.status = Some("editing row: enter saves, esc cancels".to_owned());
            } else {
                view_data.draft = None;
                if mode.discards_modifications() {
                    view_data.status = Some("edit discarded".to_owned());
                }
            }
        }
        ControllerEvent::FieldsRejected(validity) => {
            let labels = validity
                .invalid_fields()
                .into_iter()
                .map(FormField::label)
                .collect::<Vec<_>>();
            view_data.status = Some(format!("fill in {}", labels.join(", ")));
        }
        ControllerEvent::Failed { message, .. } => view_data.status = Some(message),
    }
}

fn handle_key_event<G: Gateway>(
    controller: &ExpenseController<G>,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    if view_data.draft.is_some() {
        return handle_draft_key(view_data, key);
    }

    match view_data.focus {
        Focus::Form => handle_form_key(view_data, key),
        Focus::Table => handle_table_key(controller, view_data, key),
    }
}

fn handle_form_key(view_data: &mut ViewData, key: KeyEvent) -> KeyAction {
    let field = view_data.form_field;
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.focus = Focus::Table;
            view_data.status = None;
        }
        (KeyCode::Tab | KeyCode::Down, _) => view_data.form_field = next_field(field, 1),
        (KeyCode::BackTab | KeyCode::Up, _) => view_data.form_field = next_field(field, -1),
        (KeyCode::Enter, _) => {
            view_data.status = None;
            return KeyAction::Dispatch(vec![ExpenseIntent::Submit(view_data.form.clone())]);
        }
        (KeyCode::Backspace, _) => {
            view_data.form.value_mut(field).pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.form.value_mut(field).clear();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.form.value_mut(field).push(ch);
        }
        _ => {}
    }
    KeyAction::None
}

fn handle_table_key<G: Gateway>(
    controller: &ExpenseController<G>,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> KeyAction {
    let selected = controller
        .expenses()
        .get(view_data.selected_row)
        .map(|record| record.id.clone());

    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('a') | KeyCode::Char('i') | KeyCode::Tab => {
            view_data.focus = Focus::Form;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let last = controller.expenses().len().saturating_sub(1);
            view_data.selected_row = (view_data.selected_row + 1).min(last);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        KeyCode::Char('g') => view_data.selected_row = 0,
        KeyCode::Char('G') => {
            view_data.selected_row = controller.expenses().len().saturating_sub(1);
        }
        KeyCode::Char('r') => return KeyAction::Dispatch(vec![ExpenseIntent::Refresh]),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(id) = selected {
                return KeyAction::Dispatch(vec![ExpenseIntent::BeginEdit(id)]);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected {
                return KeyAction::Dispatch(vec![ExpenseIntent::Delete(id)]);
            }
        }
        _ => {}
    }
    KeyAction::None
}

fn handle_draft_key(view_data: &mut ViewData, key: KeyEvent) -> KeyAction {
    let Some(draft) = view_data.draft.as_mut() else {
        return KeyAction::None;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            return KeyAction::Dispatch(vec![ExpenseIntent::CancelEdit(draft.id.clone())]);
        }
        (KeyCode::Enter, _) => {
            let Some(date) = parse_date(&draft.input.date) else {
                view_data.status = Some("date must be YYYY-MM-DD".to_owned());
                return KeyAction::None;
            };
            let record = ExpenseRecord {
                id: draft.id.clone(),
                date,
                description: draft.input.description.clone(),
                amount: draft.input.amount.clone(),
            };
            return KeyAction::Dispatch(vec![
                ExpenseIntent::SaveEdit(draft.id.clone()),
                ExpenseIntent::CommitRowEdit(record),
            ]);
        }
        (KeyCode::Tab, _) => draft.field = next_field(draft.field, 1),
        (KeyCode::BackTab, _) => draft.field = next_field(draft.field, -1),
        (KeyCode::Backspace, _) => {
            draft.input.value_mut(draft.field).pop();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            draft.input.value_mut(draft.field).push(ch);
        }
        _ => {}
    }
    KeyAction::None
}

fn next_field(field: FormField, delta: isize) -> FormField {
    let len = FormField::ALL.len() as isize;
    let index = FormField::ALL
        .iter()
        .position(|candidate| *candidate == field)
        .unwrap_or(0) as isize;
    FormField::ALL[(index + delta).rem_euclid(len) as usize]
}

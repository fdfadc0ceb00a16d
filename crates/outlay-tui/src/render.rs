// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use outlay_app::{ExpenseController, FormField, Gateway, RowMode, format_date};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use std::ops::Range;

use crate::{Focus, ViewData};

const BUSY_MARK: &str = "working...";

pub(crate) fn render<G: Gateway>(
    frame: &mut ratatui::Frame<'_>,
    controller: &ExpenseController<G>,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_form(frame, layout[0], controller, view_data);
    render_table(frame, layout[1], controller, view_data);

    let status = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn render_form<G: Gateway>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &ExpenseController<G>,
    view_data: &ViewData,
) {
    let focused = view_data.focus == Focus::Form && view_data.draft.is_none();
    let validity = controller.field_validity();

    let lines = FormField::ALL
        .into_iter()
        .map(|field| {
            let active = focused && field == view_data.form_field;
            let mut label_style = Style::default().fg(Color::White);
            if active {
                label_style = label_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            let mut spans = vec![
                Span::styled(format!("{:<12}", field.label()), label_style),
                Span::raw(view_data.form.value(field).to_owned()),
            ];
            if active {
                spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
            }
            if validity.is_invalid(field) {
                spans.push(Span::styled(
                    "  required",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect::<Vec<_>>();

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let form = Paragraph::new(lines).block(
        Block::default()
            .title("new expense")
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(form, area);
}

fn render_table<G: Gateway>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &ExpenseController<G>,
    view_data: &ViewData,
) {
    let header = Row::new(["Date", "Description", "Amount", ""].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let table_focused = view_data.focus == Focus::Table || view_data.draft.is_some();
    let total = controller.expenses().len();
    // Borders and the header row take three lines.
    let window = visible_rows(
        view_data.selected_row,
        total,
        usize::from(area.height.saturating_sub(3)),
    );
    let rows = controller
        .expenses()
        .iter()
        .enumerate()
        .take(window.end)
        .skip(window.start)
        .map(|(index, record)| {
            let draft = view_data
                .draft
                .as_ref()
                .filter(|draft| draft.id == record.id);

            let texts: [String; 3] = match draft {
                Some(draft) => FormField::ALL.map(|field| {
                    let value = draft.input.value(field);
                    if field == draft.field {
                        format!("{value}_")
                    } else {
                        value.to_owned()
                    }
                }),
                None => [
                    format_date(record.date),
                    record.description.clone(),
                    record.amount.clone(),
                ],
            };

            let mut style = Style::default();
            if table_focused && index == view_data.selected_row {
                style = style.bg(Color::DarkGray);
            }
            if draft.is_some() {
                style = Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
            }

            let mode = controller.row_mode(&record.id);
            let [date, description, amount] = texts;
            Row::new([
                Cell::from(date),
                Cell::from(description),
                Cell::from(amount),
                Cell::from(mode_marker(mode)),
            ])
            .style(style)
        });

    let widths = [
        Constraint::Length(12),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(6),
    ];
    let title = if window.len() < total {
        format!("expenses ({}-{} of {total})", window.start + 1, window.end)
    } else {
        format!("expenses ({total})")
    };
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Rows that fit in `height` lines, scrolled just far enough that `selected`
/// is the last visible row once it passes the first screenful.
pub(crate) fn visible_rows(selected: usize, total: usize, height: usize) -> Range<usize> {
    if total == 0 || height == 0 {
        return 0..0;
    }
    let selected = selected.min(total - 1);
    let start = (selected + 1).saturating_sub(height);
    start..(start + height).min(total)
}

fn mode_marker(mode: RowMode) -> &'static str {
    if mode.is_editing() { "edit" } else { "" }
}

pub(crate) fn status_text(view_data: &ViewData) -> String {
    let (mode, hints) = if view_data.draft.is_some() {
        ("EDIT", "tab field | enter save | esc cancel")
    } else if view_data.focus == Focus::Form {
        ("FORM", "tab field | enter add | ctrl+u clear | esc table")
    } else {
        ("TABLE", "j/k move | e edit | d delete | r refresh | a add | q quit")
    };

    let mut parts = vec![mode.to_owned()];
    if view_data.busy {
        parts.push(BUSY_MARK.to_owned());
    }
    if let Some(status) = &view_data.status {
        parts.push(status.clone());
    }
    parts.push(hints.to_owned());
    parts.join(" | ")
}

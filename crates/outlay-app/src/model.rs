// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::ids::ExpenseId;

pub const FIELD_DATE: &str = "date";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_AMOUNT: &str = "amount";

/// An expense as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub date: Date,
    pub description: String,
    pub amount: String,
}

impl ExpenseRecord {
    /// Numeric reading of the stored amount text, if it parses.
    pub fn amount_value(&self) -> Option<f64> {
        parse_amount(&self.amount)
    }

    /// Every field of this record as an update, which is how row edits are
    /// written back.
    pub fn to_update(&self) -> ExpenseUpdate {
        ExpenseUpdate {
            date: Some(self.date),
            description: Some(self.description.clone()),
            amount: Some(self.amount.clone()),
        }
    }
}

/// A record that has not been stored yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub date: Date,
    pub description: String,
    pub amount: String,
}

impl NewExpense {
    pub fn with_id(self, id: ExpenseId) -> ExpenseRecord {
        ExpenseRecord {
            id,
            date: self.date,
            description: self.description,
            amount: self.amount,
        }
    }
}

/// Field overwrite for an existing record. `None` leaves the stored value
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseUpdate {
    pub date: Option<Date>,
    pub description: Option<String>,
    pub amount: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.description.is_none() && self.amount.is_none()
    }

    /// Names of the fields this update touches, in a stable order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.date.is_some() {
            names.push(FIELD_DATE);
        }
        if self.description.is_some() {
            names.push(FIELD_DESCRIPTION);
        }
        if self.amount.is_some() {
            names.push(FIELD_AMOUNT);
        }
        names
    }

    pub fn apply_to(&self, record: &mut ExpenseRecord) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(amount) = &self.amount {
            record.amount = amount.clone();
        }
    }
}

/// Per-row presentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    View { ignore_modifications: bool },
    Edit,
}

impl Default for RowMode {
    fn default() -> Self {
        Self::View {
            ignore_modifications: false,
        }
    }
}

impl RowMode {
    pub const fn is_editing(self) -> bool {
        matches!(self, Self::Edit)
    }

    /// True when the surface must throw away in-row changes instead of
    /// committing them.
    pub const fn discards_modifications(self) -> bool {
        matches!(
            self,
            Self::View {
                ignore_modifications: true
            }
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::View { .. } => "view",
            Self::Edit => "edit",
        }
    }
}

pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

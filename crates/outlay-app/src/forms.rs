// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

use crate::model::NewExpense;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Date,
    Description,
    Amount,
}

impl FormField {
    /// Display order of the entry form.
    pub const ALL: [Self; 3] = [Self::Date, Self::Description, Self::Amount];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Description => "Description",
            Self::Amount => "Amount",
        }
    }
}

/// Per-field validity of the last submit. `true` means the field passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValidity {
    pub date: bool,
    pub description: bool,
    pub amount: bool,
}

impl Default for FieldValidity {
    fn default() -> Self {
        Self {
            date: true,
            description: true,
            amount: true,
        }
    }
}

impl FieldValidity {
    pub const fn all_valid(self) -> bool {
        self.date && self.description && self.amount
    }

    pub const fn is_invalid(self, field: FormField) -> bool {
        match field {
            FormField::Date => !self.date,
            FormField::Description => !self.description,
            FormField::Amount => !self.amount,
        }
    }

    pub fn invalid_fields(self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| self.is_invalid(*field))
            .collect()
    }
}

/// Raw text of the entry form, exactly as the surface captured it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFormInput {
    pub date: String,
    pub description: String,
    pub amount: String,
}

impl ExpenseFormInput {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Date => &self.date,
            FormField::Description => &self.description,
            FormField::Amount => &self.amount,
        }
    }

    pub fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Date => &mut self.date,
            FormField::Description => &mut self.description,
            FormField::Amount => &mut self.amount,
        }
    }

    /// Checks every field and builds the record to create.
    ///
    /// All three markers are computed even when an earlier field fails so the
    /// surface can highlight every offender at once.
    pub fn validate(&self) -> Result<NewExpense, FieldValidity> {
        let parsed_date = if validate_input(&self.date) {
            parse_date(&self.date)
        } else {
            None
        };
        let validity = FieldValidity {
            date: parsed_date.is_some(),
            description: validate_input(&self.description),
            amount: validate_input(&self.amount),
        };

        match parsed_date {
            Some(date) if validity.all_valid() => Ok(NewExpense {
                date,
                description: self.description.clone(),
                amount: self.amount.clone(),
            }),
            _ => Err(validity),
        }
    }
}

/// A required field passes iff its text is non-empty. No trimming: a
/// whitespace-only value counts as filled in.
pub fn validate_input(value: &str) -> bool {
    !value.is_empty()
}

/// Accepts `YYYY-MM-DD` and the date picker's `MM/DD/YYYY`.
pub fn parse_date(input: &str) -> Option<Date> {
    let trimmed = input.trim();
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(trimmed, &format_description!("[month]/[day]/[year]")))
        .ok()
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Document encoding for the Firestore REST v1 format.
//!
//! Every field value is an object with a single typed key, for example
//! `{"stringValue": "Coffee"}`.

use anyhow::{Context, Result, anyhow, bail};
use outlay_app::{
    ExpenseId, ExpenseRecord, ExpenseUpdate, FIELD_AMOUNT, FIELD_DATE, FIELD_DESCRIPTION,
    NewExpense,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, UtcOffset};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DocumentBody {
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

pub(crate) fn encode_new(expense: &NewExpense) -> Result<DocumentBody> {
    let mut fields = Map::new();
    fields.insert(FIELD_DATE.to_owned(), timestamp_value(expense.date)?);
    fields.insert(
        FIELD_DESCRIPTION.to_owned(),
        json!({ "stringValue": expense.description }),
    );
    fields.insert(
        FIELD_AMOUNT.to_owned(),
        json!({ "stringValue": expense.amount }),
    );
    Ok(DocumentBody { fields })
}

/// Only the fields present in `update`; pair with an update mask built from
/// [`ExpenseUpdate::field_names`].
pub(crate) fn encode_update(update: &ExpenseUpdate) -> Result<DocumentBody> {
    let mut fields = Map::new();
    if let Some(date) = update.date {
        fields.insert(FIELD_DATE.to_owned(), timestamp_value(date)?);
    }
    if let Some(description) = &update.description {
        fields.insert(
            FIELD_DESCRIPTION.to_owned(),
            json!({ "stringValue": description }),
        );
    }
    if let Some(amount) = &update.amount {
        fields.insert(FIELD_AMOUNT.to_owned(), json!({ "stringValue": amount }));
    }
    Ok(DocumentBody { fields })
}

pub(crate) fn decode_document(document: &Document) -> Result<ExpenseRecord> {
    let id = document_id(&document.name)?;
    let date = document
        .fields
        .get(FIELD_DATE)
        .ok_or_else(|| anyhow!("document {id} has no {FIELD_DATE} field"))
        .and_then(decode_date)
        .with_context(|| format!("decode {FIELD_DATE} of document {id}"))?;
    let description = document
        .fields
        .get(FIELD_DESCRIPTION)
        .and_then(|value| value.get("stringValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("document {id} has no text {FIELD_DESCRIPTION}"))?
        .to_owned();
    let amount = document
        .fields
        .get(FIELD_AMOUNT)
        .ok_or_else(|| anyhow!("document {id} has no {FIELD_AMOUNT} field"))
        .and_then(decode_amount)
        .with_context(|| format!("decode {FIELD_AMOUNT} of document {id}"))?;

    Ok(ExpenseRecord {
        id,
        date,
        description,
        amount,
    })
}

/// The id is the last segment of the resource name
/// `projects/p/databases/(default)/documents/expenses/<id>`.
pub(crate) fn document_id(name: &str) -> Result<ExpenseId> {
    match name.rsplit('/').next() {
        Some(id) if !id.is_empty() => Ok(ExpenseId::new(id)),
        _ => bail!("document name {name:?} has no id segment"),
    }
}

fn timestamp_value(date: Date) -> Result<Value> {
    let stamp = date
        .midnight()
        .assume_utc()
        .format(&Rfc3339)
        .context("format date as timestamp")?;
    Ok(json!({ "timestampValue": stamp }))
}

/// Timestamps round to the nearest UTC calendar date. Clients that store
/// local midnight land within twelve hours of UTC midnight, so a value such
/// as `2024-01-04T22:00:00Z` from UTC+2 reads back as 2024-01-05. Offsets
/// beyond twelve hours (UTC+13, UTC+14) still read as the previous day.
fn decode_date(value: &Value) -> Result<Date> {
    if let Some(raw) = value.get("timestampValue").and_then(Value::as_str) {
        let stamp = OffsetDateTime::parse(raw, &Rfc3339)
            .with_context(|| format!("parse timestamp {raw:?}"))?
            .to_offset(UtcOffset::UTC);
        if stamp.time() <= time!(12:00) {
            return Ok(stamp.date());
        }
        return stamp
            .date()
            .next_day()
            .with_context(|| format!("timestamp {raw:?} is past the last supported date"));
    }
    if let Some(raw) = value.get("stringValue").and_then(Value::as_str) {
        return Date::parse(raw, &format_description!("[year]-[month]-[day]"))
            .with_context(|| format!("parse date {raw:?}"));
    }
    bail!("unsupported date value {value}")
}

/// Amounts written by other clients may be numbers rather than text.
fn decode_amount(value: &Value) -> Result<String> {
    if let Some(text) = value.get("stringValue").and_then(Value::as_str) {
        return Ok(text.to_owned());
    }
    if let Some(number) = value.get("doubleValue").and_then(Value::as_f64) {
        return Ok(number.to_string());
    }
    match value.get("integerValue") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => bail!("unsupported amount value {value}"),
    }
}

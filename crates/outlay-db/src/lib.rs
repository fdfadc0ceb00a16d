// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use outlay_app::{
    ExpenseId, ExpenseRecord, ExpenseUpdate, Gateway, GatewayOp, NewExpense, StoreResultExt,
    StoreUnavailable, format_date,
};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

pub const APP_NAME: &str = "outlay";

const EXPENSES_TABLE: &str = "expenses";
const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "date",
    "description",
    "amount",
    "created_at",
    "updated_at",
];

/// Expenses kept in a local SQLite file.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        validate_db_path(&path.to_string_lossy())?;
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite file {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open sqlite in memory")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the expenses table, or checks that an existing one has every
    /// column this store reads and writes.
    pub fn bootstrap(&self) -> Result<()> {
        let present = column_names(&self.conn, EXPENSES_TABLE)?;
        if !present.is_empty() {
            return validate_schema(&present);
        }
        self.conn
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create schema")
    }

    /// Every expense in insertion order.
    pub fn list_expenses(&self) -> Result<Vec<ExpenseRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, date, description, amount
                FROM expenses
                ORDER BY rowid ASC
                ",
            )
            .context("prepare expenses query")?;
        let rows = stmt
            .query_map([], |row| {
                let date_raw: String = row.get(1)?;
                Ok(ExpenseRecord {
                    id: ExpenseId::new(row.get::<_, String>(0)?),
                    date: parse_stored_date(&date_raw).map_err(|error| conversion_error(1, error))?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                })
            })
            .context("query expenses")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect expenses")
    }

    pub fn create_expense(&self, expense: &NewExpense) -> Result<ExpenseId> {
        let id = ExpenseId::new(Uuid::new_v4().to_string());
        let now = timestamp_now()?;
        self.conn
            .execute(
                "
                INSERT INTO expenses (
                  id, date, description, amount, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    id.as_str(),
                    format_date(expense.date),
                    expense.description,
                    expense.amount,
                    now,
                    now,
                ],
            )
            .context("insert expense")?;
        debug!(%id, "inserted expense");
        Ok(id)
    }

    /// Overwrites the fields present in `update`. Fails when no row has `id`.
    pub fn update_expense(&self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<()> {
        let now = timestamp_now()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE expenses
                SET
                  date = COALESCE(?, date),
                  description = COALESCE(?, description),
                  amount = COALESCE(?, amount),
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.date.map(format_date),
                    update.description,
                    update.amount,
                    now,
                    id.as_str(),
                ],
            )
            .context("update expense")?;
        if rows_affected == 0 {
            bail!("expense {id} not found -- refresh the list and retry");
        }
        Ok(())
    }

    /// Deleting an id that is not stored is not an error.
    pub fn delete_expense(&self, id: &ExpenseId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?", params![id.as_str()])
            .context("delete expense")?;
        if rows_affected == 0 {
            debug!(%id, "delete matched no expense");
        }
        Ok(())
    }

    pub fn count_expenses(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .context("count expenses")?;
        usize::try_from(count).context("expense count out of range")
    }
}

impl Gateway for Store {
    fn list_all(&mut self) -> Result<Vec<ExpenseRecord>, StoreUnavailable> {
        self.list_expenses().during(GatewayOp::ListAll)
    }

    fn create(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable> {
        self.create_expense(expense)
            .map(|_| ())
            .during(GatewayOp::Create)
    }

    fn update(&mut self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<(), StoreUnavailable> {
        self.update_expense(id, update).during(GatewayOp::Update)
    }

    fn remove(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        self.delete_expense(id).during(GatewayOp::Remove)
    }
}

/// `OUTLAY_DB_PATH` when set, otherwise `outlay.db` under the platform data
/// directory (created on demand).
pub fn default_db_path() -> Result<PathBuf> {
    if let Some(explicit) = env::var_os("OUTLAY_DB_PATH") {
        return Ok(explicit.into());
    }

    let Some(data_dir) = dirs::data_local_dir() else {
        bail!("no platform data directory; export OUTLAY_DB_PATH=/path/to/outlay.db");
    };
    let dir = data_dir.join(APP_NAME);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join(format!("{APP_NAME}.db")))
}

/// Rejects values SQLite would treat as URIs or that carry query strings.
/// `:memory:` is accepted.
pub fn validate_db_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("database path is empty; set [storage].db_path or OUTLAY_DB_PATH");
    }
    if path == ":memory:" {
        return Ok(());
    }

    let uri_scheme = path
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()));
    if let Some(scheme) = uri_scheme {
        bail!("database path {path:?} looks like a URI ({scheme}://); give a local file path");
    }
    if path.starts_with("file:") || path.contains('?') {
        bail!("database path {path:?} has URI syntax; drop the `file:` prefix and any `?` options");
    }
    Ok(())
}

fn validate_schema(present: &BTreeSet<String>) -> Result<()> {
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !present.contains(**column))
        .copied()
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(());
    }
    bail!(
        "table `{EXPENSES_TABLE}` is missing required columns: {}; point storage.db_path at an outlay database",
        missing.join(", ")
    )
}

/// Column names of `table`; empty when the table does not exist.
fn column_names(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .context("prepare column lookup")?;
    let names = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<rusqlite::Result<BTreeSet<_>>>())
        .with_context(|| format!("read columns of {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        .context("enable write-ahead log")?;
    conn.busy_timeout(Duration::from_secs(5))
        .context("set busy timeout")
}

fn timestamp_now() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("render current time as RFC 3339")
}

fn parse_stored_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .or_else(|_| {
            // Rows written by hand sometimes carry a full timestamp.
            OffsetDateTime::parse(raw, &Rfc3339).map(OffsetDateTime::date)
        })
        .map_err(|_| anyhow!("stored date {raw:?} is neither YYYY-MM-DD nor RFC 3339"))
}

fn conversion_error(column: usize, error: anyhow::Error) -> rusqlite::Error {
    let source: Box<dyn std::error::Error + Send + Sync> = error.into();
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, source)
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use outlay_app::{
    ExpenseId, ExpenseRecord, ExpenseUpdate, Gateway, GatewayOp, NewExpense, StoreUnavailable,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use time::{Date, Duration, Month};

const REFERENCE_YEAR: i32 = 2024;

const DESCRIPTIONS: [&str; 20] = [
    "Coffee",
    "Lunch",
    "Groceries",
    "Bus pass",
    "Train ticket",
    "Cinema",
    "Pharmacy",
    "Books",
    "Phone bill",
    "Electricity",
    "Water bill",
    "Internet",
    "Gym membership",
    "Taxi",
    "Dinner out",
    "Hardware store",
    "Haircut",
    "Parking",
    "Gift",
    "Streaming subscription",
];

/// One call received by [`InMemoryGateway`], with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListAll,
    Create(NewExpense),
    Update(ExpenseId, ExpenseUpdate),
    Remove(ExpenseId),
}

impl GatewayCall {
    pub fn operation(&self) -> GatewayOp {
        match self {
            Self::ListAll => GatewayOp::ListAll,
            Self::Create(_) => GatewayOp::Create,
            Self::Update(_, _) => GatewayOp::Update,
            Self::Remove(_) => GatewayOp::Remove,
        }
    }
}

/// A store held in memory that records every call it receives.
///
/// Ids are handed out as `doc-1`, `doc-2`, ... in creation order. Operations
/// named in [`InMemoryGateway::fail_on`] fail with [`StoreUnavailable`]
/// until [`InMemoryGateway::recover`] is called.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    records: Vec<ExpenseRecord>,
    calls: Vec<GatewayCall>,
    failing: BTreeSet<GatewayOp>,
    next_id: u64,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expenses(expenses: impl IntoIterator<Item = NewExpense>) -> Self {
        let mut gateway = Self::default();
        for expense in expenses {
            gateway.insert_external(expense);
        }
        gateway
    }

    /// Stores a record without recording a call, as if another client wrote
    /// it.
    pub fn insert_external(&mut self, expense: NewExpense) -> ExpenseId {
        let id = self.allocate_id();
        self.records.push(expense.with_id(id.clone()));
        id
    }

    /// Removes a record without recording a call.
    pub fn remove_external(&mut self, id: &ExpenseId) {
        self.records.retain(|record| &record.id != id);
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn calls(&self) -> &[GatewayCall] {
        &self.calls
    }

    pub fn count_calls(&self, operation: GatewayOp) -> usize {
        self.calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn fail_on(&mut self, operation: GatewayOp) {
        self.failing.insert(operation);
    }

    pub fn recover(&mut self) {
        self.failing.clear();
    }

    fn allocate_id(&mut self) -> ExpenseId {
        self.next_id += 1;
        ExpenseId::new(format!("doc-{}", self.next_id))
    }

    fn check(&self, operation: GatewayOp) -> Result<(), StoreUnavailable> {
        if self.failing.contains(&operation) {
            return Err(StoreUnavailable::new(
                operation,
                "simulated outage -- call recover() to restore the store",
            ));
        }
        Ok(())
    }
}

impl Gateway for InMemoryGateway {
    fn list_all(&mut self) -> Result<Vec<ExpenseRecord>, StoreUnavailable> {
        self.calls.push(GatewayCall::ListAll);
        self.check(GatewayOp::ListAll)?;
        Ok(self.records.clone())
    }

    fn create(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable> {
        self.calls.push(GatewayCall::Create(expense.clone()));
        self.check(GatewayOp::Create)?;
        let id = self.allocate_id();
        self.records.push(expense.clone().with_id(id));
        Ok(())
    }

    fn update(&mut self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<(), StoreUnavailable> {
        self.calls.push(GatewayCall::Update(id.clone(), update.clone()));
        self.check(GatewayOp::Update)?;
        let record = self
            .records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| {
                StoreUnavailable::new(GatewayOp::Update, format!("no expense with id {id}"))
            })?;
        update.apply_to(record);
        Ok(())
    }

    fn remove(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        self.calls.push(GatewayCall::Remove(id.clone()));
        self.check(GatewayOp::Remove)?;
        self.records.retain(|record| &record.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible expenses for demos and tests.
#[derive(Debug, Clone)]
pub struct ExpenseFaker {
    rng: DeterministicRng,
}

impl ExpenseFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn expense(&mut self) -> NewExpense {
        let description = DESCRIPTIONS[self.rng.int_n(DESCRIPTIONS.len())].to_owned();
        let dollars = 1 + self.rng.int_n(250);
        let cents = self.rng.int_n(100);
        NewExpense {
            date: self.date_in_year(REFERENCE_YEAR),
            description,
            amount: format!("{dollars}.{cents:02}"),
        }
    }

    pub fn expenses(&mut self, count: usize) -> Vec<NewExpense> {
        (0..count).map(|_| self.expense()).collect()
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).unwrap_or(Date::MIN);
        let offset = self.rng.int_n(365) as i64;
        start.saturating_add(Duration::days(offset))
    }
}

pub fn descriptions() -> &'static [&'static str] {
    &DESCRIPTIONS
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("outlay.db");
    Ok((dir, db_path))
}

pub fn fixture_date(year: i32, month: Month, day: u8) -> Result<Date> {
    Date::from_calendar_date(year, month, day)
        .map_err(|error| anyhow!("invalid fixture date {year}-{month}-{day}: {error}"))
}

pub fn new_expense(date: Date, description: &str, amount: &str) -> NewExpense {
    NewExpense {
        date,
        description: description.to_owned(),
        amount: amount.to_owned(),
    }
}
